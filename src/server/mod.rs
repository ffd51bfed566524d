//! HTTP surface of the service.
//!
//! Routing, shared state, and the single place where pipeline errors map
//! to HTTP statuses. The error body shape is `{"detail": "..."}`.

pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::engine::EngineHandle;
use crate::voices::VoiceStore;
use crate::Error;

/// Voice uploads are capped; the original service had no bound.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineHandle>,
    pub voices: Arc<VoiceStore>,
}

impl AppState {
    pub fn new(engine: EngineHandle, voices: VoiceStore) -> Self {
        Self {
            engine: Arc::new(engine),
            voices: Arc::new(voices),
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/upload-voice", post(handlers::upload_voice))
        .route("/generate", post(handlers::generate))
        .route("/voices", get(handlers::list_voices))
        .route("/voices/{voice_name}", delete(handlers::delete_voice))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::VoiceNotFound(_) => StatusCode::NOT_FOUND,
            Error::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
