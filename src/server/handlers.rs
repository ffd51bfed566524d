//! Request orchestration.
//!
//! Handlers are thin: they parse the HTTP shape, then hand the work to
//! plain functions (`ingest_voice`, `run_generate`) that are testable
//! without a running server. Decode, normalization, and synthesis are
//! CPU-heavy and run on the blocking pool so they never stall unrelated
//! request dispatch.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::audio::{decode, normalize};
use crate::engine::{EngineHandle, SynthesisOptions};
use crate::voices::{VoiceInfo, VoiceStore};
use crate::{Error, Waveform, CANONICAL_SAMPLE_RATE};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub backend: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub voice_name: String,
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub text: String,
    #[serde(default)]
    pub voice_name: Option<String>,
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,
    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f32,
}

fn default_exaggeration() -> f32 {
    0.2
}

fn default_cfg_weight() -> f32 {
    0.8
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /` — service and model-load status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        model_loaded: state.engine.is_ready(),
        backend: state.engine.backend().map(|b| b.as_str()),
    })
}

/// `POST /upload-voice` — multipart upload of a reference voice sample.
pub async fn upload_voice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, Error> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut voice_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read upload: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            "voice_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read voice_name: {e}")))?;
                voice_name = Some(text);
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| Error::Validation("A 'file' field is required".into()))?;
    let name =
        voice_name.ok_or_else(|| Error::Validation("A 'voice_name' field is required".into()))?;

    let voices = state.voices.clone();
    let response = tokio::task::spawn_blocking(move || ingest_voice(&voices, &name, &bytes))
        .await
        .map_err(|e| Error::Internal(format!("upload task failed: {e}")))??;

    Ok(Json(response))
}

/// `POST /generate` — synthesize text, optionally cloning a stored voice.
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, Error> {
    let engine = state.engine.clone();
    let voices = state.voices.clone();

    let wav_bytes = tokio::task::spawn_blocking(move || run_generate(&engine, &voices, &form))
        .await
        .map_err(|e| Error::Internal(format!("generation task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"generated_audio.wav\"",
            ),
        ],
        wav_bytes,
    )
        .into_response())
}

/// `GET /voices` — catalog listing.
pub async fn list_voices(State(state): State<AppState>) -> Result<Json<VoicesResponse>, Error> {
    let mut voices = state.voices.list()?;
    for v in &mut voices {
        v.duration_seconds = round2(v.duration_seconds);
    }
    Ok(Json(VoicesResponse { voices }))
}

/// `DELETE /voices/{voice_name}`
pub async fn delete_voice(
    State(state): State<AppState>,
    Path(voice_name): Path<String>,
) -> Result<Json<DeleteResponse>, Error> {
    state.voices.delete(&voice_name)?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Voice '{voice_name}' deleted"),
    }))
}

/// Upload pipeline: decode -> normalize -> store.
pub fn ingest_voice(
    store: &VoiceStore,
    name: &str,
    bytes: &[u8],
) -> Result<UploadResponse, Error> {
    let raw = decode::decode_bytes(bytes)?;
    let canonical = normalize::normalize(&raw, CANONICAL_SAMPLE_RATE)?;
    let stored = store.create(name, &canonical)?;

    Ok(UploadResponse {
        success: true,
        voice_name: stored.name,
        path: stored.path.display().to_string(),
        duration_seconds: round2(stored.duration_seconds),
        sample_rate: CANONICAL_SAMPLE_RATE,
    })
}

/// Generate pipeline: validate -> resolve voice -> synthesize -> encode.
///
/// The encoded output lives in a per-request temporary file that is
/// removed on every exit path (the guard's drop), never accumulated.
pub fn run_generate(
    engine: &EngineHandle,
    store: &VoiceStore,
    form: &GenerateForm,
) -> Result<Vec<u8>, Error> {
    let text = form.text.trim();
    if text.is_empty() {
        return Err(Error::Validation("Text is required".into()));
    }

    let reference: Option<Waveform> = match form.voice_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(store.resolve(name)?),
        _ => None,
    };

    let options = SynthesisOptions {
        exaggeration: form.exaggeration.clamp(0.0, 1.0),
        cfg_weight: form.cfg_weight.clamp(0.0, 1.0),
    };

    let wave = engine.synthesize(text, reference.as_ref(), &options)?;

    let tmp = tempfile::Builder::new()
        .prefix("voxclone-")
        .suffix(".wav")
        .tempfile()?;
    wave.write_wav(tmp.path())?;
    let bytes = std::fs::read(tmp.path())?;
    Ok(bytes)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
