//! Service-wide error taxonomy.
//!
//! One enum covers the whole pipeline so handlers can map every failure to
//! an HTTP status in a single place (see [`crate::server`]).

/// Errors produced by the ingestion and synthesis pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Missing or invalid caller input; user-fixable.
    #[error("{0}")]
    Validation(String),

    /// No stored voice asset with the requested name.
    #[error("Voice '{0}' not found")]
    VoiceNotFound(String),

    /// Uploaded bytes could not be parsed as audio.
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// A required signal-processing capability is not compiled in.
    /// Surfaced instead of silently returning mis-rated audio.
    #[error("Audio resampling capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The synthesis engine is not in the `Ready` state.
    #[error("TTS model not loaded")]
    EngineUnavailable,

    /// The model capability failed while synthesizing.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "chatterbox")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Unexpected failure in normalization, storage, or encoding.
    #[error("Internal error: {0}")]
    Internal(String),
}
