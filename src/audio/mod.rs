//! Audio ingestion pipeline.
//!
//! Uploaded voice samples pass through three stages before storage:
//!
//! 1. [`decode`] — parse the uploaded container (WAV, MP3, OGG, FLAC, ...)
//!    into raw interleaved samples
//! 2. [`resample`] — band-limited conversion to the canonical sample rate
//! 3. [`normalize`] — channel downmix, resampling, and peak scaling into
//!    the canonical mono format

pub mod decode;
pub mod normalize;
pub mod resample;
