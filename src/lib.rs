//! # voxclone
//!
//! A voice-cloning text-to-speech service library.
//!
//! Callers upload a short reference voice sample, the service converts it
//! into a canonical format (mono, 24 kHz, peak-normalized) and stores it on
//! disk. Later requests synthesize arbitrary text "in that voice" through a
//! process-wide synthesis engine with GPU-then-CPU load fallback.
//!
//! ## Features
//!
//! - **Canonical ingestion**: any channel count / sample rate / amplitude in,
//!   mono 24 kHz peak-0.85 out
//! - **Voice catalog**: filesystem-backed, name-sanitized voice assets
//! - **Backend fallback**: preferred accelerator load, degraded CPU load,
//!   terminal failure surfaced as `ServiceUnavailable`
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! voxclone = { version = "0.1", features = ["chatterbox"] }
//! ```
//!
//! ```ignore
//! use voxclone::{audio, voices::VoiceStore, CANONICAL_SAMPLE_RATE};
//!
//! let store = VoiceStore::new("./voices")?;
//! let raw = audio::decode::decode_bytes(&upload_bytes)?;
//! let canonical = audio::normalize::normalize(&raw, CANONICAL_SAMPLE_RATE)?;
//! let stored = store.create("narrator", &canonical)?;
//! println!("stored {} ({:.2}s)", stored.name, stored.duration_seconds);
//! # Ok::<(), voxclone::Error>(())
//! ```

pub mod audio;
pub mod engine;
pub mod error;
pub mod server;
pub mod voices;

pub use error::Error;

use std::io::Cursor;
use std::path::Path;

/// Sample rate every stored voice asset is converted to (Hz).
pub const CANONICAL_SAMPLE_RATE: u32 = 24_000;

/// Peak amplitude target after normalization; leaves headroom so
/// downstream encoding never clips.
pub const PEAK_TARGET: f32 = 0.85;

/// Digitized audio: interleaved f32 samples tagged with sample rate and
/// channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Interleaved audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono)
    pub channels: u16,
}

impl Waveform {
    /// Create a mono waveform from raw samples.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), Error> {
        let mut writer = hound::WavWriter::create(path, self.wav_spec())?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Encode the audio as a 32-bit float WAV into an in-memory buffer.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.wav_spec())?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Read a WAV file. Accepts both float and 16-bit integer PCM;
    /// integer samples are scaled to the [-1, 1] float range.
    pub fn read_wav(path: &Path) -> Result<Self, Error> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<Result<_, _>>()?,
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_counts_frames_not_samples() {
        let w = Waveform {
            samples: vec![0.0; 48_000],
            sample_rate: 24_000,
            channels: 2,
        };
        assert!((w.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wav_roundtrip_preserves_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = Waveform::mono(vec![0.0, 0.25, -0.5, 0.85], 24_000);
        original.write_wav(&path).unwrap();

        let loaded = Waveform::read_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate, 24_000);
        assert_eq!(loaded.channels, 1);
        assert_eq!(loaded.samples, original.samples);
    }
}
