//! Band-limited mono resampling.
//!
//! Backed by rubato's chunked FFT resampler. Compiled out when the
//! `resample` feature is disabled, in which case a rate conversion request
//! fails loudly with [`Error::CapabilityUnavailable`] — callers must never
//! receive audio at a rate other than the one they asked for.

use crate::Error;

#[cfg(feature = "resample")]
use rubato::{FftFixedIn, Resampler};

/// Frames fed to the FFT resampler per process call.
#[cfg(feature = "resample")]
const CHUNK: usize = 1024;

#[cfg(feature = "resample")]
const SUB_CHUNKS: usize = 2;

/// Resample a mono signal from `sr_in` to `sr_out`.
///
/// The output length is exactly `round(len * sr_out / sr_in)`: the
/// resampler's inherent delay is trimmed from the front and the tail is
/// flushed with silence, so a 1 s input yields a 1 s output.
#[cfg(feature = "resample")]
pub fn resample_mono(input: &[f32], sr_in: u32, sr_out: u32) -> Result<Vec<f32>, Error> {
    if sr_in == sr_out {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler = FftFixedIn::<f32>::new(sr_in as usize, sr_out as usize, CHUNK, SUB_CHUNKS, 1)
        .map_err(|e| Error::CapabilityUnavailable(format!("resampler init failed: {e}")))?;

    let delay = resampler.output_delay();
    let expected_len = (input.len() as f64 * sr_out as f64 / sr_in as f64).round() as usize;

    let mut out = Vec::with_capacity(delay + expected_len + CHUNK);
    let mut chunk = vec![0.0f32; CHUNK];

    let mut pos = 0;
    while pos < input.len() {
        let end = (pos + CHUNK).min(input.len());
        let len = end - pos;
        chunk[..len].copy_from_slice(&input[pos..end]);
        chunk[len..].fill(0.0);

        let frames = resampler
            .process(&[&chunk], None)
            .map_err(|e| Error::Internal(format!("resampling failed: {e}")))?;
        out.extend_from_slice(&frames[0]);
        pos = end;
    }

    // Flush with silence until the delayed tail of the signal has emerged.
    chunk.fill(0.0);
    while out.len() < delay + expected_len {
        let frames = resampler
            .process(&[&chunk], None)
            .map_err(|e| Error::Internal(format!("resampling failed: {e}")))?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected_len);
    Ok(out)
}

#[cfg(not(feature = "resample"))]
pub fn resample_mono(input: &[f32], sr_in: u32, sr_out: u32) -> Result<Vec<f32>, Error> {
    if sr_in == sr_out || input.is_empty() {
        return Ok(input.to_vec());
    }
    Err(Error::CapabilityUnavailable(format!(
        "cannot convert {sr_in} Hz to {sr_out} Hz without the `resample` feature"
    )))
}

#[cfg(all(test, feature = "resample"))]
mod tests {
    use super::*;

    #[test]
    fn halving_the_rate_halves_the_sample_count() {
        let input: Vec<f32> = (0..48_000)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin())
            .collect();
        let out = resample_mono(&input, 48_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
    }

    #[test]
    fn upsampling_produces_rounded_length() {
        let input = vec![0.1f32; 16_000];
        let out = resample_mono(&input, 16_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
    }

    #[test]
    fn matching_rates_are_a_no_op() {
        let input = vec![0.3f32, -0.3];
        let out = resample_mono(&input, 24_000, 24_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = resample_mono(&[], 48_000, 24_000).unwrap();
        assert!(out.is_empty());
    }
}
