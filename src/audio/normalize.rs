//! Canonical-format conversion for uploaded voice samples.
//!
//! Pure and deterministic: any channel count, sample rate, and amplitude
//! range in; mono audio at the target rate with a 0.85 peak out.

use crate::audio::resample::resample_mono;
use crate::{Error, Waveform, PEAK_TARGET};

/// Convert a waveform into the canonical voice format.
///
/// 1. Multi-channel input is downmixed to mono by averaging channels at
///    each frame.
/// 2. Rate mismatches are resampled to `target_rate`; without resampling
///    capability this fails with [`Error::CapabilityUnavailable`].
/// 3. Non-silent audio is scaled so its peak is exactly [`PEAK_TARGET`];
///    all-zero audio passes through unscaled.
///
/// A zero-length input produces a zero-length output, not an error.
pub fn normalize(input: &Waveform, target_rate: u32) -> Result<Waveform, Error> {
    let mono = downmix(input);
    let mut samples = resample_mono(&mono, input.sample_rate, target_rate)?;
    scale_to_peak(&mut samples);
    Ok(Waveform::mono(samples, target_rate))
}

/// Average interleaved channels into a mono signal.
fn downmix(input: &Waveform) -> Vec<f32> {
    let channels = input.channels.max(1) as usize;
    if channels == 1 {
        return input.samples.clone();
    }

    input
        .samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn scale_to_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        let gain = PEAK_TARGET / peak;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_downmix_preserves_frame_count() {
        // Rate-preserving case: frame count in == sample count out.
        let input = Waveform {
            samples: vec![1.0, 0.0, 0.0, 1.0, -1.0, -1.0],
            sample_rate: 24_000,
            channels: 2,
        };
        let out = normalize(&input, 24_000).unwrap();
        assert_eq!(out.channels, 1);
        assert_eq!(out.samples.len(), 3);
    }

    #[test]
    fn peak_lands_exactly_on_target() {
        let input = Waveform::mono(vec![0.1, -0.4, 0.2], 24_000);
        let out = normalize(&input, 24_000).unwrap();
        let peak = out.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - PEAK_TARGET).abs() < 1e-6);
    }

    #[test]
    fn quiet_input_is_amplified_to_target() {
        let input = Waveform::mono(vec![0.001, -0.0005], 24_000);
        let out = normalize(&input, 24_000).unwrap();
        assert!((out.samples[0] - PEAK_TARGET).abs() < 1e-6);
    }

    #[test]
    fn silence_is_left_unscaled() {
        let input = Waveform::mono(vec![0.0; 100], 24_000);
        let out = normalize(&input, 24_000).unwrap();
        assert_eq!(out.samples, vec![0.0; 100]);
    }

    #[test]
    fn zero_length_input_is_not_an_error() {
        let input = Waveform::mono(Vec::new(), 48_000);
        let out = normalize(&input, 24_000).unwrap();
        assert!(out.samples.is_empty());
        assert_eq!(out.sample_rate, 24_000);
    }

    #[cfg(feature = "resample")]
    #[test]
    fn one_second_at_48k_becomes_24k_samples() {
        let input = Waveform::mono(
            (0..48_000)
                .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / 48_000.0).sin())
                .collect(),
            48_000,
        );
        let out = normalize(&input, 24_000).unwrap();
        assert_eq!(out.samples.len(), 24_000);
        assert_eq!(out.sample_rate, 24_000);
    }

    #[cfg(feature = "resample")]
    #[test]
    fn resampled_audio_still_peaks_at_target() {
        let input = Waveform::mono(
            (0..32_000)
                .map(|i| 0.3 * (i as f32 * 100.0 * std::f32::consts::TAU / 16_000.0).sin())
                .collect(),
            16_000,
        );
        let out = normalize(&input, 24_000).unwrap();
        let peak = out.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - PEAK_TARGET).abs() < 1e-4);
    }
}
