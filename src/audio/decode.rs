//! Compressed-audio decoding via symphonia.
//!
//! Accepts any container/codec symphonia can probe (WAV, MP3, OGG/Vorbis,
//! FLAC, ...) and produces an interleaved f32 [`Waveform`] preserving the
//! source channel count and sample rate.

use std::io::Cursor;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{Error, Waveform};

/// Decode uploaded audio bytes into a waveform.
///
/// Fails with [`Error::Decode`] when the bytes are not a parseable audio
/// container or use an unsupported codec.
pub fn decode_bytes(bytes: &[u8]) -> Result<Waveform, Error> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let hint = Hint::new();
    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| Error::Decode(format!("unrecognized audio container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("no supported audio track in input".to_string()))?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| Error::Decode(format!("unsupported codec: {e}")))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("input is missing a sample rate".to_string()))?;

    let mut samples = Vec::new();
    let mut channels: u16 = 0;

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        if channels == 0 {
            channels = decoded.spec().channels.count() as u16;
        }

        match decoded {
            AudioBufferRef::F32(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::F64(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::U8(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::U16(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::U24(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::U32(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::S8(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::S16(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::S24(buf) => append_interleaved(&mut samples, &buf),
            AudioBufferRef::S32(buf) => append_interleaved(&mut samples, &buf),
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode("input contained no audio frames".to_string()));
    }

    Ok(Waveform {
        samples,
        sample_rate,
        channels: channels.max(1),
    })
}

/// Interleave a planar symphonia buffer into the output vector.
fn append_interleaved<T>(
    out: &mut Vec<f32>,
    buf: &std::borrow::Cow<symphonia::core::audio::AudioBuffer<T>>,
) where
    T: symphonia::core::sample::Sample,
    f32: FromSample<T>,
{
    let n_channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * n_channels);
    for frame in 0..frames {
        for ch in 0..n_channels {
            out.push(f32::from_sample(buf.chan(ch)[frame]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Waveform;

    #[test]
    fn decodes_wav_bytes() {
        let wave = Waveform::mono(vec![0.1, -0.2, 0.3, -0.4], 16_000);
        let bytes = wave.to_wav_bytes().unwrap();

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 4);
        for (a, b) in decoded.samples.iter().zip(wave.samples.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn decodes_stereo_interleaved() {
        let wave = Waveform {
            samples: vec![0.5, -0.5, 0.25, -0.25],
            sample_rate: 44_100,
            channels: 2,
        };
        let bytes = wave.to_wav_bytes().unwrap();

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frames(), 2);
        for (a, b) in decoded.samples.iter().zip(wave.samples.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let err = decode_bytes(b"this is not audio at all").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
