//! PCM WAV helpers

use std::io::Cursor;

use super::{CHANNELS, SAMPLE_RATE};
use crate::{Error, Result};

const BITS_PER_SAMPLE: u16 = 16;

/// Whether `data` is already 16 kHz mono 16-bit PCM WAV
#[must_use]
pub fn is_canonical_wav(data: &[u8]) -> bool {
    hound::WavReader::new(Cursor::new(data)).is_ok_and(|reader| {
        let spec = reader.spec();
        spec.channels == CHANNELS
            && spec.sample_rate == SAMPLE_RATE
            && spec.bits_per_sample == BITS_PER_SAMPLE
            && spec.sample_format == hound::SampleFormat::Int
    })
}

/// Whether `data` starts with a RIFF/WAVE header
#[must_use]
pub fn looks_like_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

/// Encode mono f32 samples as 16-bit PCM WAV
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV file into mono f32 samples plus its sample rate
///
/// Multi-channel input is down-mixed by averaging each frame.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the data is not a readable WAV file
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(data))
        .map_err(|e| Error::Decode(format!("invalid WAV data: {e}")))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Decode(format!("WAV read error: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Decode(format!("WAV read error: {e}")))?
        }
    };

    Ok((downmix(&interleaved, spec.channels), spec.sample_rate))
}

/// Average interleaved frames down to a single channel
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let channels = usize::from(channels);
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_wav(rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16384_i16).unwrap();
                writer.write_sample(0_i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn canonical_detection() {
        let wav = samples_to_wav(&[0.0; 160], SAMPLE_RATE).unwrap();
        assert!(looks_like_wav(&wav));
        assert!(is_canonical_wav(&wav));

        assert!(!is_canonical_wav(&samples_to_wav(&[0.0; 160], 44_100).unwrap()));
        assert!(!is_canonical_wav(&stereo_wav(SAMPLE_RATE)));
        assert!(!is_canonical_wav(b"ID3\x03not a wav"));
    }

    #[test]
    fn decodes_and_downmixes_stereo() {
        let (samples, rate) = decode_wav(&stereo_wav(48_000)).unwrap();
        assert_eq!(rate, 48_000);
        assert_eq!(samples.len(), 100);
        assert!((samples[0] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn roundtrip_keeps_amplitude() {
        let wav = samples_to_wav(&[0.5, -0.5], SAMPLE_RATE).unwrap();
        let (samples, _) = decode_wav(&wav).unwrap();
        assert!((samples[0] - 0.5).abs() < 1e-3);
        assert!((samples[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(decode_wav(b"not audio"), Err(Error::Decode(_))));
    }
}
