//! In-process decoder for WAV and MP3 uploads

use std::io::Cursor;

use async_trait::async_trait;
use rubato::{FftFixedIn, Resampler};

use super::wav::{decode_wav, downmix, is_canonical_wav, looks_like_wav, samples_to_wav};
use super::{AudioNormalizer, SAMPLE_RATE};
use crate::{Error, Result};

const RESAMPLE_CHUNK: usize = 1024;

/// Normalizes WAV and MP3 input without an external process
///
/// Other containers (m4a, ogg, webm, flac) need [`FfmpegNormalizer`](super::FfmpegNormalizer).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeNormalizer;

impl NativeNormalizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn normalize_blocking(data: &[u8]) -> Result<Vec<u8>> {
        let (samples, rate) = if looks_like_wav(data) {
            decode_wav(data)?
        } else if looks_like_mp3(data) {
            decode_mp3(data)?
        } else {
            return Err(Error::Decode(
                "unsupported audio container (native decoder handles WAV and MP3)".to_string(),
            ));
        };

        if samples.is_empty() {
            return Err(Error::Decode("audio contains no samples".to_string()));
        }

        let resampled = resample(&samples, rate, SAMPLE_RATE)?;
        samples_to_wav(&resampled, SAMPLE_RATE)
    }
}

#[async_trait]
impl AudioNormalizer for NativeNormalizer {
    async fn normalize(&self, data: &[u8]) -> Result<Vec<u8>> {
        if is_canonical_wav(data) {
            tracing::debug!("input already canonical WAV, skipping conversion");
            return Ok(data.to_vec());
        }

        let data = data.to_vec();
        tokio::task::spawn_blocking(move || Self::normalize_blocking(&data))
            .await
            .map_err(|e| Error::Decode(format!("decoder task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// ID3 tag or an MPEG audio frame sync word
fn looks_like_mp3(data: &[u8]) -> bool {
    data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0)
}

/// Decode MP3 bytes to mono f32 samples plus the stream sample rate
fn decode_mp3(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(data));
    let mut samples = Vec::new();
    let mut rate = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let frame_rate = u32::try_from(frame.sample_rate)
                    .map_err(|_| Error::Decode("invalid MP3 sample rate".to_string()))?;
                if *rate.get_or_insert(frame_rate) != frame_rate {
                    return Err(Error::Decode("MP3 sample rate changes mid-stream".to_string()));
                }

                let pcm: Vec<f32> = frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                let channels = u16::try_from(frame.channels).unwrap_or(1);
                samples.extend(downmix(&pcm, channels));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => {}
            Err(e) => return Err(Error::Decode(format!("MP3 decode error: {e}"))),
        }
    }

    let rate = rate.ok_or_else(|| Error::Decode("no MP3 frames found".to_string()))?;
    Ok((samples, rate))
}

/// Resample mono audio with an FFT resampler, feeding fixed-size chunks
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, RESAMPLE_CHUNK, 2, 1)
        .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * f64::from(to) / f64::from(from)).round() as usize;

    let mut output = Vec::with_capacity(expected + delay);
    let mut chunk = Vec::with_capacity(RESAMPLE_CHUNK);
    let mut pos = 0;

    // Pad with silence past the end until the delayed tail is flushed
    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(samples.len());

        chunk.clear();
        chunk.extend_from_slice(&samples[pos..end]);
        chunk.resize(needed, 0.0);
        pos = end;

        let frames = resampler
            .process(&[&chunk], None)
            .map_err(|e| Error::Audio(format!("resampling failed: {e}")))?;
        match frames.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
    }

    Ok(output.into_iter().skip(delay).take(expected).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn tone(rate: u32, seconds: f32) -> Vec<f32> {
        let n = (rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn resample_scales_length() {
        let input = tone(48_000, 0.5);
        let output = resample(&input, 48_000, SAMPLE_RATE).unwrap();
        assert_eq!(output.len(), 8_000);
        assert!(output.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, SAMPLE_RATE, SAMPLE_RATE).unwrap(), input);
    }

    #[tokio::test]
    async fn normalizes_44k_wav() {
        let wav = samples_to_wav(&tone(44_100, 0.25), 44_100).unwrap();
        let out = NativeNormalizer::new().normalize(&wav).await.unwrap();
        assert!(is_canonical_wav(&out));
        let (samples, rate) = decode_wav(&out).unwrap();
        assert_eq!(rate, SAMPLE_RATE);
        assert_eq!(samples.len(), 4_000);
    }

    #[tokio::test]
    async fn canonical_input_passes_through() {
        let wav = samples_to_wav(&[0.25; 320], SAMPLE_RATE).unwrap();
        let out = NativeNormalizer::new().normalize(&wav).await.unwrap();
        assert_eq!(out, wav);
    }

    #[tokio::test]
    async fn unknown_container_is_decode_error() {
        let err = NativeNormalizer::new()
            .normalize(b"OggS\0\x02garbage")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn mp3_sniffing() {
        assert!(looks_like_mp3(b"ID3\x04\0"));
        assert!(looks_like_mp3(&[0xFF, 0xFB, 0x90]));
        assert!(!looks_like_mp3(b"RIFF"));
    }
}
