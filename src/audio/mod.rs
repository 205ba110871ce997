//! Audio normalization
//!
//! Every upload is converted to 16 kHz mono 16-bit PCM WAV before it reaches
//! a transcription backend.

mod ffmpeg;
mod native;
mod wav;

use std::path::Path;

use async_trait::async_trait;

pub use ffmpeg::FfmpegNormalizer;
pub use native::NativeNormalizer;
pub use wav::{decode_wav, is_canonical_wav, samples_to_wav};

use crate::Result;

/// Target sample rate for transcription
pub const SAMPLE_RATE: u32 = 16_000;

/// Target channel count
pub const CHANNELS: u16 = 1;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "mp4", "wav", "m4a", "ogg", "webm", "flac"];

/// Trait for converting uploads into canonical WAV
#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    /// Convert arbitrary audio bytes into 16 kHz mono WAV
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the decoder is
    /// missing or the input cannot be decoded
    async fn normalize(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Normalizer name for logging
    fn name(&self) -> &'static str;
}

/// Whether an upload looks like audio by media type or file extension
#[must_use]
pub fn is_audio_upload(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_type = content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("audio/"));

    let by_extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

    by_type || by_extension
}
