//! Text-to-speech (TTS) processing
//!
//! A [`SpeechSynthesizer`] picks a voice for the reply language and asks a
//! pluggable [`SpeechBackend`] for MP3 audio. Synthesis never fails the
//! request: any backend problem degrades to an empty audio payload.

mod google;
mod openai;
mod voices;

use std::sync::Arc;

use async_trait::async_trait;

pub use google::GoogleTtsBackend;
pub use openai::OpenAiTtsBackend;
pub use voices::{VoiceGender, VoiceMap, VoiceProfile, VoiceSelection};

use crate::Result;

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synthesize `text` with the given voice constraints
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the request or is unreachable
    async fn synthesize(&self, text: &str, voice: &VoiceSelection<'_>) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Fail-soft speech synthesizer with voice-selection fallback
#[derive(Clone)]
pub struct SpeechSynthesizer {
    backend: Option<Arc<dyn SpeechBackend>>,
    voices: Arc<VoiceMap>,
}

impl SpeechSynthesizer {
    /// Create a synthesizer backed by a provider
    #[must_use]
    pub fn new(backend: Arc<dyn SpeechBackend>, voices: Arc<VoiceMap>) -> Self {
        Self {
            backend: Some(backend),
            voices,
        }
    }

    /// Create a synthesizer with no provider; every call yields empty audio
    #[must_use]
    pub fn disabled(voices: Arc<VoiceMap>) -> Self {
        Self {
            backend: None,
            voices,
        }
    }

    /// Whether a provider is configured
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Voice map used for language lookup
    #[must_use]
    pub fn voices(&self) -> &VoiceMap {
        &self.voices
    }

    /// Synthesize a reply in the given language
    ///
    /// Tries the language's explicit voice first, then retries once with
    /// only language and gender constraints. Returns empty bytes for blank
    /// text, when no provider is configured, or when both attempts fail.
    pub async fn synthesize(&self, text: &str, language: &str) -> Vec<u8> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let Some(backend) = &self.backend else {
            tracing::warn!("no TTS provider configured, returning empty audio");
            return Vec::new();
        };

        let profile = self.voices.resolve(language);
        tracing::info!(
            provider = backend.name(),
            language,
            voice = profile.name.as_deref().unwrap_or("auto"),
            "generating speech"
        );

        if let Some(voice_name) = profile.name.as_deref() {
            match backend.synthesize(text, &profile.selection()).await {
                Ok(audio) => {
                    tracing::info!(bytes = audio.len(), "TTS success");
                    return audio;
                }
                Err(e) => {
                    tracing::warn!(
                        voice = voice_name,
                        error = %e,
                        "voice failed, retrying with auto-selected voice"
                    );
                }
            }
        }

        match backend.synthesize(text, &profile.auto_selection()).await {
            Ok(audio) => {
                tracing::info!(bytes = audio.len(), "TTS success with auto-selected voice");
                audio
            }
            Err(e) => {
                tracing::error!(provider = backend.name(), error = %e, "TTS failed");
                Vec::new()
            }
        }
    }
}
