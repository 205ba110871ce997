//! Speech-to-text (STT) processing
//!
//! Backends implement [`Transcriber`]; the pipeline talks to them through
//! [`TranscriptionService`], which bounds each call with a timeout and turns
//! every failure into an empty English transcript.

mod deepgram;
mod whisper;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::timeout;

pub use deepgram::DeepgramTranscriber;
pub use whisper::WhisperTranscriber;

use crate::Result;
use crate::intent::Language;

/// Transcript and detected language of one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcription {
    pub text: String,
    /// Short language code, e.g. "en" or "yo"
    pub language: String,
}

impl Transcription {
    /// The value used whenever transcription is unavailable
    #[must_use]
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            language: Language::English.code().to_string(),
        }
    }
}

/// Trait for speech-to-text providers
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe canonical WAV audio
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unreachable or its reply is unusable
    async fn transcribe(&self, wav: &[u8]) -> Result<Transcription>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Fail-soft wrapper around a [`Transcriber`]
#[derive(Clone)]
pub struct TranscriptionService {
    backend: Option<Arc<dyn Transcriber>>,
    timeout: Duration,
}

impl TranscriptionService {
    /// Create a service around a provider with a per-call timeout
    #[must_use]
    pub fn new(backend: Arc<dyn Transcriber>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
        }
    }

    /// Create a service with no provider; every call yields an empty transcript
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            backend: None,
            timeout: Duration::ZERO,
        }
    }

    /// Whether a provider is configured
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Transcribe audio, returning `("", "en")` on any failure
    pub async fn transcribe(&self, wav: &[u8]) -> Transcription {
        let Some(backend) = &self.backend else {
            tracing::warn!("no STT provider configured, returning empty transcript");
            return Transcription::empty();
        };

        match timeout(self.timeout, backend.transcribe(wav)).await {
            Ok(Ok(transcription)) => {
                if transcription.text.is_empty() {
                    tracing::debug!(provider = backend.name(), "empty transcript");
                }
                transcription
            }
            Ok(Err(e)) => {
                tracing::error!(provider = backend.name(), error = %e, "STT failed");
                Transcription::empty()
            }
            Err(_) => {
                tracing::error!(
                    provider = backend.name(),
                    timeout_ms = self.timeout.as_millis(),
                    "STT timed out"
                );
                Transcription::empty()
            }
        }
    }
}
