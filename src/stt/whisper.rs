//! `OpenAI` Whisper transcription

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{Transcriber, Transcription};
use crate::intent::normalize_language_code;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Response from the Whisper `verbose_json` format
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Transcribes speech with `OpenAI` Whisper
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the transcriber at a different API host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn into_transcription(response: WhisperResponse) -> Transcription {
        Transcription {
            text: response.text.trim().to_string(),
            language: normalize_language_code(response.language.as_deref().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<Transcription> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = Form::new()
            .part(
                "file",
                Part::bytes(wav.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        let transcription = Self::into_transcription(result);
        tracing::info!(
            transcript = %transcription.text,
            language = %transcription.language,
            "transcription complete"
        );
        Ok(transcription)
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_json_language_name_is_normalized() {
        let response: WhisperResponse =
            serde_json::from_str(r#"{"text":" Turn on the light ","language":"english","duration":1.2}"#)
                .unwrap();
        let t = WhisperTranscriber::into_transcription(response);
        assert_eq!(t.text, "Turn on the light");
        assert_eq!(t.language, "en");
    }

    #[test]
    fn missing_language_defaults_to_english() {
        let response: WhisperResponse = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(WhisperTranscriber::into_transcription(response).language, "en");
    }

    #[test]
    fn rejects_empty_key() {
        assert!(WhisperTranscriber::new(SecretString::from(String::new()), "whisper-1".to_string()).is_err());
    }
}
