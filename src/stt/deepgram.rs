//! Deepgram transcription with language detection

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{Transcriber, Transcription};
use crate::intent::normalize_language_code;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";

/// Response from Deepgram transcription API
#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    #[serde(default)]
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    #[serde(default)]
    alternatives: Vec<DeepgramAlternative>,
    #[serde(default)]
    detected_language: Option<String>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f64,
}

/// Transcribes speech with Deepgram
pub struct DeepgramTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl DeepgramTranscriber {
    /// Create a new Deepgram transcriber
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
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

    fn into_transcription(response: DeepgramResponse) -> Transcription {
        let channel = response.results.channels.into_iter().next();
        let language = channel
            .as_ref()
            .and_then(|c| c.detected_language.as_deref())
            .map(normalize_language_code)
            .unwrap_or_else(|| Transcription::empty().language);

        let (transcript, confidence) = channel
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| (a.transcript, a.confidence))
            .unwrap_or_default();

        if transcript.is_empty() {
            tracing::debug!(confidence, "empty transcript from Deepgram");
        }

        Transcription {
            text: transcript,
            language,
        }
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<Transcription> {
        tracing::debug!(audio_bytes = wav.len(), "starting Deepgram transcription");

        let url = format!(
            "{}/v1/listen?model={}&smart_format=true&detect_language=true",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key.expose_secret()))
            .header("Content-Type", "audio/wav")
            .body(wav.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
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
        "deepgram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_alternative_and_detected_language() {
        let response: DeepgramResponse = serde_json::from_str(
            r#"{"results":{"channels":[{"detected_language":"ha","alternatives":[
                {"transcript":"Yaya kake?","confidence":0.91},
                {"transcript":"Yaya ka ke","confidence":0.4}
            ]}]}}"#,
        )
        .unwrap();
        let t = DeepgramTranscriber::into_transcription(response);
        assert_eq!(t.text, "Yaya kake?");
        assert_eq!(t.language, "ha");
    }

    #[test]
    fn missing_channels_yield_empty_english() {
        let response: DeepgramResponse =
            serde_json::from_str(r#"{"results":{"channels":[]}}"#).unwrap();
        assert_eq!(
            DeepgramTranscriber::into_transcription(response),
            Transcription::empty()
        );
    }

    #[test]
    fn missing_language_defaults_to_english() {
        let response: DeepgramResponse = serde_json::from_str(
            r#"{"results":{"channels":[{"alternatives":[{"transcript":"hello"}]}]}}"#,
        )
        .unwrap();
        let t = DeepgramTranscriber::into_transcription(response);
        assert_eq!(t.text, "hello");
        assert_eq!(t.language, "en");
    }
}
