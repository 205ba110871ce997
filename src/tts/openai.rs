//! `OpenAI` text-to-speech provider

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{SpeechBackend, VoiceGender, VoiceSelection};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Voice names the `OpenAI` speech endpoint accepts
const OPENAI_VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
];

/// Synthesizes speech through the `OpenAI` speech endpoint
pub struct OpenAiTtsBackend {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    base_url: String,
}

impl OpenAiTtsBackend {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// `voice` is used whenever the requested voice is not an `OpenAI` voice.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, voice: String, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            voice,
            speed: 1.0,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the backend at a different API host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Map a provider-neutral selection onto an `OpenAI` voice name
    fn voice_for<'a>(&'a self, selection: &VoiceSelection<'a>) -> &'a str {
        match selection.name {
            Some(name) if OPENAI_VOICES.contains(&name) => name,
            Some(_) => &self.voice,
            None => match selection.gender {
                VoiceGender::Female => "nova",
                VoiceGender::Male => "onyx",
                VoiceGender::Neutral => &self.voice,
            },
        }
    }
}

#[async_trait]
impl SpeechBackend for OpenAiTtsBackend {
    async fn synthesize(&self, text: &str, voice: &VoiceSelection<'_>) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: self.voice_for(voice),
            speed: self.speed,
            response_format: "mp3",
        };

        let url = format!("{}/v1/audio/speech", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiTtsBackend {
        OpenAiTtsBackend::new(
            SecretString::from("sk-test".to_string()),
            "alloy".to_string(),
            "tts-1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_key() {
        let result = OpenAiTtsBackend::new(
            SecretString::from(String::new()),
            "alloy".to_string(),
            "tts-1".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn foreign_voice_names_use_configured_voice() {
        let backend = backend();
        let selection = VoiceSelection {
            language_code: "en-GB",
            name: Some("en-GB-Neural2-A"),
            gender: VoiceGender::Female,
        };
        assert_eq!(backend.voice_for(&selection), "alloy");

        let native = VoiceSelection {
            name: Some("shimmer"),
            ..selection
        };
        assert_eq!(backend.voice_for(&native), "shimmer");
    }

    #[test]
    fn auto_selection_follows_gender() {
        let backend = backend();
        let female = VoiceSelection {
            language_code: "en-GB",
            name: None,
            gender: VoiceGender::Female,
        };
        let male = VoiceSelection {
            gender: VoiceGender::Male,
            ..female
        };
        let neutral = VoiceSelection {
            gender: VoiceGender::Neutral,
            ..female
        };
        assert_eq!(backend.voice_for(&female), "nova");
        assert_eq!(backend.voice_for(&male), "onyx");
        assert_eq!(backend.voice_for(&neutral), "alloy");
    }
}
