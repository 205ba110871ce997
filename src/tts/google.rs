//! Google Cloud Text-to-Speech provider

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{SpeechBackend, VoiceGender, VoiceSelection};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Synthesizes speech through the Google Cloud TTS REST API
pub struct GoogleTtsBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceParams<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    ssml_gender: VoiceGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

impl GoogleTtsBackend {
    /// Create a new Google TTS backend
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Google TTS API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the backend at a different API host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body<'a>(text: &'a str, voice: &VoiceSelection<'a>) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceParams {
                language_code: voice.language_code,
                name: voice.name,
                ssml_gender: voice.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 1.0,
                pitch: 0.0,
            },
        }
    }
}

#[async_trait]
impl SpeechBackend for GoogleTtsBackend {
    async fn synthesize(&self, text: &str, voice: &VoiceSelection<'_>) -> Result<Vec<u8>> {
        let url = format!(
            "{}/v1/text:synthesize",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&Self::request_body(text, voice))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: SynthesizeResponse = response.json().await?;
        STANDARD
            .decode(result.audio_content.as_bytes())
            .map_err(|e| Error::Tts(format!("invalid audio content from Google TTS: {e}")))
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        assert!(GoogleTtsBackend::new(SecretString::from(String::new())).is_err());
    }

    #[test]
    fn request_body_shape() {
        let selection = VoiceSelection {
            language_code: "en-GB",
            name: Some("en-GB-Neural2-A"),
            gender: VoiceGender::Female,
        };
        let body = serde_json::to_value(GoogleTtsBackend::request_body("Hello", &selection)).unwrap();
        assert_eq!(body["input"]["text"], "Hello");
        assert_eq!(body["voice"]["languageCode"], "en-GB");
        assert_eq!(body["voice"]["name"], "en-GB-Neural2-A");
        assert_eq!(body["voice"]["ssmlGender"], "FEMALE");
        assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
    }

    #[test]
    fn auto_selection_omits_name() {
        let selection = VoiceSelection {
            language_code: "en-GB",
            name: None,
            gender: VoiceGender::Male,
        };
        let body = serde_json::to_value(GoogleTtsBackend::request_body("Hi", &selection)).unwrap();
        assert!(body["voice"].get("name").is_none());
        assert_eq!(body["voice"]["ssmlGender"], "MALE");
    }
}
