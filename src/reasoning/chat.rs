//! OpenAI-compatible chat completions backend

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ReasoningBackend, ReasoningFailure, system_prompt};

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 512;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Reasoning backend that prompts a chat model directly
pub struct ChatBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl ChatBackend {
    /// Create a backend for `model` served under `base_url`
    ///
    /// `base_url` is the API root; `/chat/completions` is appended.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        if !api_key.expose_secret().is_empty() {
            self.api_key = Some(api_key);
        }
        self
    }

    fn request_body<'a>(&'a self, transcript: &str, language: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(language),
                },
                ChatMessage {
                    role: "user",
                    content: transcript.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    fn read_reply(response: ChatResponse) -> Result<String, ReasoningFailure> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReasoningFailure::Malformed("no choices in chat response".to_string()))
    }
}

#[async_trait]
impl ReasoningBackend for ChatBackend {
    async fn generate(&self, transcript: &str, language: &str) -> Result<String, ReasoningFailure> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut request = self
            .client
            .post(&url)
            .json(&self.request_body(transcript, language));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatResponse = response.json().await?;
        Self::read_reply(result)
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}
