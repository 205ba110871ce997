//! Hosted inference endpoint that owns its own prompt
//!
//! The endpoint receives `{"transcript", "language"}`, builds the system
//! prompt server-side and answers with `{"generated_text": "..."}`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ReasoningBackend, ReasoningFailure};

pub const DEFAULT_ATLAS_URL: &str = "http://localhost:8080";

#[derive(Serialize)]
struct AtlasRequest<'a> {
    transcript: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct AtlasResponse {
    generated_text: Option<String>,
}

/// Reasoning backend for the hosted inference endpoint
pub struct AtlasBackend {
    client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
}

impl AtlasBackend {
    /// Create a backend posting to `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: None,
        }
    }

    /// Send a bearer token with every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        if !api_key.expose_secret().is_empty() {
            self.api_key = Some(api_key);
        }
        self
    }

    fn read_reply(response: AtlasResponse) -> Result<String, ReasoningFailure> {
        response
            .generated_text
            .ok_or_else(|| ReasoningFailure::Malformed("missing generated_text".to_string()))
    }
}

#[async_trait]
impl ReasoningBackend for AtlasBackend {
    async fn generate(&self, transcript: &str, language: &str) -> Result<String, ReasoningFailure> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&AtlasRequest { transcript, language });

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

        let result: AtlasResponse = response.json().await?;
        Self::read_reply(result)
    }

    fn name(&self) -> &'static str {
        "atlas"
    }
}
