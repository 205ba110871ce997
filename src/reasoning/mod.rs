//! Intent classification through a remote reasoning model
//!
//! ```text
//! transcript ─► ReasoningBackend ─► free text ─► parse_intent ─► Intent
//!                     │ timeout / error               │ no JSON / invalid
//!                     ▼                               ▼
//!               fallback reply                  fallback reply
//! ```
//!
//! [`IntentClassifier`] never returns an error: every failure along the way
//! maps to a canned conversational [`Intent`](crate::intent::Intent).

mod atlas;
mod chat;
mod classifier;
mod extract;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;

pub use atlas::{AtlasBackend, DEFAULT_ATLAS_URL};
pub use chat::{ChatBackend, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL};
pub use classifier::{Classification, ClassificationOutcome, FallbackReplies, IntentClassifier};
pub use extract::{ExtractError, json_span, parse_intent};
pub use prompt::system_prompt;

/// Failure talking to a reasoning endpoint
#[derive(Debug, Error)]
pub enum ReasoningFailure {
    /// Endpoint unreachable or too slow (typically a cold start)
    #[error("reasoning endpoint unavailable: {0}")]
    Unavailable(String),

    /// Endpoint answered with a non-success status
    #[error("reasoning endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint answered but the envelope could not be read
    #[error("malformed reasoning response: {0}")]
    Malformed(String),

    /// Anything else (request construction, unexpected client errors)
    #[error("reasoning request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ReasoningFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            Self::Unavailable(e.to_string())
        } else if e.is_decode() || e.is_body() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Trait for remote reasoning providers
///
/// Implementations return the model's raw text; they make no promise that
/// it contains well-formed JSON.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Ask the model to classify and answer a transcript
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningFailure`] if the endpoint cannot produce a reply
    async fn generate(&self, transcript: &str, language: &str) -> Result<String, ReasoningFailure>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
