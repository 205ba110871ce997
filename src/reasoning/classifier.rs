//! Fail-soft intent classifier

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use super::{ExtractError, ReasoningBackend, ReasoningFailure, parse_intent};
use crate::intent::Intent;

/// Canned replies used when classification cannot produce a real answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReplies {
    /// Reply to an empty transcript (silence)
    pub placeholder: String,
    /// Reply when the endpoint is unreachable or times out
    pub warming_up: String,
    /// Reply when the model output holds no usable intent
    pub not_understood: String,
    /// Reply for any other failure
    pub system_error: String,
}

impl Default for FallbackReplies {
    fn default() -> Self {
        Self {
            placeholder: "...".to_string(),
            warming_up: "Please wait, system warming up.".to_string(),
            not_understood: "I didn't understand that.".to_string(),
            system_error: "System error.".to_string(),
        }
    }
}

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// The model reply was parsed into an intent
    Classified,
    /// Transcript was empty; the endpoint was not contacted
    EmptyTranscript,
    /// Endpoint timed out or was unreachable
    Unavailable,
    /// Reply had no JSON or failed validation
    NotUnderstood,
    /// Any other failure
    SystemError,
}

impl ClassificationOutcome {
    /// Whether a fallback reply was substituted
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Classified)
    }
}

/// Intent plus the path that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub outcome: ClassificationOutcome,
}

/// Classifies transcripts through a [`ReasoningBackend`]
///
/// Always yields a schema-valid intent, whatever the backend does.
#[derive(Clone)]
pub struct IntentClassifier {
    backend: Arc<dyn ReasoningBackend>,
    timeout: Duration,
    replies: Arc<FallbackReplies>,
}

impl IntentClassifier {
    /// Create a classifier with the default fallback replies
    #[must_use]
    pub fn new(backend: Arc<dyn ReasoningBackend>, timeout: Duration) -> Self {
        Self::with_replies(backend, timeout, Arc::new(FallbackReplies::default()))
    }

    /// Create a classifier with custom fallback replies
    #[must_use]
    pub fn with_replies(
        backend: Arc<dyn ReasoningBackend>,
        timeout: Duration,
        replies: Arc<FallbackReplies>,
    ) -> Self {
        Self {
            backend,
            timeout,
            replies,
        }
    }

    /// Name of the underlying backend
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Classify a transcript
    pub async fn classify(&self, transcript: &str, language: &str) -> Intent {
        self.classify_with_outcome(transcript, language).await.intent
    }

    /// Classify a transcript and report which path produced the intent
    pub async fn classify_with_outcome(&self, transcript: &str, language: &str) -> Classification {
        if transcript.trim().is_empty() {
            return self.fallback(language, ClassificationOutcome::EmptyTranscript);
        }

        tracing::debug!(
            provider = self.backend.name(),
            timeout_ms = self.timeout.as_millis(),
            "sending transcript to reasoning endpoint"
        );

        let reply = match timeout(self.timeout, self.backend.generate(transcript, language)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(ReasoningFailure::Unavailable(reason))) => {
                tracing::warn!(provider = self.backend.name(), %reason, "reasoning endpoint unavailable");
                return self.fallback(language, ClassificationOutcome::Unavailable);
            }
            Ok(Err(e)) => {
                tracing::error!(provider = self.backend.name(), error = %e, "reasoning request failed");
                return self.fallback(language, ClassificationOutcome::SystemError);
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.backend.name(),
                    timeout_ms = self.timeout.as_millis(),
                    "reasoning endpoint timed out (cold start?)"
                );
                return self.fallback(language, ClassificationOutcome::Unavailable);
            }
        };

        tracing::debug!(output = %reply, "model output");

        match parse_intent(&reply, language) {
            Ok(intent) => Classification {
                intent,
                outcome: ClassificationOutcome::Classified,
            },
            Err(ExtractError::NoJson) => {
                tracing::warn!("no JSON found in model output");
                self.fallback(language, ClassificationOutcome::NotUnderstood)
            }
            Err(e) => {
                tracing::warn!(error = %e, "model output failed intent validation");
                self.fallback(language, ClassificationOutcome::NotUnderstood)
            }
        }
    }

    fn fallback(&self, language: &str, outcome: ClassificationOutcome) -> Classification {
        let reply = match outcome {
            ClassificationOutcome::EmptyTranscript => &self.replies.placeholder,
            ClassificationOutcome::Unavailable => &self.replies.warming_up,
            ClassificationOutcome::NotUnderstood => &self.replies.not_understood,
            ClassificationOutcome::Classified | ClassificationOutcome::SystemError => {
                &self.replies.system_error
            }
        };

        Classification {
            intent: Intent::conversation(language, reply.clone()),
            outcome,
        }
    }
}
