//! Intent extraction from free-form model output
//!
//! Models are asked for bare JSON but routinely wrap it in preambles,
//! markdown fences or trailing chatter. Extraction slices from the first
//! `{` to the last `}` and coerces every field with a default, so only a
//! missing object, invalid JSON, or an out-of-vocabulary enum value
//! rejects the reply.

use serde::Deserialize;
use thiserror::Error;

use crate::intent::{Action, Device, Intent, IntentType, non_empty_reply};

/// Why a model reply could not be turned into an [`Intent`]
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No `{ ... }` span in the reply
    #[error("no JSON object found in model output")]
    NoJson,

    /// The span is not valid JSON or violates the intent schema
    #[error("invalid intent JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Intent fields as the model may send them; everything is optional
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(rename = "type")]
    kind: Option<IntentType>,
    language: Option<String>,
    action: Option<Action>,
    device: Option<Device>,
    response_text: Option<String>,
}

impl RawIntent {
    fn into_intent(self, request_language: &str) -> Intent {
        Intent {
            kind: self.kind.unwrap_or_default(),
            language: self
                .language
                .unwrap_or_else(|| request_language.to_string()),
            action: self.action.unwrap_or_default(),
            device: self.device.unwrap_or_default(),
            response_text: non_empty_reply(self.response_text.unwrap_or_default()),
        }
    }
}

/// Outermost brace-delimited span of `text`, if any
#[must_use]
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Coerce a model reply into a schema-valid [`Intent`]
///
/// `request_language` fills in a missing `language` field.
///
/// # Errors
///
/// Returns [`ExtractError::NoJson`] when the reply has no object span and
/// [`ExtractError::Invalid`] when the span fails to parse or carries an
/// unknown `type`, `action` or `device` value.
pub fn parse_intent(text: &str, request_language: &str) -> Result<Intent, ExtractError> {
    let span = json_span(text).ok_or(ExtractError::NoJson)?;
    let raw: RawIntent = serde_json::from_str(span)?;
    Ok(raw.into_intent(request_language))
}
