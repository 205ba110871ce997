//! Intent data model
//!
//! The structured outcome of classifying one utterance, plus the
//! API-facing [`VoiceResponse`] that carries it back to the caller.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize, Serializer};

/// Reply used when the model omits `response_text` or leaves it empty
pub const DEFAULT_RESPONSE_TEXT: &str = "Done.";

/// Whether an utterance is chat or a device-control instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentType {
    #[default]
    Conversation,
    Instruction,
}

/// Device action requested by an instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    TurnOn,
    TurnOff,
    Check,
    #[default]
    None,
}

/// Device targeted by an instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Device {
    Light,
    Fan,
    Temperature,
    #[default]
    None,
}

/// Languages the assistant speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Yoruba,
    Hausa,
    Igbo,
}

impl Language {
    /// All supported languages
    pub const ALL: [Self; 4] = [Self::English, Self::Yoruba, Self::Hausa, Self::Igbo];

    /// Short language code (`en`, `yo`, `ha`, `ig`)
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Yoruba => "yo",
            Self::Hausa => "ha",
            Self::Igbo => "ig",
        }
    }

    /// English display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Yoruba => "Yoruba",
            Self::Hausa => "Hausa",
            Self::Igbo => "Igbo",
        }
    }

    /// Look up a language by its short code, case-insensitively
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// Normalize a detected language into a short lowercase code
///
/// Accepts ISO 639-1 codes, region-tagged codes (`en-US`) and the full
/// language names some STT providers report (`english`). Empty input
/// becomes `en`.
#[must_use]
pub fn normalize_language_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Language::English.code().to_string();
    }

    if let Some(lang) = Language::ALL
        .into_iter()
        .find(|lang| lang.name().eq_ignore_ascii_case(trimmed))
    {
        return lang.code().to_string();
    }

    let primary = trimmed
        .split(['-', '_'])
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();

    if primary.is_empty() {
        Language::English.code().to_string()
    } else {
        primary
    }
}

/// Structured decision derived from an utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentType,
    pub language: String,
    pub action: Action,
    pub device: Device,
    pub response_text: String,
}

impl Intent {
    /// Build a conversational intent with the given reply
    ///
    /// An empty reply is replaced by [`DEFAULT_RESPONSE_TEXT`].
    #[must_use]
    pub fn conversation(language: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            kind: IntentType::Conversation,
            language: language.into(),
            action: Action::None,
            device: Device::None,
            response_text: non_empty_reply(response_text.into()),
        }
    }

    /// Whether this intent asks for a device to be controlled
    #[must_use]
    pub fn is_instruction(&self) -> bool {
        self.kind == IntentType::Instruction
    }
}

/// Replace a blank reply with the default one
pub(crate) fn non_empty_reply(text: String) -> String {
    if text.trim().is_empty() {
        DEFAULT_RESPONSE_TEXT.to_string()
    } else {
        text
    }
}

/// Result of one voice pipeline run, as returned to API clients
#[derive(Debug, Clone, Serialize)]
pub struct VoiceResponse {
    pub transcript: String,
    pub language: String,
    pub intent: Intent,
    /// Synthesized reply audio (MP3); empty when synthesis degraded
    #[serde(serialize_with = "serialize_base64")]
    pub response_audio: Vec<u8>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}
