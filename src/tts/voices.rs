//! Static language → voice mapping

use std::collections::HashMap;

use serde::Serialize;

use crate::intent::Language;

/// Voice gender constraint used when auto-selecting a voice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    Female,
    Male,
    #[default]
    Neutral,
}

impl VoiceGender {
    /// Parse a gender name, falling back to neutral for anything unrecognized
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "female" => Self::Female,
            "male" => Self::Male,
            _ => Self::Neutral,
        }
    }
}

/// Synthesis voice configuration for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    /// BCP-47 language code sent to the provider
    pub language_code: String,
    /// Explicit voice name; `None` lets the provider pick
    pub name: Option<String>,
    pub gender: VoiceGender,
}

impl VoiceProfile {
    fn neural2(name: &str, gender: VoiceGender) -> Self {
        Self {
            language_code: "en-GB".to_string(),
            name: Some(name.to_string()),
            gender,
        }
    }

    /// Selection with the explicit voice name
    #[must_use]
    pub fn selection(&self) -> VoiceSelection<'_> {
        VoiceSelection {
            language_code: &self.language_code,
            name: self.name.as_deref(),
            gender: self.gender,
        }
    }

    /// Selection constrained only by language and gender
    #[must_use]
    pub fn auto_selection(&self) -> VoiceSelection<'_> {
        VoiceSelection {
            language_code: &self.language_code,
            name: None,
            gender: self.gender,
        }
    }
}

/// Voice constraints for a single synthesis call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSelection<'a> {
    pub language_code: &'a str,
    pub name: Option<&'a str>,
    pub gender: VoiceGender,
}

/// Immutable mapping from language code to voice profile
///
/// Languages absent from the map resolve to the default language's entry.
#[derive(Debug, Clone)]
pub struct VoiceMap {
    voices: HashMap<String, VoiceProfile>,
    default_language: String,
    default_voice: VoiceProfile,
}

impl Default for VoiceMap {
    /// Nigerian English is approximated with British Neural2 voices
    fn default() -> Self {
        let voices: HashMap<String, VoiceProfile> = [
            (Language::English, VoiceProfile::neural2("en-GB-Neural2-A", VoiceGender::Female)),
            (Language::Yoruba, VoiceProfile::neural2("en-GB-Neural2-B", VoiceGender::Male)),
            (Language::Hausa, VoiceProfile::neural2("en-GB-Neural2-C", VoiceGender::Female)),
            (Language::Igbo, VoiceProfile::neural2("en-GB-Neural2-D", VoiceGender::Male)),
        ]
        .into_iter()
        .map(|(lang, profile)| (lang.code().to_string(), profile))
        .collect();

        Self {
            voices,
            default_language: Language::English.code().to_string(),
            default_voice: VoiceProfile::neural2("en-GB-Neural2-A", VoiceGender::Female),
        }
    }
}

impl VoiceMap {
    /// Replace or add the voice for a language
    #[must_use]
    pub fn with_voice(mut self, language: &str, profile: VoiceProfile) -> Self {
        let key = language.trim().to_ascii_lowercase();
        if key == self.default_language {
            self.default_voice = profile.clone();
        }
        self.voices.insert(key, profile);
        self
    }

    /// Voice for a language, if explicitly mapped
    #[must_use]
    pub fn get(&self, language: &str) -> Option<&VoiceProfile> {
        self.voices.get(&language.trim().to_ascii_lowercase())
    }

    /// Voice for a language, falling back to the default language
    #[must_use]
    pub fn resolve(&self, language: &str) -> &VoiceProfile {
        self.get(language).unwrap_or(&self.default_voice)
    }

    /// Language whose voice is used for unmapped languages
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Number of mapped languages
    #[must_use]
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether the map has no explicit entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
