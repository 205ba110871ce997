//! TOML configuration file loading
//!
//! Supports `~/.config/dara/config.toml` (or `$DARA_CONFIG`) as a persistent
//! config source. All fields are optional; the file is a partial overlay on
//! top of defaults, and environment variables override it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct DaraConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Audio normalization configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Remote reasoning configuration
    #[serde(default)]
    pub reasoning: ReasoningFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Per-language voice overrides, keyed by language code
    #[serde(default)]
    pub voices: HashMap<String, VoiceFileEntry>,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Audio normalization configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// "ffmpeg" or "native"
    pub normalizer: Option<String>,

    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: Option<String>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// "whisper" or "deepgram"
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Remote reasoning configuration
#[derive(Debug, Default, Deserialize)]
pub struct ReasoningFileConfig {
    /// "atlas" or "chat"
    pub provider: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// "google", "openai" or "none"
    pub provider: Option<String>,
    pub model: Option<String>,

    /// Voice used by providers without per-language voices (`OpenAI`)
    pub default_voice: Option<String>,
}

/// One entry of the voice map
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceFileEntry {
    /// BCP-47 code sent to the TTS provider (e.g. "en-GB")
    pub language_code: String,

    /// Explicit voice name (e.g. "en-GB-Neural2-A")
    pub name: Option<String>,

    /// "female", "male" or "neutral"
    pub gender: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub google_tts: Option<String>,
    pub reasoning: Option<String>,
}

/// Load the TOML config file from `$DARA_CONFIG` or the standard path
///
/// Returns `DaraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> DaraConfigFile {
    let Some(path) = std::env::var_os("DARA_CONFIG")
        .map(PathBuf::from)
        .or_else(config_file_path)
    else {
        return DaraConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load a config file from an explicit path
///
/// Missing or unparsable files fall back to defaults with a warning.
pub fn load_config_file_from(path: &Path) -> DaraConfigFile {
    if !path.exists() {
        return DaraConfigFile::default();
    }

    match parse_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            DaraConfigFile::default()
        }
    }
}

/// Read and parse a config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn parse_config_file(path: &Path) -> Result<DaraConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/dara/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("home", "dara", "dara").map(|d| d.config_dir().join("config.toml"))
}
