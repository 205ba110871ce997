//! Configuration management for the Dára gateway
//!
//! Values resolve env > TOML file > default. Everything is read once at
//! startup; [`Config::build_pipeline`] turns the result into the shared,
//! read-only [`VoicePipeline`].

pub mod file;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::audio::{AudioNormalizer, FfmpegNormalizer, NativeNormalizer};
use crate::pipeline::VoicePipeline;
use crate::reasoning::{
    AtlasBackend, ChatBackend, DEFAULT_ATLAS_URL, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL,
    IntentClassifier, ReasoningBackend,
};
use crate::stt::{DeepgramTranscriber, Transcriber, TranscriptionService, WhisperTranscriber};
use crate::tts::{
    GoogleTtsBackend, OpenAiTtsBackend, SpeechBackend, SpeechSynthesizer, VoiceGender, VoiceMap,
    VoiceProfile,
};
use crate::{Error, Result};
use file::DaraConfigFile;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_STT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 120;

/// Dára gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub reasoning: ReasoningConfig,
    pub tts: TtsConfig,

    /// Language → voice table, built-ins plus file overrides
    pub voices: VoiceMap,

    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to bind
    ///
    /// # Errors
    ///
    /// Returns error if the host is not an IP address
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}: {e}", self.host)))
    }
}

/// Which audio decoder to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerKind {
    Ffmpeg,
    Native,
}

/// Audio normalization configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub normalizer: NormalizerKind,
    pub ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProvider {
    Whisper,
    Deepgram,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub provider: SttProvider,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningProvider {
    /// Hosted endpoint that owns the prompt
    Atlas,
    /// OpenAI-compatible chat completions
    Chat,
}

/// Remote reasoning configuration
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub provider: ReasoningProvider,
    pub url: String,
    /// Model name (chat provider only)
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    Google,
    OpenAi,
    /// Synthesis disabled; replies are text-only
    Disabled,
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub provider: TtsProvider,
    pub model: String,
    /// Voice for providers without per-language voices
    pub default_voice: String,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<SecretString>,
    pub deepgram: Option<SecretString>,
    pub google_tts: Option<SecretString>,
    pub reasoning: Option<SecretString>,
}

impl Config {
    /// Load configuration from the process environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name, number or URL is invalid
    pub fn from_sources(fc: DaraConfigFile, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server (env > toml > default)
        let server = ServerConfig {
            host: env("DARA_HOST")
                .or(fc.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: match env("DARA_PORT") {
                Some(raw) => parse_number(&raw, "DARA_PORT")?,
                None => fc.server.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let audio = AudioConfig {
            normalizer: match env("DARA_NORMALIZER")
                .or(fc.audio.normalizer)
                .as_deref()
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                None | Some("ffmpeg") => NormalizerKind::Ffmpeg,
                Some("native") => NormalizerKind::Native,
                Some(other) => return Err(unknown("normalizer", other)),
            },
            ffmpeg_path: env("DARA_FFMPEG_PATH")
                .or(fc.audio.ffmpeg_path)
                .map_or_else(|| PathBuf::from("ffmpeg"), PathBuf::from),
        };

        let stt_provider = match env("DARA_STT_PROVIDER")
            .or(fc.stt.provider)
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            None | Some("whisper") => SttProvider::Whisper,
            Some("deepgram") => SttProvider::Deepgram,
            Some(other) => return Err(unknown("STT provider", other)),
        };
        let stt = SttConfig {
            provider: stt_provider,
            model: env("DARA_STT_MODEL").or(fc.stt.model).unwrap_or_else(|| {
                match stt_provider {
                    SttProvider::Whisper => "whisper-1",
                    SttProvider::Deepgram => "nova-2",
                }
                .to_string()
            }),
            timeout: Duration::from_secs(match env("DARA_STT_TIMEOUT_SECS") {
                Some(raw) => parse_number(&raw, "DARA_STT_TIMEOUT_SECS")?,
                None => fc.stt.timeout_secs.unwrap_or(DEFAULT_STT_TIMEOUT_SECS),
            }),
        };

        let reasoning_provider = match env("DARA_REASONING_PROVIDER")
            .or(fc.reasoning.provider)
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            None | Some("atlas") => ReasoningProvider::Atlas,
            Some("chat" | "openai") => ReasoningProvider::Chat,
            Some(other) => return Err(unknown("reasoning provider", other)),
        };
        let reasoning_url = env("DARA_REASONING_URL")
            .or(fc.reasoning.url)
            .unwrap_or_else(|| {
                match reasoning_provider {
                    ReasoningProvider::Atlas => DEFAULT_ATLAS_URL,
                    ReasoningProvider::Chat => DEFAULT_CHAT_URL,
                }
                .to_string()
            });
        validate_url(&reasoning_url, "DARA_REASONING_URL")?;
        let reasoning = ReasoningConfig {
            provider: reasoning_provider,
            url: reasoning_url,
            model: env("DARA_REASONING_MODEL")
                .or(fc.reasoning.model)
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            timeout: Duration::from_secs(match env("DARA_REASONING_TIMEOUT_SECS") {
                Some(raw) => parse_number(&raw, "DARA_REASONING_TIMEOUT_SECS")?,
                None => fc
                    .reasoning
                    .timeout_secs
                    .unwrap_or(DEFAULT_REASONING_TIMEOUT_SECS),
            }),
        };

        let tts = TtsConfig {
            provider: match env("DARA_TTS_PROVIDER")
                .or(fc.tts.provider)
                .as_deref()
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                None | Some("google") => TtsProvider::Google,
                Some("openai") => TtsProvider::OpenAi,
                Some("none" | "disabled" | "off") => TtsProvider::Disabled,
                Some(other) => return Err(unknown("TTS provider", other)),
            },
            model: env("DARA_TTS_MODEL")
                .or(fc.tts.model)
                .unwrap_or_else(|| "tts-1".to_string()),
            default_voice: fc.tts.default_voice.unwrap_or_else(|| "nova".to_string()),
        };

        // Voice overrides come from the file only
        let voices = fc
            .voices
            .into_iter()
            .fold(VoiceMap::default(), |map, (language, entry)| {
                map.with_voice(
                    &language,
                    VoiceProfile {
                        language_code: entry.language_code,
                        name: entry.name.filter(|n| !n.trim().is_empty()),
                        gender: entry
                            .gender
                            .as_deref()
                            .map_or(VoiceGender::Neutral, VoiceGender::parse),
                    },
                )
            });

        // API keys (env > toml > None)
        let secret = |key: &str, file: Option<String>| {
            env(key)
                .or(file.filter(|v| !v.trim().is_empty()))
                .map(SecretString::from)
        };
        let api_keys = ApiKeys {
            openai: secret("OPENAI_API_KEY", fc.api_keys.openai),
            deepgram: secret("DEEPGRAM_API_KEY", fc.api_keys.deepgram),
            google_tts: secret("GOOGLE_TTS_API_KEY", fc.api_keys.google_tts),
            reasoning: secret("REASONING_API_KEY", fc.api_keys.reasoning),
        };

        Ok(Self {
            server,
            audio,
            stt,
            reasoning,
            tts,
            voices,
            api_keys,
        })
    }

    /// Audio decoder for this configuration
    #[must_use]
    pub fn build_normalizer(&self) -> Arc<dyn AudioNormalizer> {
        match self.audio.normalizer {
            NormalizerKind::Ffmpeg => Arc::new(FfmpegNormalizer::new(&self.audio.ffmpeg_path)),
            NormalizerKind::Native => Arc::new(NativeNormalizer::new()),
        }
    }

    /// Transcription service; disabled when the provider's key is missing
    ///
    /// # Errors
    ///
    /// Returns error if the provider client cannot be constructed
    pub fn build_transcription(&self) -> Result<TranscriptionService> {
        let (key, name) = match self.stt.provider {
            SttProvider::Whisper => (&self.api_keys.openai, "OPENAI_API_KEY"),
            SttProvider::Deepgram => (&self.api_keys.deepgram, "DEEPGRAM_API_KEY"),
        };
        let Some(key) = key.clone() else {
            tracing::warn!("{name} not set, transcription disabled");
            return Ok(TranscriptionService::disabled());
        };

        let backend: Arc<dyn Transcriber> = match self.stt.provider {
            SttProvider::Whisper => Arc::new(WhisperTranscriber::new(key, self.stt.model.clone())?),
            SttProvider::Deepgram => {
                Arc::new(DeepgramTranscriber::new(key, self.stt.model.clone())?)
            }
        };
        tracing::info!(provider = backend.name(), model = %self.stt.model, "STT ready");
        Ok(TranscriptionService::new(backend, self.stt.timeout))
    }

    /// Intent classifier for the configured reasoning endpoint
    #[must_use]
    pub fn build_classifier(&self) -> IntentClassifier {
        let backend: Arc<dyn ReasoningBackend> = match self.reasoning.provider {
            ReasoningProvider::Atlas => {
                let mut backend = AtlasBackend::new(&self.reasoning.url);
                if let Some(key) = &self.api_keys.reasoning {
                    backend = backend.with_api_key(key.clone());
                }
                Arc::new(backend)
            }
            ReasoningProvider::Chat => {
                let mut backend = ChatBackend::new(&self.reasoning.url, &self.reasoning.model);
                if let Some(key) = self.api_keys.reasoning.as_ref().or(self.api_keys.openai.as_ref()) {
                    backend = backend.with_api_key(key.clone());
                }
                Arc::new(backend)
            }
        };
        tracing::info!(
            provider = backend.name(),
            url = %self.reasoning.url,
            timeout_secs = self.reasoning.timeout.as_secs(),
            "reasoning endpoint configured"
        );
        IntentClassifier::new(backend, self.reasoning.timeout)
    }

    /// Speech synthesizer; disabled when off or the provider's key is missing
    ///
    /// # Errors
    ///
    /// Returns error if the provider client cannot be constructed
    pub fn build_synthesizer(&self) -> Result<SpeechSynthesizer> {
        let voices = Arc::new(self.voices.clone());
        let key = match self.tts.provider {
            TtsProvider::Disabled => {
                tracing::info!("TTS disabled");
                return Ok(SpeechSynthesizer::disabled(voices));
            }
            TtsProvider::Google => self.api_keys.google_tts.clone(),
            TtsProvider::OpenAi => self.api_keys.openai.clone(),
        };
        let Some(key) = key.filter(|k| !k.expose_secret().is_empty()) else {
            tracing::warn!(provider = ?self.tts.provider, "TTS key not set, replies will be text-only");
            return Ok(SpeechSynthesizer::disabled(voices));
        };

        let backend: Arc<dyn SpeechBackend> = match self.tts.provider {
            TtsProvider::OpenAi => Arc::new(OpenAiTtsBackend::new(
                key,
                self.tts.default_voice.clone(),
                self.tts.model.clone(),
            )?),
            TtsProvider::Google | TtsProvider::Disabled => Arc::new(GoogleTtsBackend::new(key)?),
        };
        tracing::info!(provider = backend.name(), voices = voices.len(), "TTS ready");
        Ok(SpeechSynthesizer::new(backend, voices))
    }

    /// Assemble the full pipeline
    ///
    /// # Errors
    ///
    /// Returns error if a provider client cannot be constructed
    pub fn build_pipeline(&self) -> Result<VoicePipeline> {
        Ok(VoicePipeline::new(
            self.build_normalizer(),
            self.build_transcription()?,
            self.build_classifier(),
            self.build_synthesizer()?,
        ))
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}

fn validate_url(raw: &str, key: &str) -> Result<()> {
    let url = url::Url::parse(raw).map_err(|e| Error::Config(format!("{key} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{key} must use http or https")));
    }
    Ok(())
}

fn unknown(what: &str, value: &str) -> Error {
    Error::Config(format!("unknown {what}: {value}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use file::VoiceFileEntry;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_sources(DaraConfigFile::default(), env_from(&[])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.audio.normalizer, NormalizerKind::Ffmpeg);
        assert_eq!(config.stt.provider, SttProvider::Whisper);
        assert_eq!(config.stt.model, "whisper-1");
        assert_eq!(config.stt.timeout, Duration::from_secs(10));
        assert_eq!(config.reasoning.provider, ReasoningProvider::Atlas);
        assert_eq!(config.reasoning.url, DEFAULT_ATLAS_URL);
        assert_eq!(config.reasoning.timeout, Duration::from_secs(120));
        assert_eq!(config.tts.provider, TtsProvider::Google);
        assert!(config.api_keys.openai.is_none());
        assert_eq!(config.voices.len(), 4);
    }

    #[test]
    fn env_overrides_file() {
        let mut fc = DaraConfigFile::default();
        fc.server.port = Some(9000);
        fc.stt.provider = Some("whisper".to_string());
        fc.api_keys.deepgram = Some("from-file".to_string());

        let config = Config::from_sources(
            fc,
            env_from(&[
                ("DARA_PORT", "9100"),
                ("DARA_STT_PROVIDER", "Deepgram"),
                ("DEEPGRAM_API_KEY", "from-env"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.stt.provider, SttProvider::Deepgram);
        assert_eq!(config.stt.model, "nova-2");
        assert_eq!(
            config.api_keys.deepgram.as_ref().unwrap().expose_secret(),
            "from-env"
        );
    }

    #[test]
    fn file_fills_gaps() {
        let mut fc = DaraConfigFile::default();
        fc.server.port = Some(9000);
        fc.api_keys.google_tts = Some("g-key".to_string());
        let config = Config::from_sources(fc, env_from(&[("DARA_PORT", "  ")])).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.api_keys.google_tts.is_some());
    }

    #[test]
    fn chat_provider_defaults_to_openai_url() {
        let config = Config::from_sources(
            DaraConfigFile::default(),
            env_from(&[("DARA_REASONING_PROVIDER", "chat")]),
        )
        .unwrap();
        assert_eq!(config.reasoning.provider, ReasoningProvider::Chat);
        assert_eq!(config.reasoning.url, DEFAULT_CHAT_URL);
        assert_eq!(config.reasoning.model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for pairs in [
            [("DARA_PORT", "eighty")],
            [("DARA_REASONING_URL", "not a url")],
            [("DARA_REASONING_URL", "ftp://example.com")],
            [("DARA_STT_PROVIDER", "vosk")],
            [("DARA_TTS_PROVIDER", "polly")],
            [("DARA_NORMALIZER", "sox")],
        ] {
            let result = Config::from_sources(DaraConfigFile::default(), env_from(&pairs));
            assert!(matches!(result, Err(Error::Config(_))), "{pairs:?}");
        }
    }

    #[test]
    fn voice_overrides_apply() {
        let mut fc = DaraConfigFile::default();
        fc.voices.insert(
            "yo".to_string(),
            VoiceFileEntry {
                language_code: "yo-NG".to_string(),
                name: Some("yo-NG-Standard-A".to_string()),
                gender: Some("female".to_string()),
            },
        );
        let config = Config::from_sources(fc, env_from(&[])).unwrap();
        let yo = config.voices.resolve("yo");
        assert_eq!(yo.language_code, "yo-NG");
        assert_eq!(yo.gender, VoiceGender::Female);
        assert_eq!(config.voices.len(), 4);
    }

    #[test]
    fn missing_keys_disable_stages() {
        let config = Config::from_sources(DaraConfigFile::default(), env_from(&[])).unwrap();
        let pipeline = config.build_pipeline().unwrap();
        assert!(!pipeline.transcriber().is_available());
        assert!(!pipeline.synthesizer().is_available());
        assert_eq!(pipeline.classifier().backend_name(), "atlas");
        assert_eq!(pipeline.normalizer().name(), "ffmpeg");
    }

    #[test]
    fn configured_keys_enable_stages() {
        let config = Config::from_sources(
            DaraConfigFile::default(),
            env_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("DARA_TTS_PROVIDER", "openai"),
                ("DARA_NORMALIZER", "native"),
            ]),
        )
        .unwrap();
        let pipeline = config.build_pipeline().unwrap();
        assert!(pipeline.transcriber().is_available());
        assert!(pipeline.synthesizer().is_available());
        assert_eq!(pipeline.normalizer().name(), "native");
    }

    #[test]
    fn listen_address() {
        let config = Config::from_sources(DaraConfigFile::default(), env_from(&[])).unwrap();
        assert_eq!(config.server.addr().unwrap().port(), 8000);
    }
}
