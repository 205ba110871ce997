//! Dára Gateway - multilingual voice command backend for smart homes
//!
//! One spoken clip in, one spoken reply out:
//! - Audio normalization (ffmpeg or in-process) to 16 kHz mono WAV
//! - Speech-to-text with language detection (Whisper, Deepgram)
//! - Intent classification through a remote reasoning model
//! - Text-to-speech in the speaker's language (Google Cloud, `OpenAI`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    HTTP API                          │
//! │   /voice  │  /voice/audio  │  /health  │  /ready    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 VoicePipeline                        │
//! │  normalize ─► transcribe ─► classify ─► synthesize  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              External services                       │
//! │   ffmpeg  │  STT  │  reasoning model  │  TTS        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Only an empty upload or a broken decoder fails a request; every other
//! stage falls back to a safe value.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod intent;
pub mod pipeline;
pub mod reasoning;
pub mod stt;
pub mod tts;

pub use config::Config;
pub use error::{Error, Result};
pub use intent::{Action, Device, Intent, IntentType, Language, VoiceResponse};
pub use pipeline::{PipelineError, StageTimings, VoiceOutcome, VoicePipeline};
pub use reasoning::{IntentClassifier, ReasoningBackend};
pub use stt::{Transcriber, Transcription, TranscriptionService};
pub use tts::{SpeechBackend, SpeechSynthesizer, VoiceMap};
