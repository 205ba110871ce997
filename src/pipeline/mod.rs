//! Voice command pipeline
//!
//! ```text
//! upload ─► normalize ─► transcribe ─► classify ─► synthesize ─► VoiceResponse
//! ```
//!
//! Stages run strictly in sequence for one request. Only an empty upload or
//! a decoder failure stops the run; every later stage degrades to a fallback
//! value instead.

mod timings;

use std::sync::Arc;

use thiserror::Error;

pub use timings::StageTimings;

use crate::audio::{AudioNormalizer, is_audio_upload};
use crate::intent::VoiceResponse;
use crate::reasoning::{ClassificationOutcome, IntentClassifier};
use crate::stt::TranscriptionService;
use crate::tts::SpeechSynthesizer;
use timings::timed;

/// Reasons a pipeline run produces no response
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload carried no bytes
    #[error("audio payload is empty")]
    EmptyAudio,

    /// Audio could not be converted for transcription
    #[error("audio decoding failed: {0}")]
    Decode(String),
}

impl PipelineError {
    /// Whether the caller is at fault
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyAudio)
    }
}

/// Response plus run diagnostics
#[derive(Debug, Clone)]
pub struct VoiceOutcome {
    pub response: VoiceResponse,
    pub classification: ClassificationOutcome,
    pub timings: StageTimings,
}

/// Sequences normalization, transcription, classification and synthesis
#[derive(Clone)]
pub struct VoicePipeline {
    normalizer: Arc<dyn AudioNormalizer>,
    transcriber: TranscriptionService,
    classifier: IntentClassifier,
    synthesizer: SpeechSynthesizer,
}

impl VoicePipeline {
    #[must_use]
    pub fn new(
        normalizer: Arc<dyn AudioNormalizer>,
        transcriber: TranscriptionService,
        classifier: IntentClassifier,
        synthesizer: SpeechSynthesizer,
    ) -> Self {
        Self {
            normalizer,
            transcriber,
            classifier,
            synthesizer,
        }
    }

    #[must_use]
    pub fn normalizer(&self) -> &dyn AudioNormalizer {
        self.normalizer.as_ref()
    }

    #[must_use]
    pub const fn transcriber(&self) -> &TranscriptionService {
        &self.transcriber
    }

    #[must_use]
    pub const fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    #[must_use]
    pub const fn synthesizer(&self) -> &SpeechSynthesizer {
        &self.synthesizer
    }

    /// Process one utterance into a [`VoiceResponse`]
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyAudio`] for a zero-length upload and
    /// [`PipelineError::Decode`] if normalization fails
    pub async fn process(
        &self,
        audio: &[u8],
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<VoiceResponse, PipelineError> {
        self.run(audio, filename, content_type)
            .await
            .map(|outcome| outcome.response)
    }

    /// Like [`process`](Self::process), also returning stage timings and the
    /// classification path
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process)
    pub async fn run(
        &self,
        audio: &[u8],
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<VoiceOutcome, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::EmptyAudio);
        }

        if !is_audio_upload(filename, content_type) {
            tracing::warn!(
                filename = filename.unwrap_or_default(),
                content_type = content_type.unwrap_or_default(),
                "upload does not look like audio, trying anyway"
            );
        }

        tracing::info!(
            bytes = audio.len(),
            normalizer = self.normalizer.name(),
            "processing voice request"
        );

        let mut timings = StageTimings::default();

        let wav = timed(&mut timings.normalize, self.normalizer.normalize(audio))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "audio normalization failed");
                PipelineError::Decode(e.to_string())
            })?;

        let transcription = timed(&mut timings.transcribe, self.transcriber.transcribe(&wav)).await;
        tracing::info!(
            transcript = %transcription.text,
            language = %transcription.language,
            "transcribed"
        );

        let classification = timed(
            &mut timings.classify,
            self.classifier
                .classify_with_outcome(&transcription.text, &transcription.language),
        )
        .await;
        let intent = classification.intent;
        tracing::info!(
            kind = ?intent.kind,
            action = ?intent.action,
            device = ?intent.device,
            outcome = ?classification.outcome,
            "classified"
        );

        let language = if intent.language.trim().is_empty() {
            transcription.language
        } else {
            intent.language.clone()
        };

        let response_audio = timed(
            &mut timings.synthesize,
            self.synthesizer.synthesize(&intent.response_text, &language),
        )
        .await;
        if response_audio.is_empty() {
            tracing::warn!("no reply audio, returning text-only response");
        }

        timings.log();

        Ok(VoiceOutcome {
            response: VoiceResponse {
                transcript: transcription.text,
                language,
                intent,
                response_audio,
            },
            classification: classification.outcome,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::intent::{Action, Device, IntentType};
    use crate::reasoning::{ReasoningBackend, ReasoningFailure};
    use crate::stt::{Transcriber, Transcription};
    use crate::tts::{SpeechBackend, VoiceMap, VoiceSelection};
    use crate::{Error, Result};

    #[derive(Default)]
    struct Calls {
        normalize: AtomicUsize,
        transcribe: AtomicUsize,
        generate: AtomicUsize,
        synthesize: AtomicUsize,
    }

    struct Normalizer {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl AudioNormalizer for Normalizer {
        async fn normalize(&self, data: &[u8]) -> Result<Vec<u8>> {
            self.calls.normalize.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Decode("ffmpeg is not installed or not in PATH".to_string()));
            }
            Ok(data.to_vec())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct Stt {
        calls: Arc<Calls>,
        text: &'static str,
        language: &'static str,
    }

    #[async_trait]
    impl Transcriber for Stt {
        async fn transcribe(&self, _wav: &[u8]) -> Result<Transcription> {
            self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
            Ok(Transcription {
                text: self.text.to_string(),
                language: self.language.to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct Model {
        calls: Arc<Calls>,
        reply: &'static str,
    }

    #[async_trait]
    impl ReasoningBackend for Model {
        async fn generate(&self, _t: &str, _l: &str) -> std::result::Result<String, ReasoningFailure> {
            self.calls.generate.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct Speech {
        calls: Arc<Calls>,
        languages: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechBackend for Speech {
        async fn synthesize(&self, _text: &str, voice: &VoiceSelection<'_>) -> Result<Vec<u8>> {
            self.calls.synthesize.fetch_add(1, Ordering::SeqCst);
            self.languages
                .lock()
                .unwrap()
                .push(voice.language_code.to_string());
            if self.fail {
                return Err(Error::Tts("quota exceeded".to_string()));
            }
            Ok(b"ID3mp3".to_vec())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct Harness {
        calls: Arc<Calls>,
        pipeline: VoicePipeline,
    }

    fn harness(text: &'static str, language: &'static str, reply: &'static str) -> Harness {
        build(text, language, reply, false, false)
    }

    fn build(
        text: &'static str,
        language: &'static str,
        reply: &'static str,
        decode_fails: bool,
        tts_fails: bool,
    ) -> Harness {
        let calls = Arc::new(Calls::default());
        let pipeline = VoicePipeline::new(
            Arc::new(Normalizer {
                calls: calls.clone(),
                fail: decode_fails,
            }),
            TranscriptionService::new(
                Arc::new(Stt {
                    calls: calls.clone(),
                    text,
                    language,
                }),
                Duration::from_secs(10),
            ),
            IntentClassifier::new(
                Arc::new(Model {
                    calls: calls.clone(),
                    reply,
                }),
                Duration::from_secs(120),
            ),
            SpeechSynthesizer::new(
                Arc::new(Speech {
                    calls: calls.clone(),
                    languages: Mutex::new(Vec::new()),
                    fail: tts_fails,
                }),
                Arc::new(VoiceMap::default()),
            ),
        );
        Harness { calls, pipeline }
    }

    #[tokio::test]
    async fn full_run() {
        let h = harness(
            "Turn on the light",
            "en",
            r#"{"type":"INSTRUCTION","language":"en","action":"TURN_ON","device":"LIGHT","response_text":"Turning on the light."}"#,
        );
        let outcome = h
            .pipeline
            .run(b"RIFF....", Some("clip.wav"), Some("audio/wav"))
            .await
            .unwrap();

        let response = outcome.response;
        assert_eq!(response.transcript, "Turn on the light");
        assert_eq!(response.language, "en");
        assert_eq!(response.intent.kind, IntentType::Instruction);
        assert_eq!(response.intent.action, Action::TurnOn);
        assert_eq!(response.intent.device, Device::Light);
        assert_eq!(response.response_audio, b"ID3mp3");
        assert_eq!(outcome.classification, ClassificationOutcome::Classified);
    }

    #[tokio::test]
    async fn empty_audio_makes_no_calls() {
        let h = harness("hi", "en", "{}");
        let err = h.pipeline.process(&[], None, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyAudio));
        assert!(err.is_client_error());
        assert_eq!(h.calls.normalize.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.transcribe.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.generate.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.synthesize.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn decode_failure_stops_run() {
        let h = build("hi", "en", "{}", true, false);
        let err = h.pipeline.process(b"junk", None, None).await.unwrap_err();
        match err {
            PipelineError::Decode(msg) => assert!(msg.contains("ffmpeg is not installed")),
            PipelineError::EmptyAudio => panic!("expected decode error"),
        }
        assert_eq!(h.calls.transcribe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_language_falls_back_to_transcription() {
        let h = harness(
            "Bawo ni",
            "yo",
            r#"{"type":"CONVERSATION","language":"","response_text":"Mo wa daadaa"}"#,
        );
        let response = h.pipeline.process(b"x", None, None).await.unwrap();
        assert_eq!(response.language, "yo");
        assert_eq!(response.intent.language, "");
    }

    #[tokio::test]
    async fn intent_language_wins() {
        let h = harness(
            "Sannu",
            "en",
            r#"{"type":"CONVERSATION","language":"ha","response_text":"Sannu da zuwa"}"#,
        );
        let response = h.pipeline.process(b"x", None, None).await.unwrap();
        assert_eq!(response.language, "ha");
    }

    #[tokio::test]
    async fn synthesis_failure_is_degraded_success() {
        let h = build("hello", "en", r#"{"response_text":"Hi!"}"#, false, true);
        let response = h.pipeline.process(b"x", None, None).await.unwrap();
        assert!(response.response_audio.is_empty());
        assert_eq!(response.intent.response_text, "Hi!");
        // named voice, then auto-selected voice
        assert_eq!(h.calls.synthesize.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn silence_still_gets_a_reply() {
        let h = harness("", "en", "{}");
        let outcome = h.pipeline.run(b"x", None, None).await.unwrap();
        assert_eq!(outcome.response.transcript, "");
        assert_eq!(outcome.response.intent.response_text, "...");
        assert_eq!(outcome.classification, ClassificationOutcome::EmptyTranscript);
        assert_eq!(h.calls.generate.load(Ordering::SeqCst), 0);
    }
}
