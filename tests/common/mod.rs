//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dara_gateway::audio::AudioNormalizer;
use dara_gateway::reasoning::{IntentClassifier, ReasoningBackend, ReasoningFailure};
use dara_gateway::stt::{Transcriber, Transcription, TranscriptionService};
use dara_gateway::tts::{SpeechBackend, SpeechSynthesizer, VoiceMap, VoiceSelection};
use dara_gateway::{Error, Result, VoicePipeline};

/// Bytes returned by [`MockSpeech`]
pub const MOCK_MP3: &[u8] = b"ID3\x04mock-mp3";

/// Call counters shared by all mocks of one pipeline
#[derive(Default)]
pub struct CallCounts {
    pub normalize: AtomicUsize,
    pub transcribe: AtomicUsize,
    pub reason: AtomicUsize,
    pub synthesize: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.normalize.load(Ordering::SeqCst)
            + self.transcribe.load(Ordering::SeqCst)
            + self.reason.load(Ordering::SeqCst)
            + self.synthesize.load(Ordering::SeqCst)
    }
}

/// Passes audio through, or fails like a missing decoder
pub struct MockNormalizer {
    pub calls: Arc<CallCounts>,
    pub fail: bool,
}

#[async_trait]
impl AudioNormalizer for MockNormalizer {
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

/// Returns a fixed transcript
pub struct MockTranscriber {
    pub calls: Arc<CallCounts>,
    pub text: String,
    pub language: String,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> Result<Transcription> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        Ok(Transcription {
            text: self.text.clone(),
            language: self.language.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Returns a fixed model reply, or hangs forever
pub struct MockReasoning {
    pub calls: Arc<CallCounts>,
    pub reply: Option<String>,
}

#[async_trait]
impl ReasoningBackend for MockReasoning {
    async fn generate(
        &self,
        _transcript: &str,
        _language: &str,
    ) -> std::result::Result<String, ReasoningFailure> {
        self.calls.reason.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => {
                std::future::pending::<()>().await;
                Err(ReasoningFailure::Other("unreachable".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Returns [`MOCK_MP3`], or always fails
pub struct MockSpeech {
    pub calls: Arc<CallCounts>,
    pub fail: bool,
}

#[async_trait]
impl SpeechBackend for MockSpeech {
    async fn synthesize(&self, _text: &str, _voice: &VoiceSelection<'_>) -> Result<Vec<u8>> {
        self.calls.synthesize.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Tts("mock failure".to_string()));
        }
        Ok(MOCK_MP3.to_vec())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Knobs for building a mock pipeline
pub struct MockSetup {
    pub transcript: String,
    pub language: String,
    /// `None` makes the reasoning call hang until the timeout
    pub model_reply: Option<String>,
    pub decode_fails: bool,
    pub tts_fails: bool,
    pub reasoning_timeout: Duration,
}

impl Default for MockSetup {
    fn default() -> Self {
        Self {
            transcript: "Turn on the light".to_string(),
            language: "en".to_string(),
            model_reply: Some(
                r#"{"type":"INSTRUCTION","language":"en","action":"TURN_ON","device":"LIGHT","response_text":"Turning on the light."}"#
                    .to_string(),
            ),
            decode_fails: false,
            tts_fails: false,
            reasoning_timeout: Duration::from_secs(120),
        }
    }
}

impl MockSetup {
    /// Build a pipeline wired to mocks, plus its call counters
    pub fn build(self) -> (VoicePipeline, Arc<CallCounts>) {
        let calls = Arc::new(CallCounts::default());

        let pipeline = VoicePipeline::new(
            Arc::new(MockNormalizer {
                calls: calls.clone(),
                fail: self.decode_fails,
            }),
            TranscriptionService::new(
                Arc::new(MockTranscriber {
                    calls: calls.clone(),
                    text: self.transcript,
                    language: self.language,
                }),
                Duration::from_secs(10),
            ),
            IntentClassifier::new(
                Arc::new(MockReasoning {
                    calls: calls.clone(),
                    reply: self.model_reply,
                }),
                self.reasoning_timeout,
            ),
            SpeechSynthesizer::new(
                Arc::new(MockSpeech {
                    calls: calls.clone(),
                    fail: self.tts_fails,
                }),
                Arc::new(VoiceMap::default()),
            ),
        );

        (pipeline, calls)
    }
}

/// Build a multipart/form-data body with one file field
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "dara-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}
