//! Voice command endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::ApiState;
use crate::intent::{Language, VoiceResponse};
use crate::pipeline::PipelineError;

/// Multipart field carrying the recording
const AUDIO_FIELD: &str = "audio";

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(process_voice))
        .route("/audio", post(process_voice_audio))
        .route("/capabilities", get(capabilities))
        .with_state(state)
}

/// Voice capabilities response
#[derive(Debug, Serialize)]
pub struct VoiceCapabilities {
    pub normalizer: &'static str,
    pub stt_available: bool,
    pub reasoning_provider: &'static str,
    pub tts_available: bool,
    pub languages: Vec<&'static str>,
}

/// Get voice capabilities
async fn capabilities(State(state): State<Arc<ApiState>>) -> Json<VoiceCapabilities> {
    let pipeline = &state.pipeline;
    Json(VoiceCapabilities {
        normalizer: pipeline.normalizer().name(),
        stt_available: pipeline.transcriber().is_available(),
        reasoning_provider: pipeline.classifier().backend_name(),
        tts_available: pipeline.synthesizer().is_available(),
        languages: Language::ALL.iter().map(|l| l.code()).collect(),
    })
}

/// Uploaded recording with its declared metadata
struct Upload {
    data: Bytes,
    filename: Option<String>,
    content_type: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, VoiceError> {
    while let Some(field) = multipart.next_field().await.map_err(VoiceError::from)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(VoiceError::from)?;
        return Ok(Upload {
            data,
            filename,
            content_type,
        });
    }

    Err(VoiceError::BadRequest(format!(
        "missing multipart field '{AUDIO_FIELD}'"
    )))
}

async fn run_pipeline(state: &ApiState, multipart: Multipart) -> Result<VoiceResponse, VoiceError> {
    let upload = read_upload(multipart).await?;
    tracing::info!(
        filename = upload.filename.as_deref().unwrap_or_default(),
        content_type = upload.content_type.as_deref().unwrap_or_default(),
        bytes = upload.data.len(),
        "received audio"
    );

    state
        .pipeline
        .process(
            &upload.data,
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
        )
        .await
        .map_err(VoiceError::from)
}

/// Process a recording and return the full result as JSON
///
/// Reply audio is base64-encoded in `response_audio`.
async fn process_voice(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<VoiceResponse>, VoiceError> {
    let span = tracing::info_span!("voice_request", request_id = %Uuid::new_v4());
    run_pipeline(&state, multipart)
        .instrument(span)
        .await
        .map(Json)
}

/// Process a recording and return the reply audio directly
///
/// Transcript and language travel in `X-Transcript` (percent-encoded) and
/// `X-Language` headers.
async fn process_voice_audio(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Response, VoiceError> {
    let span = tracing::info_span!("voice_request", request_id = %Uuid::new_v4());
    let response = run_pipeline(&state, multipart).instrument(span).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=response.mp3"),
    );
    if let Ok(value) = HeaderValue::from_str(&urlencoding::encode(&response.transcript)) {
        headers.insert("x-transcript", value);
    }
    if let Ok(value) = HeaderValue::from_str(&response.language) {
        headers.insert("x-language", value);
    }

    Ok((StatusCode::OK, headers, response.response_audio).into_response())
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    BadRequest(String),
    PayloadTooLarge(String),
    ProcessingFailed(String),
}

impl From<MultipartError> for VoiceError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::BadRequest(e.body_text())
        }
    }
}

impl From<PipelineError> for VoiceError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::EmptyAudio => Self::BadRequest("Empty audio file".to_string()),
            PipelineError::Decode(_) => Self::ProcessingFailed(e.to_string()),
        }
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg),
            Self::ProcessingFailed(msg) => {
                tracing::error!(error = %msg, "voice request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "processing_failed", msg)
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_status() {
        let resp = VoiceError::from(PipelineError::EmptyAudio).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = VoiceError::from(PipelineError::Decode("ffmpeg missing".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
