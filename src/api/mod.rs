//! HTTP API server for the Dára gateway

pub mod health;
pub mod voice;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::{Config, NormalizerKind};
use crate::pipeline::VoicePipeline;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for API handlers
pub struct ApiState {
    pub pipeline: VoicePipeline,

    /// External decoder checked by `/ready`; `None` when decoding in-process
    pub ffmpeg_path: Option<PathBuf>,
}

impl ApiState {
    #[must_use]
    pub const fn new(pipeline: VoicePipeline, ffmpeg_path: Option<PathBuf>) -> Self {
        Self {
            pipeline,
            ffmpeg_path,
        }
    }

    /// Build state from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a provider client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Self> {
        let ffmpeg_path = match config.audio.normalizer {
            NormalizerKind::Ffmpeg => Some(config.audio.ffmpeg_path.clone()),
            NormalizerKind::Native => None,
        };
        Ok(Self::new(config.build_pipeline()?, ffmpeg_path))
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    // CORS layer for browser and mobile clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .nest("/voice", voice::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    addr: SocketAddr,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, addr: SocketAddr) -> Self {
        Self {
            state: Arc::new(state),
            addr,
        }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(addr = %self.addr, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
