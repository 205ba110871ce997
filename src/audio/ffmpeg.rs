//! Decoding through an external ffmpeg process

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::wav::is_canonical_wav;
use super::{AudioNormalizer, SAMPLE_RATE};
use crate::{Error, Result};

const NOT_INSTALLED: &str = "ffmpeg is not installed or not in PATH";

/// Converts any container ffmpeg understands into canonical WAV
///
/// Input is streamed on stdin and the WAV is read back from stdout, so no
/// temporary files are written.
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    binary: PathBuf,
}

impl Default for FfmpegNormalizer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegNormalizer {
    /// Use the given ffmpeg binary (a bare name is looked up on `PATH`)
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Configured binary
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Whether the binary can be resolved
    #[must_use]
    pub fn is_installed(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn args() -> [String; 11] {
        [
            "-y".to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "wav".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ]
    }
}

#[async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, data: &[u8]) -> Result<Vec<u8>> {
        if is_canonical_wav(data) {
            tracing::debug!("input already canonical WAV, skipping ffmpeg");
            return Ok(data.to_vec());
        }

        let mut child = Command::new(&self.binary)
            .args(Self::args())
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::Decode(NOT_INSTALLED.to_string()),
                _ => Error::Decode(format!("failed to spawn ffmpeg: {e}")),
            })?;

        // Feed stdin from its own task so a full stdout pipe cannot deadlock us
        let writer = child.stdin.take().map(|mut stdin| {
            let input = data.to_vec();
            tokio::spawn(async move {
                // ffmpeg may close stdin early once it has what it needs
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!(error = %e, "ffmpeg stdin closed early");
                }
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Decode(format!("ffmpeg execution failed: {e}")))?;

        if let Some(writer) = writer {
            let _ = writer.await;
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            tracing::error!(code, stderr = %stderr.trim(), "ffmpeg conversion failed");
            return Err(Error::Decode(format!(
                "ffmpeg exited with code {code}: {}",
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(Error::Decode("ffmpeg produced no output".to_string()));
        }

        tracing::debug!(
            input_bytes = data.len(),
            output_bytes = output.stdout.len(),
            "ffmpeg conversion complete"
        );
        Ok(output.stdout)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
