use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Wall-clock duration of each pipeline stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTimings {
    #[serde(serialize_with = "as_millis")]
    pub normalize: Duration,
    #[serde(serialize_with = "as_millis")]
    pub transcribe: Duration,
    #[serde(serialize_with = "as_millis")]
    pub classify: Duration,
    #[serde(serialize_with = "as_millis")]
    pub synthesize: Duration,
}

impl StageTimings {
    /// Sum of all stages
    #[must_use]
    pub fn total(&self) -> Duration {
        self.normalize + self.transcribe + self.classify + self.synthesize
    }

    pub(crate) fn log(&self) {
        tracing::info!(
            normalize_ms = self.normalize.as_millis(),
            transcribe_ms = self.transcribe.as_millis(),
            classify_ms = self.classify.as_millis(),
            synthesize_ms = self.synthesize.as_millis(),
            total_ms = self.total().as_millis(),
            "pipeline timings"
        );
    }
}

/// Run a future and record how long it took
pub(crate) async fn timed<F: Future>(slot: &mut Duration, fut: F) -> F::Output {
    let start = Instant::now();
    let out = fut.await;
    *slot = start.elapsed();
    out
}

#[allow(clippy::cast_possible_truncation)]
fn as_millis<S: serde::Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(d.as_millis() as u64)
}
