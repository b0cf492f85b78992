//! Stage timing for long-running operations.
//!
//! A [`LatencyTrace`] records monotonic timestamps at fixed stage boundaries
//! and reports per-stage deltas plus the real-time factor
//! (`wall time / audio duration`) through the `log` facade.  It never
//! influences control flow.
//!
//! ```text
//! start ─▶ InputAcquired ─▶ PreInference ─▶ PostInference ─▶ ResultsCollected
//!   copy      preprocess        inference          collect
//! ```

use std::fmt;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "speech_session::latency";

/// Stage boundaries recorded by a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Input copied or read from storage.
    InputAcquired,
    /// Decode/resample/gating done; engine about to run.
    PreInference,
    /// Engine call returned.
    PostInference,
    /// Output gathered into its result type.
    ResultsCollected,
}

impl Stage {
    fn label(&self) -> &'static str {
        match self {
            Stage::InputAcquired => "acquire input",
            Stage::PreInference => "preprocess",
            Stage::PostInference => "inference",
            Stage::ResultsCollected => "collect results",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// LatencyTrace
// ---------------------------------------------------------------------------

/// Monotonic stage timestamps for a single operation.
#[derive(Debug, Clone)]
pub struct LatencyTrace {
    operation: &'static str,
    started: Instant,
    marks: Vec<(Stage, Instant)>,
}

impl LatencyTrace {
    /// Start timing `operation` now.
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
            marks: Vec::with_capacity(4),
        }
    }

    /// Record that `stage` finished now.
    pub fn mark(&mut self, stage: Stage) {
        self.marks.push((stage, Instant::now()));
    }

    /// Time spent in `stage`: from the previous mark (or the start) to the
    /// mark for `stage`.
    pub fn stage_duration(&self, stage: Stage) -> Option<Duration> {
        let idx = self.marks.iter().position(|(s, _)| *s == stage)?;
        let prev = match idx {
            0 => self.started,
            i => self.marks[i - 1].1,
        };
        Some(self.marks[idx].1.duration_since(prev))
    }

    /// Wall time from start to the last recorded mark.
    pub fn total(&self) -> Duration {
        self.marks
            .last()
            .map(|(_, at)| at.duration_since(self.started))
            .unwrap_or_default()
    }

    /// `total / audio duration`; `None` for zero-length audio.
    pub fn real_time_factor(&self, audio_ms: u64) -> Option<f32> {
        if audio_ms == 0 {
            return None;
        }
        Some(self.total().as_secs_f32() * 1000.0 / audio_ms as f32)
    }

    /// Log every recorded stage and the real-time factor.
    pub fn report(&self, audio_ms: u64) {
        let mut prev = self.started;
        for (stage, at) in &self.marks {
            log::info!(
                target: LOG_TARGET,
                "[{}] {:<16} {:>6} ms",
                self.operation,
                stage.label(),
                at.duration_since(prev).as_millis()
            );
            prev = *at;
        }
        match self.real_time_factor(audio_ms) {
            Some(rtf) => log::info!(
                target: LOG_TARGET,
                "[{}] total {} ms for {} ms of audio (RTF = {rtf:.2}x)",
                self.operation,
                self.total().as_millis(),
                audio_ms
            ),
            None => log::info!(
                target: LOG_TARGET,
                "[{}] total {} ms",
                self.operation,
                self.total().as_millis()
            ),
        }
    }
}
