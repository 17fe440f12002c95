// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Status and progress reporting — a narrow, write-only notification surface
// the pipeline uses to keep a presentation layer informed without being
// coupled to it. The pipeline never reads any of these channels back.

use tracing::{debug, info};

/// Lifecycle phase of the recognition engine singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    Initializing,
    Ready,
    /// Every candidate engine source failed. The next batch retries
    /// from the top of the candidate list.
    Failed,
}

/// Whether a batch is currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Processing,
}

/// Observer sink with three independent channels.
///
/// Implementations must be cheap and non-blocking — these are called from the
/// middle of the processing loop, including from recognition progress
/// callbacks.
pub trait StatusReporter: Send + Sync {
    fn engine_phase(&self, phase: EnginePhase);

    fn batch_phase(&self, phase: BatchPhase);

    /// Aggregate recognition progress, rounded to 0–100. `None` means idle —
    /// presentation should show a placeholder.
    fn progress(&self, percent: Option<u8>);
}

/// Default reporter that writes all three channels to `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn engine_phase(&self, phase: EnginePhase) {
        info!(?phase, "engine phase changed");
    }

    fn batch_phase(&self, phase: BatchPhase) {
        info!(?phase, "batch phase changed");
    }

    fn progress(&self, percent: Option<u8>) {
        match percent {
            Some(p) => debug!(percent = p, "recognition progress"),
            None => debug!("recognition progress reset"),
        }
    }
}
