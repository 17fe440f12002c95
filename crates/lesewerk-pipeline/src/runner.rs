// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Job runner — executes one recognition job end-to-end.
//
// A job is created `Pending`, transitioned to `Processing` in the same step
// that makes it visible in the ledger, and settles at `Done` or `Failed`.
// Failures are isolated: one job's failure never aborts its siblings. The
// engine is a single-concurrency resource, so the runner awaits each call
// before the dispatcher hands it the next job.

use std::sync::Arc;

use lesewerk_core::human_errors::GENERIC_RECOGNITION_FAILURE;
use lesewerk_core::types::{JobId, OcrJob, RecognitionSource};
use tracing::{debug, instrument, warn};

use crate::engine::RecognitionEngine;
use crate::ledger::ResultLedger;
use crate::report::StatusReporter;

pub struct JobRunner {
    ledger: Arc<ResultLedger>,
    reporter: Arc<dyn StatusReporter>,
}

impl JobRunner {
    pub fn new(ledger: Arc<ResultLedger>, reporter: Arc<dyn StatusReporter>) -> Self {
        Self { ledger, reporter }
    }

    /// Run one job to completion against the borrowed engine handle.
    ///
    /// The recognition call runs on the blocking pool; engine progress
    /// callbacks are forwarded to the reporter as rounded 0–100 percentages
    /// (batch-wide, last-job-wins).
    #[instrument(skip_all, fields(file = file_name, page = page_label))]
    pub async fn run(
        &self,
        engine: &Arc<dyn RecognitionEngine>,
        source: RecognitionSource,
        file_name: &str,
        page_label: &str,
    ) -> JobId {
        let mut job = OcrJob::new(file_name, page_label);
        let id = job.id;
        job.start();
        self.ledger.insert(job);

        let engine = Arc::clone(engine);
        let reporter = Arc::clone(&self.reporter);
        let call = tokio::task::spawn_blocking(move || {
            let progress = move |fraction: f32| {
                let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
                reporter.progress(Some(percent));
            };
            engine.recognize(&source, &progress)
        })
        .await;

        match call {
            Ok(Ok(text)) => {
                debug!(%id, chars = text.len(), "job done");
                self.ledger.complete(id, &text);
            }
            Ok(Err(err)) => {
                warn!(%id, %err, "job failed");
                self.ledger.fail(id, &failure_message(&err.to_string()));
            }
            Err(join_err) => {
                // Recognition panicked — contain it to this job.
                warn!(%id, %join_err, "recognition task aborted");
                self.ledger.fail(id, GENERIC_RECOGNITION_FAILURE);
            }
        }
        id
    }

    /// Record a job that failed before it could reach the engine (for
    /// example a page that would not rasterise). Behaves exactly like a
    /// recognition failure at the page level.
    pub fn record_failure(&self, file_name: &str, page_label: &str, message: &str) -> JobId {
        let mut job = OcrJob::new(file_name, page_label);
        let id = job.id;
        job.start();
        self.ledger.insert(job);
        self.ledger.fail(id, &failure_message(message));
        id
    }
}

/// Human-readable failure text, with a generic fallback for message-less
/// failures.
fn failure_message(detail: &str) -> String {
    if detail.trim().is_empty() {
        GENERIC_RECOGNITION_FAILURE.to_string()
    } else {
        detail.to_string()
    }
}
