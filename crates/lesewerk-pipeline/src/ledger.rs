// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Result ledger — the ordered collection of job records backing the results
// view. Newest entries first for display; processing order (oldest enqueued
// first) is the dispatcher's concern, not the ledger's.
//
// The ledger exclusively owns all job records. The job runner drives the only
// in-place mutations; the single externally triggered mutation is `clear`.

use std::sync::{PoisonError, RwLock};

use lesewerk_core::types::{JobId, OcrJob};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ResultLedger {
    jobs: RwLock<Vec<OcrJob>>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the display front (most-recent-first ordering).
    pub fn insert(&self, job: OcrJob) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(0, job);
        debug!(count = jobs.len(), "job inserted into ledger");
    }

    /// Terminal transition to `Done` with the engine's (trimmed) text.
    ///
    /// Returns `false` if the job does not exist or is already terminal —
    /// `Done` and `Failed` records are never re-transitioned.
    pub fn complete(&self, id: JobId, text: &str) -> bool {
        self.transition(id, |job| job.complete(text))
    }

    /// Terminal transition to `Failed` with a human-readable message.
    ///
    /// Same terminal-state rules as [`complete`](Self::complete).
    pub fn fail(&self, id: JobId, message: &str) -> bool {
        self.transition(id, |job| job.fail(message))
    }

    fn transition(&self, id: JobId, apply: impl FnOnce(&mut OcrJob)) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.iter_mut().find(|job| job.id == id) {
            Some(job) if job.status.is_terminal() => {
                warn!(%id, status = ?job.status, "refusing to re-transition terminal job");
                false
            }
            Some(job) => {
                apply(job);
                true
            }
            None => {
                warn!(%id, "job not found in ledger");
                false
            }
        }
    }

    /// Look up a single job by id.
    pub fn get(&self, id: JobId) -> Option<OcrJob> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.iter().find(|job| job.id == id).cloned()
    }

    /// All records in display order (newest first).
    pub fn snapshot(&self) -> Vec<OcrJob> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.clone()
    }

    /// Total record count — drives the observer's "total records" readout.
    pub fn len(&self) -> usize {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the entire ledger. The only deletion surface.
    pub fn clear(&self) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.clear();
        debug!("ledger cleared");
    }
}
