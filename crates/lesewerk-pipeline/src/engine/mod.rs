// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Recognition engine capability and its lazy, single-flight initializer.
//
// The engine is a process-wide singleton exclusive resource: it is
// constructed at most once, by trying a prioritized list of candidate
// sources, and only borrowed by the job runner for the duration of one
// recognition call.

#[cfg(feature = "ocr")]
pub mod ocrs;

use std::sync::Arc;

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::RecognitionSource;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::report::{EnginePhase, StatusReporter};

/// Progress sink passed into a recognition call. Receives fractions in
/// `[0, 1]` for the recognition phase proper.
pub type ProgressFn = dyn Fn(f32) + Send + Sync;

/// External capability that converts a bitmap into extracted text.
pub trait RecognitionEngine: Send + Sync {
    /// Post-construction load step. Must succeed before the engine handle is
    /// considered ready.
    fn initialize(&self) -> Result<()>;

    /// Extract text from one recognition source, reporting progress through
    /// the sink. Returning an empty string is a valid success.
    fn recognize(&self, source: &RecognitionSource, progress: &ProgressFn) -> Result<String>;
}

impl std::fmt::Debug for dyn RecognitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn RecognitionEngine")
    }
}

/// One candidate engine construction, tried in priority order.
pub trait EngineProvider: Send + Sync {
    /// Short description of the candidate for diagnostics.
    fn describe(&self) -> String;

    fn construct(&self) -> Result<Arc<dyn RecognitionEngine>>;
}

/// Lazily constructs the recognition engine with graceful multi-source
/// fallback and caches the ready handle for the process lifetime.
///
/// Initialisation is single-flight: the handle slot is behind an async mutex,
/// so a second batch arriving while an attempt is in flight awaits that same
/// attempt instead of starting a duplicate one. A failed attempt is not
/// cached — the next call retries from the top of the candidate list.
pub struct EngineInitializer {
    providers: Vec<Box<dyn EngineProvider>>,
    handle: Mutex<Option<Arc<dyn RecognitionEngine>>>,
}

impl EngineInitializer {
    pub fn new(providers: Vec<Box<dyn EngineProvider>>) -> Self {
        Self {
            providers,
            handle: Mutex::new(None),
        }
    }

    /// Idempotent ensure: returns the cached handle immediately (no side
    /// effects) when ready, otherwise runs one initialisation attempt.
    ///
    /// On exhaustion of all candidates, the aggregate last error is returned
    /// and the engine phase ends at `Failed`.
    #[instrument(skip_all)]
    pub async fn ensure_ready(
        &self,
        reporter: &dyn StatusReporter,
    ) -> Result<Arc<dyn RecognitionEngine>> {
        let mut slot = self.handle.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        reporter.engine_phase(EnginePhase::Initializing);

        let mut last_err: Option<LesewerkError> = None;
        for provider in &self.providers {
            let candidate = provider.describe();
            match Self::try_candidate(provider.as_ref()) {
                Ok(engine) => {
                    info!(candidate, "recognition engine ready");
                    *slot = Some(Arc::clone(&engine));
                    reporter.engine_phase(EnginePhase::Ready);
                    return Ok(engine);
                }
                Err(err) => {
                    warn!(candidate, %err, "engine candidate failed");
                    last_err = Some(err);
                }
            }
        }

        reporter.engine_phase(EnginePhase::Failed);
        Err(last_err.unwrap_or_else(|| {
            LesewerkError::EngineInit("no engine sources configured".into())
        }))
    }

    /// Construction plus the post-construction initialize step, both of which
    /// must succeed for a candidate to win.
    fn try_candidate(provider: &dyn EngineProvider) -> Result<Arc<dyn RecognitionEngine>> {
        let engine = provider.construct()?;
        engine.initialize()?;
        Ok(engine)
    }

    /// Whether a ready handle is cached. Does not trigger initialisation.
    pub async fn is_ready(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::report::{BatchPhase, LogReporter};

    struct StubEngine;

    impl RecognitionEngine for StubEngine {
        fn initialize(&self) -> Result<()> {
            Ok(())
        }

        fn recognize(&self, _source: &RecognitionSource, _progress: &ProgressFn) -> Result<String> {
            Ok("stub".into())
        }
    }

    /// Provider that counts construction attempts and fails the first
    /// `failures` of them.
    struct CountingProvider {
        attempts: Arc<AtomicUsize>,
        failures: usize,
    }

    impl EngineProvider for CountingProvider {
        fn describe(&self) -> String {
            "counting stub".into()
        }

        fn construct(&self) -> Result<Arc<dyn RecognitionEngine>> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(LesewerkError::EngineInit(format!("attempt {attempt} failed")))
            } else {
                Ok(Arc::new(StubEngine))
            }
        }
    }

    struct FailingProvider(&'static str);

    impl EngineProvider for FailingProvider {
        fn describe(&self) -> String {
            self.0.into()
        }

        fn construct(&self) -> Result<Arc<dyn RecognitionEngine>> {
            Err(LesewerkError::EngineInit(self.0.into()))
        }
    }

    /// Reporter that records engine phases for assertions.
    #[derive(Default)]
    struct PhaseRecorder {
        phases: std::sync::Mutex<Vec<EnginePhase>>,
    }

    impl StatusReporter for PhaseRecorder {
        fn engine_phase(&self, phase: EnginePhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn batch_phase(&self, _phase: BatchPhase) {}

        fn progress(&self, _percent: Option<u8>) {}
    }

    #[tokio::test]
    async fn ensure_is_idempotent_after_success() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let initializer = EngineInitializer::new(vec![Box::new(CountingProvider {
            attempts: Arc::clone(&attempts),
            failures: 0,
        })]);

        initializer.ensure_ready(&LogReporter).await.expect("first");
        initializer.ensure_ready(&LogReporter).await.expect("second");
        initializer.ensure_ready(&LogReporter).await.expect("third");

        assert_eq!(attempts.load(Ordering::SeqCst), 1, "exactly one construction");
        assert!(initializer.is_ready().await);
    }

    #[tokio::test]
    async fn fallback_tries_candidates_in_order() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let initializer = EngineInitializer::new(vec![
            Box::new(FailingProvider("primary down")),
            Box::new(CountingProvider {
                attempts: Arc::clone(&attempts),
                failures: 0,
            }),
        ]);

        initializer.ensure_ready(&LogReporter).await.expect("fallback wins");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error_and_ends_failed() {
        let reporter = PhaseRecorder::default();
        let initializer = EngineInitializer::new(vec![
            Box::new(FailingProvider("first")),
            Box::new(FailingProvider("second")),
        ]);

        let err = initializer.ensure_ready(&reporter).await.expect_err("all fail");
        assert!(err.to_string().contains("second"), "last error surfaces: {err}");
        assert!(!initializer.is_ready().await);

        let phases = reporter.phases.lock().unwrap();
        assert_eq!(*phases, vec![EnginePhase::Initializing, EnginePhase::Failed]);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let initializer = EngineInitializer::new(vec![Box::new(CountingProvider {
            attempts: Arc::clone(&attempts),
            failures: 1,
        })]);

        initializer
            .ensure_ready(&LogReporter)
            .await
            .expect_err("first attempt fails");
        initializer
            .ensure_ready(&LogReporter)
            .await
            .expect("retry from the top succeeds");

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let initializer = Arc::new(EngineInitializer::new(vec![Box::new(CountingProvider {
            attempts: Arc::clone(&attempts),
            failures: 0,
        })]));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let initializer = Arc::clone(&initializer);
            handles.push(tokio::spawn(async move {
                initializer.ensure_ready(&LogReporter).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("ensure");
        }

        assert_eq!(
            attempts.load(Ordering::SeqCst),
            1,
            "no duplicate in-flight construction"
        );
    }
}
