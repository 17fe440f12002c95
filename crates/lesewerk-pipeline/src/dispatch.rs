// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Batch dispatcher — the single entry point that turns a set of input files
// into per-page recognition jobs and runs them sequentially.
//
// One batch at a time: a second submission while a batch is in flight is a
// rejected no-op, reported back to the caller rather than queued. Within a
// batch, files are handled in submission order and document pages in
// ascending page order; each failure class is contained to the narrowest
// scope that still makes sense (file, page, or batch).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lesewerk_core::config::PipelineConfig;
use lesewerk_core::error::Result;
use lesewerk_core::types::{
    IMAGE_PAGE_LABEL, InputFile, MediaKind, RecognitionSource, page_label,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::EngineInitializer;
use crate::ledger::ResultLedger;
use crate::renderer::RendererLoader;
use crate::report::{BatchPhase, StatusReporter};
use crate::runner::JobRunner;

/// A per-file problem that prevented job creation but did not stop the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDiagnostic {
    pub file_name: String,
    pub message: String,
}

/// Outcome summary of one `process_batch` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// `false` when the batch was rejected because another was in flight.
    pub accepted: bool,
    /// Number of jobs created (one per image, one per document page,
    /// including pages that failed to render).
    pub enqueued: usize,
    /// File-level problems: unreadable inputs, unloadable documents,
    /// documents skipped for lack of a renderer.
    pub diagnostics: Vec<BatchDiagnostic>,
}

impl BatchReport {
    fn rejected() -> Self {
        Self::default()
    }

    fn accepted() -> Self {
        Self {
            accepted: true,
            ..Self::default()
        }
    }

    fn push_diagnostic(&mut self, file_name: &str, message: impl Into<String>) {
        self.diagnostics.push(BatchDiagnostic {
            file_name: file_name.to_owned(),
            message: message.into(),
        });
    }
}

/// Document-to-text pipeline: engine initializer, renderer loader, job
/// runner and result ledger wired behind one batch entry point.
pub struct Pipeline {
    engine: EngineInitializer,
    renderer: RendererLoader,
    runner: JobRunner,
    ledger: Arc<ResultLedger>,
    reporter: Arc<dyn StatusReporter>,
    render_scale: f32,
    document_extensions: Vec<String>,
    processing: AtomicBool,
}

/// Resets the batch latch and observer channels however the batch ends,
/// including early returns on engine failure.
struct BatchGuard<'a> {
    pipeline: &'a Pipeline,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.pipeline.reporter.progress(None);
        self.pipeline.reporter.batch_phase(BatchPhase::Idle);
        self.pipeline.processing.store(false, Ordering::SeqCst);
    }
}

impl Pipeline {
    pub fn new(
        engine: EngineInitializer,
        renderer: RendererLoader,
        reporter: Arc<dyn StatusReporter>,
        config: &PipelineConfig,
    ) -> Self {
        let ledger = Arc::new(ResultLedger::new());
        let runner = JobRunner::new(Arc::clone(&ledger), Arc::clone(&reporter));
        Self {
            engine,
            renderer,
            runner,
            ledger,
            reporter,
            render_scale: config.render_scale,
            document_extensions: config.document_extensions.clone(),
            processing: AtomicBool::new(false),
        }
    }

    /// Pipeline wired to the bundled ocrs engine and PDFium renderer, with
    /// candidate sources taken from the configuration.
    #[cfg(all(feature = "ocr", feature = "pdfium"))]
    pub fn with_default_backends(config: &PipelineConfig, reporter: Arc<dyn StatusReporter>) -> Self {
        let engine = EngineInitializer::new(crate::engine::ocrs::providers_from_config(config));
        let renderer = RendererLoader::new(crate::renderer::pdfium::providers_from_config(config));
        Self::new(engine, renderer, reporter, config)
    }

    /// The ledger backing the results view.
    pub fn ledger(&self) -> &Arc<ResultLedger> {
        &self.ledger
    }

    /// Whether a batch is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Process one batch of input files.
    ///
    /// Returns `Err` only for the batch-fatal case: the recognition engine
    /// could not be initialised from any candidate source (no jobs are
    /// created, and the next batch retries initialisation). Every other
    /// failure is contained — unreadable files and unloadable documents
    /// become diagnostics in the report, failed pages become `Failed` jobs.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn process_batch(&self, files: Vec<InputFile>) -> Result<BatchReport> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("batch rejected: another batch is in flight");
            return Ok(BatchReport::rejected());
        }
        let _guard = BatchGuard { pipeline: self };

        self.reporter.batch_phase(BatchPhase::Processing);
        let engine = self.engine.ensure_ready(self.reporter.as_ref()).await?;

        let mut report = BatchReport::accepted();
        for file in &files {
            let kind =
                MediaKind::classify(file.media_type.as_deref(), &file.name, &self.document_extensions);
            match kind {
                MediaKind::Image => {
                    let bytes = match file.read() {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            warn!(file = file.name, %err, "skipping unreadable input");
                            report.push_diagnostic(&file.name, err.to_string());
                            continue;
                        }
                    };
                    self.runner
                        .run(&engine, RecognitionSource::image(bytes), &file.name, IMAGE_PAGE_LABEL)
                        .await;
                    report.enqueued += 1;
                }
                MediaKind::PagedDocument => {
                    let Some(renderer) = self.renderer.ensure_ready().await else {
                        let message = self
                            .renderer
                            .diagnostic()
                            .await
                            .unwrap_or_else(|| "document rendering is unavailable".to_owned());
                        warn!(file = file.name, message, "skipping paged document");
                        report.push_diagnostic(&file.name, message);
                        continue;
                    };
                    let bytes = match file.read() {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            warn!(file = file.name, %err, "skipping unreadable input");
                            report.push_diagnostic(&file.name, err.to_string());
                            continue;
                        }
                    };
                    let pages = match renderer.page_count(&bytes) {
                        Ok(pages) => pages,
                        Err(err) => {
                            warn!(file = file.name, %err, "skipping unloadable document");
                            report.push_diagnostic(&file.name, err.to_string());
                            continue;
                        }
                    };
                    for page in 1..=pages as u32 {
                        let label = page_label(page);
                        match renderer.render_page(&bytes, page, self.render_scale) {
                            Ok(source) => {
                                self.runner.run(&engine, source, &file.name, &label).await;
                            }
                            Err(err) => {
                                // Page-scope containment: the page gets a
                                // Failed record, its siblings still run.
                                warn!(file = file.name, page, %err, "page failed to render");
                                self.runner.record_failure(&file.name, &label, &err.to_string());
                            }
                        }
                        report.enqueued += 1;
                    }
                }
            }
        }

        info!(
            enqueued = report.enqueued,
            diagnostics = report.diagnostics.len(),
            "batch complete"
        );
        Ok(report)
    }
}
