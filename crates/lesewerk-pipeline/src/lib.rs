// SPDX-License-Identifier: PMPL-1.0-or-later
//
// lesewerk-pipeline — Document-to-text processing for Lesewerk.
//
// Turns a batch of heterogeneous inputs (raster images, multi-page PDFs) into
// an ordered sequence of per-page recognition jobs, runs them against a single
// lazily-initialised recognition engine, and reports per-job lifecycle and
// aggregate progress to an observer.

pub mod dispatch;
pub mod engine;
pub mod ledger;
pub mod renderer;
pub mod report;
pub mod runner;

// Re-export the primary types so callers can use `lesewerk_pipeline::Pipeline` etc.
pub use dispatch::{BatchDiagnostic, BatchReport, Pipeline};
pub use engine::{EngineInitializer, EngineProvider, RecognitionEngine};
pub use ledger::ResultLedger;
pub use renderer::{PageRenderer, RendererLoader, RendererProvider};
pub use report::{BatchPhase, EnginePhase, LogReporter, StatusReporter};

#[cfg(feature = "ocr")]
pub use engine::ocrs::OcrsRecognizer;

#[cfg(feature = "pdfium")]
pub use renderer::pdfium::PdfiumRenderer;
