// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Core domain types for the Lesewerk OCR intake pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LesewerkError, Result};

/// Page label used for whole-image jobs (documents use `p.<n>`).
pub const IMAGE_PAGE_LABEL: &str = "image";

/// Label for the `n`-th page of a paged document (1-based).
pub fn page_label(page_number: u32) -> String {
    format!("p.{page_number}")
}

/// Unique identifier for an OCR job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of an OCR job.
///
/// `Pending` is momentary — a job is transitioned to `Processing` in the same
/// step that makes it visible in the ledger. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Created, not yet submitted to the engine.
    Pending,
    /// Recognition call in flight.
    Processing,
    /// Recognition succeeded — see the job's text field.
    Done,
    /// Recognition failed — see the job's error field.
    Failed,
}

impl JobStatus {
    /// Whether this status admits no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Declared media kind of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// A single flat raster image (PNG, JPEG, ...).
    Image,
    /// A multi-page document that must be rasterised page by page.
    PagedDocument,
}

impl MediaKind {
    /// Classify by declared MIME type, falling back to a case-insensitive
    /// filename suffix match against `document_extensions` (without dots).
    /// Anything not recognised as a paged document is treated as an image.
    pub fn classify(
        media_type: Option<&str>,
        name: &str,
        document_extensions: &[String],
    ) -> Self {
        if media_type == Some("application/pdf") {
            return Self::PagedDocument;
        }
        let lower = name.to_ascii_lowercase();
        for ext in document_extensions {
            if lower.ends_with(&format!(".{}", ext.to_ascii_lowercase())) {
                return Self::PagedDocument;
            }
        }
        Self::Image
    }
}

/// Backing bytes of an input file — either already in memory (drag-drop
/// payloads) or on disk, read at dispatch time.
#[derive(Debug, Clone)]
pub enum FileBytes {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// One user-supplied input file. Immutable once read.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Provenance metadata, not interpreted beyond classification.
    pub name: String,
    /// Declared MIME type, if the source supplied one.
    pub media_type: Option<String>,
    pub bytes: FileBytes,
}

impl InputFile {
    pub fn from_memory(name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_owned),
            bytes: FileBytes::Memory(bytes),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            media_type: None,
            bytes: FileBytes::Path(path),
        }
    }

    /// Read the raw bytes of this file.
    ///
    /// A failure here is the per-file input-read error class: the batch
    /// surfaces it as a diagnostic and moves on to the next file.
    pub fn read(&self) -> Result<Vec<u8>> {
        match &self.bytes {
            FileBytes::Memory(data) => Ok(data.clone()),
            FileBytes::Path(path) => std::fs::read(path).map_err(|e| LesewerkError::InputRead {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// A single flat image payload ready for the recognition engine.
///
/// Produced either directly from an image input or by rasterising one page of
/// a paged document (then tagged with its 1-based page index).
#[derive(Debug, Clone)]
pub struct RecognitionSource {
    /// Encoded bitmap bytes (PNG, JPEG, ...).
    pub bytes: Vec<u8>,
    /// 1-based page index when rendered from a paged document.
    pub page_index: Option<u32>,
}

impl RecognitionSource {
    pub fn image(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            page_index: None,
        }
    }

    pub fn document_page(bytes: Vec<u8>, page_number: u32) -> Self {
        Self {
            bytes,
            page_index: Some(page_number),
        }
    }
}

/// One unit of recognition work — the result ledger's row.
///
/// Invariant: once the job leaves `Processing`, exactly one of `text`
/// (`Done`, possibly empty) or `error_message` (`Failed`) is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrJob {
    pub id: JobId,
    pub file_name: String,
    /// `"image"` or `"p.<n>"` — provenance only, never parsed back.
    pub page_label: String,
    pub status: JobStatus,
    /// Trimmed recognition output; meaningful only when `status == Done`.
    pub text: String,
    /// Human-readable failure; present only when `status == Failed`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OcrJob {
    pub fn new(file_name: impl Into<String>, page_label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            file_name: file_name.into(),
            page_label: page_label.into(),
            status: JobStatus::Pending,
            text: String::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition `Pending → Processing`.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Terminal transition to `Done` with trimmed recognition output.
    /// An empty string is a valid outcome, not an error.
    pub fn complete(&mut self, text: &str) {
        self.status = JobStatus::Done;
        self.text = text.trim().to_owned();
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Terminal transition to `Failed`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.text = String::new();
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_mime_type() {
        let exts = vec!["pdf".to_string()];
        assert_eq!(
            MediaKind::classify(Some("application/pdf"), "scan.bin", &exts),
            MediaKind::PagedDocument
        );
        assert_eq!(
            MediaKind::classify(Some("image/png"), "photo.png", &exts),
            MediaKind::Image
        );
    }

    #[test]
    fn classify_falls_back_to_extension() {
        let exts = vec!["pdf".to_string()];
        assert_eq!(
            MediaKind::classify(None, "Report.PDF", &exts),
            MediaKind::PagedDocument
        );
        assert_eq!(MediaKind::classify(None, "photo.jpeg", &exts), MediaKind::Image);
        // Unknown types default to image — the engine decides if it can decode.
        assert_eq!(MediaKind::classify(None, "mystery", &exts), MediaKind::Image);
    }

    #[test]
    fn page_labels() {
        assert_eq!(page_label(1), "p.1");
        assert_eq!(page_label(12), "p.12");
        assert_eq!(IMAGE_PAGE_LABEL, "image");
    }

    #[test]
    fn job_complete_trims_and_clears_error() {
        let mut job = OcrJob::new("a.png", IMAGE_PAGE_LABEL);
        job.start();
        job.complete("  hello world \n");
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.text, "hello world");
        assert!(job.error_message.is_none());
    }

    #[test]
    fn job_fail_clears_text() {
        let mut job = OcrJob::new("a.png", IMAGE_PAGE_LABEL);
        job.start();
        job.text = "partial".into();
        job.fail("engine exploded");
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.text.is_empty());
        assert_eq!(job.error_message.as_deref(), Some("engine exploded"));
    }

    #[test]
    fn empty_text_is_a_valid_done_outcome() {
        let mut job = OcrJob::new("blank.png", IMAGE_PAGE_LABEL);
        job.start();
        job.complete("   ");
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.text, "");
        assert!(job.error_message.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn job_roundtrips_through_json() {
        let mut job = OcrJob::new("report.pdf", page_label(3));
        job.start();
        job.complete("text");
        let json = serde_json::to_string(&job).expect("serialize");
        let back: OcrJob = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.id, job.id);
        assert_eq!(back.page_label, "p.3");
        assert_eq!(back.status, JobStatus::Done);
    }

    #[test]
    fn memory_file_reads_back() {
        let file = InputFile::from_memory("a.png", Some("image/png"), vec![1, 2, 3]);
        assert_eq!(file.read().expect("read"), vec![1, 2, 3]);
    }

    #[test]
    fn missing_path_read_is_an_input_read_error() {
        let file = InputFile::from_path("/nonexistent/lesewerk/input.png");
        let err = file.read().expect_err("should fail");
        assert!(matches!(err, LesewerkError::InputRead { .. }));
    }
}
