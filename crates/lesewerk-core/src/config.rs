// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Well-known filenames for the detection and recognition models.
pub const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
pub const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// One candidate location for the recognition engine's model pair.
///
/// Candidates are tried in priority order; the first pair that loads and
/// initialises becomes the process-lifetime engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSource {
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
}

impl EngineSource {
    /// Candidate pointing at a directory containing the well-known model
    /// filenames.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            detection_model: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }
}

/// Settings for the OCR intake pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ordered engine model-source candidates (first success wins).
    pub engine_sources: Vec<EngineSource>,
    /// Ordered candidate directories for the PDF renderer library
    /// (first success wins; all failing only disables document inputs).
    pub renderer_library_dirs: Vec<PathBuf>,
    /// Fixed scale factor applied when rasterising document pages.
    pub render_scale: f32,
    /// Filename extensions (without dots) classified as paged documents.
    pub document_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine_sources: vec![
                EngineSource::from_dir(default_model_dir()),
                EngineSource::from_dir("vendor/ocrs"),
            ],
            renderer_library_dirs: vec![PathBuf::from("vendor/pdfium")],
            render_scale: 1.5,
            document_extensions: vec!["pdf".to_string()],
        }
    }
}

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_fallback_candidates() {
        let config = PipelineConfig::default();
        assert!(config.engine_sources.len() >= 2);
        assert!((config.render_scale - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.document_extensions, vec!["pdf"]);
    }

    #[test]
    fn engine_source_from_dir_uses_well_known_names() {
        let source = EngineSource::from_dir("/tmp/models");
        assert_eq!(
            source.detection_model,
            PathBuf::from("/tmp/models/text-detection.rten")
        );
        assert_eq!(
            source.recognition_model,
            PathBuf::from("/tmp/models/text-recognition.rten")
        );
    }
}
