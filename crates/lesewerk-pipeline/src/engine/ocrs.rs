// SPDX-License-Identifier: PMPL-1.0-or-later
//
// ocrs-backed recognition engine.
//
// Pure-Rust OCR via the `ocrs` crate, backed by neural network models
// executed through `rten`. Requires two model files per candidate source:
//
// - `text-detection.rten` — locates text regions in the image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// Models land in `~/.cache/ocrs` after running `ocrs-cli` once, or can be
// fetched from <https://github.com/robertknight/ocrs-models/releases>.
//
// NOTE: `ocrs` and `rten` must be compiled in release mode; debug builds are
// 10-100x slower.

use std::sync::Arc;

use image::Rgb;
use lesewerk_core::config::{EngineSource, PipelineConfig};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::RecognitionSource;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use super::{EngineProvider, ProgressFn, RecognitionEngine};

/// Recognition engine backed by ocrs detection + recognition models.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
}

impl OcrsRecognizer {
    /// Load both models from one candidate source and build the engine.
    ///
    /// Model loading is the expensive step — the initializer caches the
    /// constructed engine for the process lifetime.
    #[instrument(skip_all, fields(
        detection = %source.detection_model.display(),
        recognition = %source.recognition_model.display(),
    ))]
    pub fn new(source: &EngineSource) -> Result<Self> {
        if !source.detection_model.exists() {
            return Err(LesewerkError::EngineInit(format!(
                "detection model not found at {}",
                source.detection_model.display()
            )));
        }
        if !source.recognition_model.exists() {
            return Err(LesewerkError::EngineInit(format!(
                "recognition model not found at {}",
                source.recognition_model.display()
            )));
        }

        info!("loading OCR detection model");
        let detection_model = Model::load_file(&source.detection_model).map_err(|err| {
            LesewerkError::EngineInit(format!(
                "failed to load detection model from {}: {}",
                source.detection_model.display(),
                err
            ))
        })?;

        info!("loading OCR recognition model");
        let recognition_model = Model::load_file(&source.recognition_model).map_err(|err| {
            LesewerkError::EngineInit(format!(
                "failed to load recognition model from {}: {}",
                source.recognition_model.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            LesewerkError::EngineInit(format!("failed to construct OCR engine: {err}"))
        })?;

        Ok(Self { engine })
    }
}

impl RecognitionEngine for OcrsRecognizer {
    /// Warm-up pass over a tiny blank image. Verifies the model pair can
    /// actually run end-to-end before the handle is considered ready.
    fn initialize(&self) -> Result<()> {
        let blank = image::RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        let source = ImageSource::from_bytes(blank.as_raw(), blank.dimensions())
            .map_err(|err| LesewerkError::EngineInit(format!("warm-up input failed: {err}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| LesewerkError::EngineInit(format!("warm-up preprocessing failed: {err}")))?;
        self.engine
            .get_text(&input)
            .map_err(|err| LesewerkError::EngineInit(format!("warm-up recognition failed: {err}")))?;
        debug!("OCR engine warm-up complete");
        Ok(())
    }

    fn recognize(&self, source: &RecognitionSource, progress: &ProgressFn) -> Result<String> {
        let img = image::load_from_memory(&source.bytes)
            .map_err(|err| LesewerkError::ImageDecode(err.to_string()))?;

        // Convert to RGB8 — the format expected by ocrs.
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let ocr_source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            LesewerkError::Recognition(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;

        let input = self
            .engine
            .prepare_input(ocr_source)
            .map_err(|err| LesewerkError::Recognition(format!("preprocessing failed: {err}")))?;
        progress(0.0);

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| LesewerkError::Recognition(format!("word detection failed: {err}")))?;
        progress(0.4);

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        progress(0.6);

        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| LesewerkError::Recognition(format!("line recognition failed: {err}")))?;
        progress(1.0);

        let mut lines = Vec::with_capacity(line_texts.len());
        for line in line_texts.iter().flatten() {
            let text = line.to_string();
            if text.trim().is_empty() {
                continue;
            }
            lines.push(text);
        }

        debug!(
            width,
            height,
            line_count = lines.len(),
            "recognition complete"
        );
        Ok(lines.join("\n"))
    }
}

/// One candidate model-source, tried by the engine initializer in order.
pub struct OcrsProvider {
    source: EngineSource,
}

impl OcrsProvider {
    pub fn new(source: EngineSource) -> Self {
        Self { source }
    }
}

impl EngineProvider for OcrsProvider {
    fn describe(&self) -> String {
        format!(
            "ocrs models at {} / {}",
            self.source.detection_model.display(),
            self.source.recognition_model.display()
        )
    }

    fn construct(&self) -> Result<Arc<dyn RecognitionEngine>> {
        Ok(Arc::new(OcrsRecognizer::new(&self.source)?))
    }
}

/// Build the provider list from the configured candidate sources.
pub fn providers_from_config(config: &PipelineConfig) -> Vec<Box<dyn EngineProvider>> {
    config
        .engine_sources
        .iter()
        .cloned()
        .map(|source| Box::new(OcrsProvider::new(source)) as Box<dyn EngineProvider>)
        .collect()
}
