// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust recognition backend built on the `ocrs` crate, with neural
// network models executed via `rten`.
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where `OcrsConfig::default()` looks.
//
// `ocrs` does not publish a per-line probability, so every recognized line is
// scored with the configured `ocrs_line_confidence`. Field attribution then
// falls back to vertical position for ordering, which suits covers: the title
// is usually the topmost line.

use std::path::{Path, PathBuf};

use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, TextFragment};
use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use super::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Model locations and scoring for [`OcrsRecognizer`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    /// Confidence reported for every recognized line.
    pub line_confidence: f32,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    /// Expects `dir` to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            line_confidence: ExtractionConfig::default().ocrs_line_confidence,
        }
    }

    pub fn with_line_confidence(mut self, confidence: f32) -> Self {
        self.line_confidence = confidence;
        self
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(CoverScanError::ModelUnavailable(format!(
                    "{} not found; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// `ocrs`-backed recognizer. Model loading is the expensive step, so build
/// one and share it.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
    line_confidence: f32,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            CoverScanError::ModelUnavailable(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                CoverScanError::ModelUnavailable(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| CoverScanError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self {
            engine,
            line_confidence: config.line_confidence,
        })
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrsConfig::from_dir(dir))
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>> {
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            CoverScanError::Ocr(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| CoverScanError::Ocr(format!("OCR input preparation failed: {err}")))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| CoverScanError::Ocr(format!("word detection failed: {err}")))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(line_count = line_rects.len(), "Text lines found");

        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| CoverScanError::Ocr(format!("line recognition failed: {err}")))?;

        let fragments: Vec<TextFragment> = lines
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                Some(TextFragment::from_rect(
                    text,
                    self.line_confidence,
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.right() as f32,
                    rect.bottom() as f32,
                ))
            })
            .collect();

        Ok(fragments)
    }
}
