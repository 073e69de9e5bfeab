// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.
//
// Every tunable of the pipeline lives here so that widening the recognized
// alphabet set or the language-name table is a config change, not a code
// change.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoverScanError, Result};

/// Label reported when no language could be identified.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Tunables for a `CoverExtractionPipeline`.
///
/// Missing keys in a config file fall back to the defaults below, so a file
/// containing only `{"min_confidence": 0.5}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fragments must score strictly above this to survive filtering.
    pub min_confidence: f32,
    /// Unlabeled short fragments must score strictly above this to be taken
    /// as the author.
    pub author_fallback_confidence: f32,
    /// Maximum whitespace-separated tokens for the fallback author heuristic.
    pub author_fallback_max_tokens: usize,
    /// Combined text shorter than this (after trimming) is not classified.
    pub min_language_chars: usize,
    /// Gaussian sigma for noise suppression. 1.1 approximates a 5x5 kernel.
    pub blur_sigma: f32,
    /// Neighbourhood radius for adaptive thresholding (radius 5 = 11x11 block).
    pub threshold_block_radius: u32,
    /// Constant subtracted from the local mean before thresholding.
    pub threshold_offset: i32,
    /// Alphabets handed to the OCR backend (tesseract language packs).
    pub ocr_languages: Vec<String>,
    /// Confidence assigned to lines from backends that report none.
    pub ocrs_line_confidence: f32,
    /// Detected language code -> human-readable name.
    pub language_names: BTreeMap<String, String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            author_fallback_confidence: 0.7,
            author_fallback_max_tokens: 4,
            min_language_chars: 3,
            blur_sigma: 1.1,
            threshold_block_radius: 5,
            threshold_offset: 2,
            ocr_languages: vec!["eng".to_string()],
            ocrs_line_confidence: 0.9,
            language_names: default_language_names(),
        }
    }
}

impl ExtractionConfig {
    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config if the file exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("author_fallback_confidence", self.author_fallback_confidence),
            ("ocrs_line_confidence", self.ocrs_line_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoverScanError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.blur_sigma.is_nan() || self.blur_sigma <= 0.0 {
            return Err(CoverScanError::Config(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.threshold_block_radius == 0 {
            return Err(CoverScanError::Config(
                "threshold_block_radius must be at least 1".into(),
            ));
        }
        if self.ocr_languages.iter().all(|lang| lang.trim().is_empty()) {
            return Err(CoverScanError::Config(
                "ocr_languages must name at least one alphabet".into(),
            ));
        }
        Ok(())
    }

    /// Map a detector code to its display name, passing unknown codes through.
    pub fn language_name(&self, code: &str) -> String {
        self.language_names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

fn default_language_names() -> BTreeMap<String, String> {
    [
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("zh-cn", "Chinese"),
        ("zh", "Chinese"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}
