// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition backend driving the system `tesseract` executable.
//
// The normalized image is written to a temporary PNG and recognized in
// sparse-text mode (`--psm 11`), which suits covers: a few scattered blocks
// rather than paragraphs. TSV output carries per-word boxes and confidences;
// words are regrouped into lines here.

use std::path::PathBuf;
use std::process::Command;

use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, TextFragment};
use image::{GrayImage, ImageFormat};
use tracing::{debug, instrument};

use super::TextRecognizer;

/// TSV `level` value for word rows.
const WORD_LEVEL: &str = "5";

/// Recognizer that shells out to `tesseract`.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    /// Language packs joined with `+`, e.g. `eng+fra`.
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(languages: &[String]) -> Self {
        let languages = languages
            .iter()
            .map(|lang| lang.trim())
            .filter(|lang| !lang.is_empty())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            binary: PathBuf::from("tesseract"),
            languages,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(&config.ocr_languages)
    }

    /// Use a specific executable instead of `tesseract` on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    /// Whether the executable can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), languages = %self.languages))]
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>> {
        let input = tempfile::Builder::new()
            .prefix("coverscan-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|err| CoverScanError::Ocr(format!("failed to stage image: {err}")))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg("11")
            .arg("tsv")
            .output()
            .map_err(|err| {
                CoverScanError::Ocr(format!(
                    "failed to run {}: {}",
                    self.binary.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoverScanError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let fragments = parse_tsv(&tsv);
        debug!(lines = fragments.len(), "Parsed tesseract TSV output");
        Ok(fragments)
    }
}

#[derive(Debug)]
struct LineAccumulator {
    key: (u32, u32, u32, u32),
    words: Vec<String>,
    confidence_sum: f32,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

/// Group word rows of tesseract TSV output into line fragments.
///
/// Lines keep the order tesseract reports them in. A line's confidence is the
/// mean of its words' confidences rescaled to [0, 1]; its region is the union
/// of the word boxes.
pub fn parse_tsv(tsv: &str) -> Vec<TextFragment> {
    let mut lines: Vec<LineAccumulator> = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let Some(key) = parse_key(&cols[1..5]) else {
            continue;
        };
        let (Some(left), Some(top), Some(width), Some(height), Some(conf)) = (
            parse_f32(cols[6]),
            parse_f32(cols[7]),
            parse_f32(cols[8]),
            parse_f32(cols[9]),
            parse_f32(cols[10]),
        ) else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        let (right, bottom) = (left + width, top + height);
        match lines.iter_mut().find(|line| line.key == key) {
            Some(line) => {
                line.words.push(text.to_string());
                line.confidence_sum += conf;
                line.left = line.left.min(left);
                line.top = line.top.min(top);
                line.right = line.right.max(right);
                line.bottom = line.bottom.max(bottom);
            }
            None => lines.push(LineAccumulator {
                key,
                words: vec![text.to_string()],
                confidence_sum: conf,
                left,
                top,
                right,
                bottom,
            }),
        }
    }

    lines
        .into_iter()
        .map(|line| {
            let confidence = (line.confidence_sum / line.words.len() as f32 / 100.0).clamp(0.0, 1.0);
            TextFragment::from_rect(
                line.words.join(" "),
                confidence,
                line.left,
                line.top,
                line.right,
                line.bottom,
            )
        })
        .collect()
}

fn parse_key(cols: &[&str]) -> Option<(u32, u32, u32, u32)> {
    Some((
        cols.first()?.trim().parse().ok()?,
        cols.get(1)?.trim().parse().ok()?,
        cols.get(2)?.trim().parse().ok()?,
        cols.get(3)?.trim().parse().ok()?,
    ))
}

fn parse_f32(col: &str) -> Option<f32> {
    col.trim().parse().ok()
}
