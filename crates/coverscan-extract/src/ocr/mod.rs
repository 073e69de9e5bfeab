// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backends.
//
// Every backend turns a normalized cover image into positioned, scored text
// fragments. Backends are loaded once and shared read-only across requests,
// hence the `Send + Sync` bound and `&self` receivers.
//
// # Feature Gates
//
// - `ocr` — pure-Rust `ocrs` engine with `rten` models.
// - `tesseract` — the system `tesseract` executable (TSV output).
//
// `StaticRecognizer` is always available.

#[cfg(feature = "ocr")]
pub mod ocrs_backend;
#[cfg(feature = "tesseract")]
pub mod tesseract;

use std::panic::{AssertUnwindSafe, catch_unwind};

use coverscan_core::TextFragment;
use coverscan_core::error::{CoverScanError, Result};
use image::GrayImage;
use tracing::{info, warn};

#[cfg(feature = "ocr")]
pub use self::ocrs_backend::{OcrsConfig, OcrsRecognizer};
#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractRecognizer;

/// An OCR engine wrapped for cover extraction.
pub trait TextRecognizer: Send + Sync {
    /// Backend identifier for logs (e.g. "ocrs", "tesseract").
    fn name(&self) -> &'static str;

    /// Recognize every text span in a normalized image.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>>;
}

/// Run a recognizer, reporting any engine failure as "no text found".
///
/// Engine panics are caught here too: a third-party engine blowing up on one
/// cover must not take down a server handling many.
pub fn recognize_or_empty(recognizer: &dyn TextRecognizer, image: &GrayImage) -> Vec<TextFragment> {
    let outcome = catch_unwind(AssertUnwindSafe(|| recognizer.recognize(image)))
        .unwrap_or_else(|_| {
            Err(CoverScanError::Ocr(format!(
                "{} engine panicked",
                recognizer.name()
            )))
        });

    match outcome {
        Ok(fragments) => {
            info!(
                backend = recognizer.name(),
                fragments = fragments.len(),
                "Text recognition complete"
            );
            fragments
        }
        Err(err) => {
            warn!(backend = recognizer.name(), error = %err, "Text recognition failed; treating as no text");
            Vec::new()
        }
    }
}

/// Recognizer that replays a fixed set of fragments.
///
/// Useful when OCR has already happened elsewhere, and for exercising the
/// rest of the pipeline without model files.
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    fragments: Vec<TextFragment>,
}

impl StaticRecognizer {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }
}

impl TextRecognizer for StaticRecognizer {
    fn name(&self) -> &'static str {
        "static"
    }

    fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextFragment>> {
        Ok(self.fragments.clone())
    }
}
