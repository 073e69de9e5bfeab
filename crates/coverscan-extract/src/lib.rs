// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// coverscan-extract — Bibliographic metadata extraction from book-cover photos.
//
// Provides image normalization (grayscale, blur, adaptive binarization), text
// recognition behind a pluggable backend, confidence filtering, language
// identification, and the rule-based field attribution that turns recognized
// fragments into a structured book record.

pub mod attribute;
pub mod filter;
pub mod language;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;

// Re-export the primary types so callers can use `coverscan_extract::CoverExtractionPipeline` etc.
pub use attribute::FieldAttributor;
pub use filter::filter_by_confidence;
pub use language::LanguageDetector;
pub use ocr::{StaticRecognizer, TextRecognizer};
pub use pipeline::CoverExtractionPipeline;
pub use preprocess::ImagePreprocessor;

#[cfg(feature = "ocr")]
pub use ocr::{OcrsConfig, OcrsRecognizer};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
