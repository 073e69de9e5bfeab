// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for coverscan.

use thiserror::Error;

/// Top-level error type for all coverscan operations.
///
/// Most variants never leave the extraction pipeline: preprocessing,
/// detection and attribution failures are absorbed into defaults at their
/// stage boundary. Only decode and unclassified failures surface to callers,
/// and then only as the `reason` of an `ExtractionResult::Failure`.
#[derive(Debug, Error)]
pub enum CoverScanError {
    // -- Image errors --
    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image preprocessing failed: {0}")]
    Preprocess(String),

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("OCR model unavailable: {0}")]
    ModelUnavailable(String),

    // -- Interpretation errors --
    #[error("language detection failed: {0}")]
    Detection(String),

    #[error("field attribution failed: {0}")]
    Attribution(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Processing(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CoverScanError>;
