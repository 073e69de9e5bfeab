// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for book-cover extraction.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::UNKNOWN_LANGUAGE;

/// Corner points of a fragment's bounding polygon, clockwise from top-left.
pub type Region = [[f32; 2]; 4];

/// One OCR-recognized text span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Engine-reported certainty in [0, 1].
    pub confidence: f32,
    #[serde(rename = "bbox")]
    pub region: Region,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, confidence: f32, region: Region) -> Self {
        Self {
            text: text.into(),
            confidence,
            region,
        }
    }

    /// Build a fragment from an axis-aligned rectangle.
    pub fn from_rect(
        text: impl Into<String>,
        confidence: f32,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    ) -> Self {
        Self::new(
            text,
            confidence,
            [[left, top], [right, top], [right, bottom], [left, bottom]],
        )
    }

    /// Vertical position used for ordering: the smallest y of the region.
    pub fn top(&self) -> f32 {
        self.region
            .iter()
            .map(|point| point[1])
            .fold(f32::INFINITY, f32::min)
    }
}

/// Where the cover image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// File extensions accepted by the upload layer.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

impl ImageSource {
    /// Whether a file name carries one of the supported raster extensions.
    pub fn is_supported_extension(file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => false,
        }
    }

    /// Short description for logging (never the raw bytes).
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(data) => format!("<{} bytes>", data.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

/// A single extraction invocation.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub image: ImageSource,
    /// Advisory only; recorded in logs but does not change recognition.
    pub language_hint: Option<String>,
}

impl ExtractionRequest {
    pub fn new(image: impl Into<ImageSource>) -> Self {
        Self {
            image: image.into(),
            language_hint: None,
        }
    }

    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = Some(hint.into());
        self
    }
}

/// Bibliographic fields attributed from a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub translator: String,
    pub publisher: String,
    pub language: String,
}

impl Default for BookInfo {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            translator: String::new(),
            publisher: String::new(),
            language: UNKNOWN_LANGUAGE.to_string(),
        }
    }
}

/// Outcome of one pipeline run. The pipeline never returns anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success {
        book_info: BookInfo,
        raw_fragments: Vec<TextFragment>,
        detected_language: String,
    },
    Failure {
        reason: String,
    },
}

impl ExtractionResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn book_info(&self) -> Option<&BookInfo> {
        match self {
            Self::Success { book_info, .. } => Some(book_info),
            Self::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }

    /// Flatten into the wire shape consumed by the upload and confirmation
    /// layers.
    pub fn to_payload(&self) -> OcrPayload {
        match self {
            Self::Success {
                book_info,
                raw_fragments,
                detected_language,
            } => OcrPayload {
                success: true,
                book_info: Some(book_info.clone()),
                raw_text: Some(raw_fragments.clone()),
                detected_language: Some(detected_language.clone()),
                error: None,
            },
            Self::Failure { reason } => OcrPayload {
                success: false,
                book_info: None,
                raw_text: None,
                detected_language: None,
                error: Some(reason.clone()),
            },
        }
    }
}

/// JSON shape of an extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_info: Option<BookInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<Vec<TextFragment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
