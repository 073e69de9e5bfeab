// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cover image normalization — decoding, grayscale conversion, noise
// suppression and adaptive binarization ahead of text recognition.

use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, ImageSource};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument, warn};

/// Decode a cover image from disk or memory.
///
/// This is the only image failure that reaches callers: a source that cannot
/// be decoded at all leaves nothing to fall back to.
#[instrument(skip_all, fields(source = %source.describe()))]
pub fn decode(source: &ImageSource) -> Result<DynamicImage> {
    let image = match source {
        ImageSource::Path(path) => image::open(path).map_err(|err| {
            CoverScanError::Decode(format!("failed to open {}: {}", path.display(), err))
        })?,
        ImageSource::Bytes(data) => image::load_from_memory(data).map_err(|err| {
            CoverScanError::Decode(format!("failed to decode {} bytes: {}", data.len(), err))
        })?,
    };
    info!(
        width = image.width(),
        height = image.height(),
        "Cover image decoded"
    );
    Ok(image)
}

/// Normalizes cover photos for recognition.
///
/// Book covers are photographed under uneven glare and shadow, so a global
/// threshold loses text in either the bright or the dark half. The pipeline
/// is grayscale, Gaussian blur, then a Gaussian-weighted local-mean threshold.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    blur_sigma: f32,
    block_radius: u32,
    offset: i32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ImagePreprocessor {
    pub fn new(blur_sigma: f32, block_radius: u32, offset: i32) -> Self {
        Self {
            blur_sigma,
            block_radius,
            offset,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.blur_sigma,
            config.threshold_block_radius,
            config.threshold_offset,
        )
    }

    /// Normalize an image, degrading to plain grayscale if any step fails.
    pub fn preprocess(&self, image: &DynamicImage) -> GrayImage {
        match self.try_preprocess(image) {
            Ok(binary) => binary,
            Err(err) => {
                warn!(error = %err, "Preprocessing failed; falling back to grayscale");
                image.to_luma8()
            }
        }
    }

    /// Run the full normalization, reporting the first failing step.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn try_preprocess(&self, image: &DynamicImage) -> Result<GrayImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(CoverScanError::Preprocess(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if self.blur_sigma.is_nan() || self.blur_sigma <= 0.0 {
            return Err(CoverScanError::Preprocess(format!(
                "blur sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.block_radius == 0 {
            return Err(CoverScanError::Preprocess(
                "threshold block radius must be at least 1".into(),
            ));
        }

        // Step 1: Grayscale conversion.
        let gray = image.to_luma8();

        // Step 2: Noise suppression.
        let blurred = gaussian_blur_f32(&gray, self.blur_sigma);
        debug!(sigma = self.blur_sigma, "Applied Gaussian blur");

        // Step 3: Gaussian-weighted local-mean binarization.
        let binary = adaptive_threshold(&blurred, self.block_radius, self.offset);
        info!(
            block_radius = self.block_radius,
            offset = self.offset,
            "Cover image normalized"
        );
        Ok(binary)
    }
}

/// Binarize against a Gaussian-weighted mean of each pixel's neighbourhood.
///
/// A pixel becomes white when it is brighter than the local mean minus
/// `offset`, black otherwise. The weighting is a Gaussian whose sigma follows
/// the block size `2 * block_radius + 1` (see [`local_mean_sigma`]), so a
/// radius of 5 weights an 11x11 block.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, local_mean_sigma(block_radius));

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = i32::from(gray.get_pixel(x, y).0[0]);
        let threshold = i32::from(local_mean.get_pixel(x, y).0[0]) - offset;
        Luma([if value > threshold { 255u8 } else { 0u8 }])
    })
}

/// Gaussian sigma for a square block of side `2 * block_radius + 1`.
///
/// Same rule OpenCV uses when it derives a sigma from a kernel size:
/// `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
pub fn local_mean_sigma(block_radius: u32) -> f32 {
    0.3 * (block_radius as f32 - 1.0) + 0.8
}
