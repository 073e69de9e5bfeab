// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cover extraction orchestration.
//
// ## Pipeline
//
// 1. Decode the image source
// 2. Normalize (grayscale, blur, adaptive threshold), degrading to grayscale
// 3. Recognize text, degrading engine failure to "no text"
// 4. Drop fragments at or below the confidence threshold
// 5. No fragments left: `Failure("No text detected in image")`
// 6. Detect language, degrading to "unknown"
// 7. Attribute fields, degrading to an empty record
//
// Only step 1 can fail outright; a panic in steps 2-7 is reported as a
// `Processing` error. Whatever happens, callers get an `ExtractionResult` back.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, ExtractionRequest, ExtractionResult};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::attribute::FieldAttributor;
use crate::filter::filter_by_confidence;
use crate::language::LanguageDetector;
use crate::ocr::{TextRecognizer, recognize_or_empty};
use crate::preprocess::{ImagePreprocessor, decode};

/// Failure reason when nothing survives confidence filtering.
pub const NO_TEXT_DETECTED: &str = "No text detected in image";

/// Turns cover photos into [`ExtractionResult`]s.
///
/// Holds only read-only state, so one instance can serve many concurrent
/// requests; clone it (cheap, the recognizer is shared) or wrap it in an
/// `Arc`.
#[derive(Clone)]
pub struct CoverExtractionPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    preprocessor: ImagePreprocessor,
    detector: LanguageDetector,
    attributor: FieldAttributor,
    min_confidence: f32,
}

impl CoverExtractionPipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: ExtractionConfig) -> Self {
        Self {
            recognizer,
            preprocessor: ImagePreprocessor::from_config(&config),
            attributor: FieldAttributor::from_config(&config),
            min_confidence: config.min_confidence,
            detector: LanguageDetector::new(config),
        }
    }

    pub fn with_defaults(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self::new(recognizer, ExtractionConfig::default())
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Run the full extraction. Never fails: errors come back as
    /// `ExtractionResult::Failure`.
    #[instrument(skip_all, fields(
        source = %request.image.describe(),
        backend = self.recognizer.name(),
    ))]
    pub fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        if let Some(hint) = &request.language_hint {
            debug!(hint = %hint, "Language hint supplied (advisory)");
        }

        match self.try_extract(request) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Cover extraction failed");
                processing_failure(err)
            }
        }
    }

    fn try_extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let image = decode(&request.image)?;
        guard(|| self.extract_image(&image))
    }

    /// Run extraction on an already decoded image.
    pub fn extract_image(&self, image: &DynamicImage) -> ExtractionResult {
        let normalized = self.preprocessor.preprocess(image);

        let recognized = recognize_or_empty(self.recognizer.as_ref(), &normalized);
        let fragments = filter_by_confidence(recognized, self.min_confidence);
        if fragments.is_empty() {
            info!("No fragments survived confidence filtering");
            return ExtractionResult::failure(NO_TEXT_DETECTED);
        }

        let detected_language = self.detector.detect(&fragments);

        let mut book_info = self.attributor.attribute_or_default(&fragments);
        book_info.language = detected_language.clone();

        info!(
            fragments = fragments.len(),
            title = %book_info.title,
            language = %detected_language,
            "Cover extraction complete"
        );
        ExtractionResult::Success {
            book_info,
            raw_fragments: fragments,
            detected_language,
        }
    }
}

/// Run a pipeline stage, turning a panic into a `Processing` error.
fn guard<T>(stage: impl FnOnce() -> T) -> Result<T> {
    catch_unwind(AssertUnwindSafe(stage)).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|msg| msg.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        CoverScanError::Processing(format!("extraction panicked: {detail}"))
    })
}

fn processing_failure(err: impl std::fmt::Display) -> ExtractionResult {
    ExtractionResult::failure(format!("Processing failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::StaticRecognizer;
    use coverscan_core::{ImageSource, TextFragment};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn cover_png() -> Vec<u8> {
        let img = GrayImage::from_fn(60, 90, |_, y| {
            Luma([if (20..30).contains(&y) { 20u8 } else { 220u8 }])
        });
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        png
    }

    fn pipeline(fragments: Vec<TextFragment>) -> CoverExtractionPipeline {
        CoverExtractionPipeline::with_defaults(Arc::new(StaticRecognizer::new(fragments)))
    }

    fn request() -> ExtractionRequest {
        ExtractionRequest::new(ImageSource::Bytes(cover_png()))
    }

    #[test]
    fn moby_dick_end_to_end() {
        let result = pipeline(vec![
            TextFragment::from_rect("MOBY DICK", 0.95, 5.0, 10.0, 55.0, 20.0),
            TextFragment::from_rect("by Herman Melville", 0.88, 5.0, 40.0, 55.0, 48.0),
            TextFragment::from_rect("Published by Whale Press", 0.81, 5.0, 80.0, 55.0, 86.0),
        ])
        .extract(&request());

        let ExtractionResult::Success {
            book_info,
            raw_fragments,
            detected_language,
        } = result
        else {
            panic!("expected success");
        };
        assert_eq!(book_info.title, "MOBY DICK");
        assert_eq!(book_info.author, "Herman Melville");
        assert_eq!(book_info.publisher, "Whale Press");
        assert_eq!(book_info.translator, "");
        assert_eq!(book_info.language, detected_language);
        assert_eq!(detected_language, "English");
        assert_eq!(raw_fragments.len(), 3);
    }

    #[test]
    fn single_short_fragment() {
        let result = pipeline(vec![TextFragment::from_rect(
            "XYZ", 0.99, 0.0, 0.0, 30.0, 10.0,
        )])
        .extract(&request());

        let info = result.book_info().expect("success");
        assert_eq!(info.title, "XYZ");
        assert_eq!(info.author, "");
        assert_eq!(info.translator, "");
        assert_eq!(info.publisher, "");
        assert_eq!(info.language, "unknown");
        assert!(matches!(
            result,
            ExtractionResult::Success { ref detected_language, .. } if detected_language == "unknown"
        ));
    }

    #[test]
    fn raw_fragments_respect_threshold() {
        let result = pipeline(vec![
            TextFragment::from_rect("KEEP", 0.9, 0.0, 0.0, 10.0, 10.0),
            TextFragment::from_rect("drop", 0.3, 0.0, 20.0, 10.0, 30.0),
            TextFragment::from_rect("  also keep ", 0.31, 0.0, 40.0, 10.0, 50.0),
        ])
        .extract(&request());

        let ExtractionResult::Success { raw_fragments, .. } = result else {
            panic!("expected success");
        };
        let texts: Vec<&str> = raw_fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["KEEP", "also keep"]);
        assert!(raw_fragments.iter().all(|f| f.confidence > 0.3));
    }

    #[test]
    fn nothing_above_threshold_is_no_text_failure() {
        let result = pipeline(vec![TextFragment::from_rect(
            "smudge", 0.2, 0.0, 0.0, 10.0, 10.0,
        )])
        .extract(&request());
        assert_eq!(result, ExtractionResult::failure(NO_TEXT_DETECTED));
    }

    #[test]
    fn recognizer_error_is_no_text_failure() {
        struct Broken;
        impl TextRecognizer for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextFragment>> {
                Err(CoverScanError::Ocr("engine exploded".into()))
            }
        }

        let pipeline = CoverExtractionPipeline::with_defaults(Arc::new(Broken));
        assert_eq!(
            pipeline.extract(&request()),
            ExtractionResult::failure(NO_TEXT_DETECTED)
        );
    }

    #[test]
    fn undecodable_image_is_processing_failure() {
        let result = pipeline(vec![TextFragment::from_rect(
            "IGNORED", 0.9, 0.0, 0.0, 10.0, 10.0,
        )])
        .extract(&ExtractionRequest::new(ImageSource::Bytes(b"GIF89a-broken".to_vec())));

        let reason = result.reason().expect("failure");
        assert!(
            reason.starts_with("Processing failed: image decode failed"),
            "unexpected reason: {reason}"
        );
    }

    #[test]
    fn panicking_stage_is_processing_failure() {
        let err = guard(|| -> ExtractionResult { panic!("index out of bounds") }).unwrap_err();
        assert!(matches!(err, CoverScanError::Processing(_)));
        assert_eq!(
            processing_failure(err),
            ExtractionResult::failure("Processing failed: extraction panicked: index out of bounds")
        );
        assert_eq!(guard(|| 7).unwrap(), 7);
    }

    #[test]
    fn empty_image_degrades_to_grayscale_and_still_extracts() {
        let pipeline = pipeline(vec![TextFragment::from_rect(
            "TITLE", 0.9, 0.0, 0.0, 10.0, 10.0,
        )]);
        let result = pipeline.extract_image(&DynamicImage::ImageLuma8(GrayImage::new(0, 0)));
        assert_eq!(result.book_info().unwrap().title, "TITLE");
    }

    #[test]
    fn language_hint_does_not_change_result() {
        let pipeline = pipeline(vec![TextFragment::from_rect(
            "DUNE", 0.9, 0.0, 0.0, 10.0, 10.0,
        )]);
        let plain = pipeline.extract(&request());
        let hinted = pipeline.extract(&request().with_language_hint("ja"));
        assert_eq!(plain, hinted);
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoverExtractionPipeline>();

        let pipeline = pipeline(vec![
            TextFragment::from_rect("MOBY DICK", 0.95, 0.0, 0.0, 10.0, 10.0),
            TextFragment::from_rect("by Herman Melville", 0.88, 0.0, 20.0, 10.0, 30.0),
        ]);
        let png = cover_png();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pipeline = &pipeline;
                    let png = png.clone();
                    scope.spawn(move || {
                        pipeline.extract(&ExtractionRequest::new(ImageSource::Bytes(png)))
                    })
                })
                .collect();
            for handle in handles {
                let result = handle.join().unwrap();
                assert_eq!(result.book_info().unwrap().author, "Herman Melville");
            }
        });
    }
}
