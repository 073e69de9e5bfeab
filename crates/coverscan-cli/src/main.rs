// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// coverscan — book-cover metadata extraction from the command line.
//
// Entry point. Initialises logging, loads configuration, builds the chosen
// OCR backend and runs one extraction.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, ExtractionRequest, ImageSource};
use coverscan_extract::{CoverExtractionPipeline, TextRecognizer};

use cli::{Backend, Cli};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ExtractionConfig::load(path)?,
        None => ExtractionConfig::default(),
    };

    if !ImageSource::is_supported_extension(&cli.image.to_string_lossy()) {
        tracing::warn!(
            image = %cli.image.display(),
            "unrecognized image extension; attempting to decode anyway"
        );
    }

    let recognizer = build_recognizer(&cli, &config)?;
    tracing::info!(backend = recognizer.name(), "coverscan starting");

    let pipeline = CoverExtractionPipeline::new(recognizer, config);
    let mut request = ExtractionRequest::new(ImageSource::Path(cli.image.clone()));
    if let Some(hint) = &cli.language {
        request = request.with_language_hint(hint.clone());
    }

    let result = pipeline.extract(&request);
    let payload = result.to_payload();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    println!("{json}");

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_recognizer(cli: &Cli, config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    match cli.backend {
        Backend::Tesseract => tesseract_recognizer(config),
        Backend::Ocrs => ocrs_recognizer(cli, config),
    }
}

#[cfg(feature = "tesseract")]
fn tesseract_recognizer(config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    let recognizer = coverscan_extract::TesseractRecognizer::from_config(config);
    if !recognizer.is_available() {
        return Err(CoverScanError::ModelUnavailable(
            "the `tesseract` executable was not found on PATH".into(),
        ));
    }
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract_recognizer(_config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    Err(CoverScanError::ModelUnavailable(
        "built without the `tesseract` feature".into(),
    ))
}

#[cfg(feature = "ocr")]
fn ocrs_recognizer(cli: &Cli, config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    use coverscan_extract::{OcrsConfig, OcrsRecognizer};

    let ocrs_config = match &cli.model_dir {
        Some(dir) => OcrsConfig::from_dir(dir),
        None => OcrsConfig::default(),
    }
    .with_line_confidence(config.ocrs_line_confidence);
    Ok(Arc::new(OcrsRecognizer::new(ocrs_config)?))
}

#[cfg(not(feature = "ocr"))]
fn ocrs_recognizer(_cli: &Cli, _config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    Err(CoverScanError::ModelUnavailable(
        "built without the `ocr` feature".into(),
    ))
}
