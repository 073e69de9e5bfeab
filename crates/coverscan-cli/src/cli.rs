// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Extract title, author, translator and publisher from a book-cover photo.
///
/// Prints the extraction result as JSON on stdout. Logs go to stderr and are
/// controlled with `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(name = "coverscan", version, about)]
pub struct Cli {
    /// Cover image (PNG, JPEG, GIF, BMP, TIFF or WEBP)
    pub image: PathBuf,

    /// Advisory language hint for the cover text
    #[arg(short, long)]
    pub language: Option<String>,

    /// JSON config file; defaults apply to any missing key
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// OCR backend
    #[arg(short, long, value_enum, default_value_t = Backend::Tesseract)]
    pub backend: Backend,

    /// Directory holding the ocrs detection and recognition models
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// System `tesseract` executable
    Tesseract,
    /// Pure-Rust `ocrs` engine
    Ocrs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "coverscan",
            "cover.jpg",
            "--language",
            "fr",
            "--backend",
            "ocrs",
            "--model-dir",
            "/models",
            "--pretty",
        ])
        .unwrap();
        assert_eq!(cli.image, PathBuf::from("cover.jpg"));
        assert_eq!(cli.language.as_deref(), Some("fr"));
        assert_eq!(cli.backend, Backend::Ocrs);
        assert_eq!(cli.model_dir, Some(PathBuf::from("/models")));
        assert!(cli.pretty);
    }

    #[test]
    fn defaults_to_tesseract() {
        let cli = Cli::try_parse_from(["coverscan", "cover.png"]).unwrap();
        assert_eq!(cli.backend, Backend::Tesseract);
        assert!(cli.config.is_none());
        assert!(!cli.pretty);
    }
}
