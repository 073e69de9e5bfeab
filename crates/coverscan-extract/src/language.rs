// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Language identification over recognized cover text.
//
// Identification is statistical (trigram/alphabet profiles via `whatlang`)
// and fully deterministic: the same text always yields the same label.

use coverscan_core::config::UNKNOWN_LANGUAGE;
use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{ExtractionConfig, TextFragment};
use tracing::{debug, instrument, warn};
use whatlang::Lang;

/// Labels the dominant language of a set of fragments.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    config: ExtractionConfig,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl LanguageDetector {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Human-readable language name, or `"unknown"` when the text is too
    /// short or no language can be decided.
    #[instrument(skip_all, fields(fragments = fragments.len()))]
    pub fn detect(&self, fragments: &[TextFragment]) -> String {
        let combined = combine(fragments);
        if combined.trim().chars().count() < self.config.min_language_chars {
            debug!("Text too short for language identification");
            return UNKNOWN_LANGUAGE.to_string();
        }

        match identify(&combined) {
            Ok(code) => {
                let name = self.config.language_name(&code);
                debug!(code = %code, name = %name, "Language identified");
                name
            }
            Err(err) => {
                warn!(error = %err, "Language detection failed; reporting unknown");
                UNKNOWN_LANGUAGE.to_string()
            }
        }
    }
}

/// Fragment texts joined by single spaces, in input order.
fn combine(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identify `text` and return its ISO 639-1 code, or the ISO 639-3 code for
/// languages without a two-letter code.
fn identify(text: &str) -> Result<String> {
    let info = whatlang::detect(text)
        .ok_or_else(|| CoverScanError::Detection("no language profile matched".into()))?;
    if info.confidence() <= 0.0 {
        return Err(CoverScanError::Detection(format!(
            "no evidence for any language (best guess {})",
            info.lang().code()
        )));
    }
    if !info.is_reliable() {
        debug!(
            code = info.lang().code(),
            confidence = info.confidence(),
            "Taking low-confidence best guess"
        );
    }
    let lang = info.lang();
    Ok(iso_639_1(lang)
        .map(str::to_string)
        .unwrap_or_else(|| lang.code().to_string()))
}

fn iso_639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Pol => "pl",
        Lang::Nld => "nl",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Hun => "hu",
        Lang::Ron => "ro",
        Lang::Tur => "tr",
        Lang::Ell => "el",
        Lang::Heb => "he",
        Lang::Ara => "ar",
        Lang::Pes => "fa",
        Lang::Hin => "hi",
        Lang::Ben => "bn",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        Lang::Cat => "ca",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Bul => "bg",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Est => "et",
        Lang::Slv => "sl",
        _ => return None,
    };
    Some(code)
}
