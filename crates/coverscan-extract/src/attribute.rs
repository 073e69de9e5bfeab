// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field attribution — turns an unordered bag of cover fragments into title,
// author, translator and publisher.
//
// ## Algorithm
//
// 1. Order fragments by confidence (descending), then by the top of their
//    region (ascending).
// 2. The first fragment is the title and takes no further part.
// 3. Every other fragment, in order, is tried against the label rules
//    (author, translator, publisher). Each field keeps its first match.
// 4. Still on the same fragment, if no author has been found yet and the
//    fragment is short and confidently read, its whole text becomes the
//    author. This runs even when the fragment just matched a translator or
//    publisher label.

use std::cmp::Ordering;
use std::sync::LazyLock;

use coverscan_core::error::{CoverScanError, Result};
use coverscan_core::{BookInfo, ExtractionConfig, TextFragment};
use regex::Regex;
use tracing::{debug, instrument, warn};

/// Bibliographic roles a fragment can be attributed to by a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Translator,
    Publisher,
}

impl Field {
    fn slot(self, info: &mut BookInfo) -> &mut String {
        match self {
            Field::Author => &mut info.author,
            Field::Translator => &mut info.translator,
            Field::Publisher => &mut info.publisher,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::Translator => "translator",
            Field::Publisher => "publisher",
        }
    }
}

/// Label patterns per field, evaluated in this order. Group 1 is the value.
static FIELD_RULES: LazyLock<Vec<(Field, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("valid field pattern"))
            .collect()
    };
    vec![
        (
            Field::Author,
            compile(&[r"^by\s+(.+)$", r"^(.+)\s+author$", r"written\s+by\s+(.+)$"]),
        ),
        (
            Field::Translator,
            compile(&[
                r"translated\s+by\s+(.+)$",
                r"translator:\s*(.+)$",
                r"trans\.\s+(.+)$",
            ]),
        ),
        (
            Field::Publisher,
            compile(&[r"published\s+by\s+(.+)$", r"publisher:\s*(.+)$"]),
        ),
    ]
});

/// Rule-based classifier from fragments to a [`BookInfo`].
///
/// The returned `BookInfo.language` is left at its default; the pipeline
/// fills it from language detection.
#[derive(Debug, Clone)]
pub struct FieldAttributor {
    fallback_confidence: f32,
    fallback_max_tokens: usize,
}

impl Default for FieldAttributor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldAttributor {
    pub fn new(fallback_confidence: f32, fallback_max_tokens: usize) -> Self {
        Self {
            fallback_confidence,
            fallback_max_tokens,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.author_fallback_confidence,
            config.author_fallback_max_tokens,
        )
    }

    /// Attribute fields, degrading any failure to an all-empty record.
    pub fn attribute_or_default(&self, fragments: &[TextFragment]) -> BookInfo {
        self.attribute(fragments).unwrap_or_else(|err| {
            warn!(error = %err, "Field attribution failed; returning empty record");
            BookInfo::default()
        })
    }

    /// Attribute fields from fragments.
    ///
    /// Fails only when the fragments cannot be ordered (a NaN confidence).
    #[instrument(skip_all, fields(fragments = fragments.len()))]
    pub fn attribute(&self, fragments: &[TextFragment]) -> Result<BookInfo> {
        let sorted = sort_fragments(fragments)?;
        let mut info = BookInfo::default();

        let Some((title, rest)) = sorted.split_first() else {
            return Ok(info);
        };
        info.title = title.text.trim().to_string();
        debug!(title = %info.title, "Title assigned");

        for fragment in rest {
            let text = fragment.text.trim();

            for (field, patterns) in FIELD_RULES.iter() {
                if !field.slot(&mut info).is_empty() {
                    continue;
                }
                if let Some(value) = first_capture(patterns, text) {
                    debug!(field = field.as_str(), value = %value, "Label matched");
                    *field.slot(&mut info) = value;
                }
            }

            if info.author.is_empty()
                && text.split_whitespace().count() <= self.fallback_max_tokens
                && fragment.confidence > self.fallback_confidence
            {
                debug!(author = %text, "Short confident fragment taken as author");
                info.author = text.to_string();
            }
        }

        Ok(info)
    }
}

/// Order by confidence descending, then vertical position ascending.
pub fn sort_fragments(fragments: &[TextFragment]) -> Result<Vec<&TextFragment>> {
    if let Some(bad) = fragments.iter().find(|f| f.confidence.is_nan()) {
        return Err(CoverScanError::Attribution(format!(
            "fragment {:?} has no usable confidence",
            bad.text
        )));
    }
    let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.top().total_cmp(&b.top()))
    });
    Ok(sorted)
}

/// The trimmed group 1 of the first pattern matching `text`.
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let value = pattern.captures(text)?.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, confidence: f32, top: f32) -> TextFragment {
        TextFragment::from_rect(text, confidence, 0.0, top, 300.0, top + 20.0)
    }

    fn attribute(fragments: &[TextFragment]) -> BookInfo {
        FieldAttributor::default().attribute(fragments).unwrap()
    }

    #[test]
    fn empty_input_gives_empty_record() {
        let info = attribute(&[]);
        assert_eq!(info, BookInfo::default());
    }

    #[test]
    fn title_is_most_confident_fragment() {
        let info = attribute(&[
            fragment("a small subtitle line here", 0.6, 10.0),
            fragment("  THE TRIAL  ", 0.97, 200.0),
        ]);
        assert_eq!(info.title, "THE TRIAL");
    }

    #[test]
    fn position_breaks_confidence_ties() {
        let input = [
            fragment("lower", 0.8, 300.0),
            fragment("upper", 0.8, 20.0),
            fragment("best", 0.9, 500.0),
        ];
        let sorted = sort_fragments(&input).unwrap();
        let texts: Vec<&str> = sorted.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["best", "upper", "lower"]);
    }

    #[test]
    fn moby_dick_cover() {
        let info = attribute(&[
            fragment("Published by Whale Press", 0.81, 800.0),
            fragment("MOBY DICK", 0.95, 50.0),
            fragment("by Herman Melville", 0.88, 400.0),
        ]);
        assert_eq!(info.title, "MOBY DICK");
        assert_eq!(info.author, "Herman Melville");
        assert_eq!(info.publisher, "Whale Press");
        assert_eq!(info.translator, "");
        assert_eq!(info.language, "unknown");
    }

    #[test]
    fn labels_are_case_insensitive_and_keep_original_case() {
        let info = attribute(&[
            fragment("WAR AND PEACE", 0.99, 0.0),
            fragment("BY Jane Doe", 0.5, 100.0),
            fragment("Translated by John Smith", 0.5, 200.0),
            fragment("Publisher: Acme Press", 0.5, 300.0),
        ]);
        assert_eq!(info.author, "Jane Doe");
        assert_eq!(info.translator, "John Smith");
        assert_eq!(info.publisher, "Acme Press");
    }

    #[test]
    fn alternative_label_forms() {
        let info = attribute(&[
            fragment("TITLE", 0.99, 0.0),
            fragment("Leo Tolstoy author", 0.5, 100.0),
            fragment("trans. Louise Maude", 0.5, 200.0),
            fragment("publisher:Oxford", 0.5, 300.0),
        ]);
        assert_eq!(info.author, "Leo Tolstoy");
        assert_eq!(info.translator, "Louise Maude");
        assert_eq!(info.publisher, "Oxford");

        let info = attribute(&[
            fragment("TITLE", 0.99, 0.0),
            fragment("a novel written by Ann Patchett", 0.5, 100.0),
            fragment("translator: Edith Grossman", 0.5, 200.0),
        ]);
        assert_eq!(info.author, "Ann Patchett");
        assert_eq!(info.translator, "Edith Grossman");
    }

    #[test]
    fn first_match_wins_per_field() {
        let info = attribute(&[
            fragment("TITLE", 0.99, 0.0),
            fragment("by First Author", 0.6, 100.0),
            fragment("by Second Author", 0.5, 200.0),
            fragment("Published by Early House", 0.45, 300.0),
            fragment("Published by Late House", 0.4, 400.0),
        ]);
        assert_eq!(info.author, "First Author");
        assert_eq!(info.publisher, "Early House");
    }

    #[test]
    fn title_fragment_is_never_matched_against_labels() {
        let info = attribute(&[fragment("by Herman Melville", 0.99, 0.0)]);
        assert_eq!(info.title, "by Herman Melville");
        assert_eq!(info.author, "");
    }

    #[test]
    fn fallback_author_for_short_confident_fragment() {
        let info = attribute(&[
            fragment("BELOVED", 0.98, 0.0),
            fragment("Toni Morrison", 0.9, 400.0),
        ]);
        assert_eq!(info.author, "Toni Morrison");
    }

    #[test]
    fn fallback_author_requires_confidence_and_brevity() {
        let info = attribute(&[
            fragment("BELOVED", 0.98, 0.0),
            fragment("Toni Morrison", 0.7, 400.0),
            fragment("a novel of the american south and beyond", 0.95, 500.0),
        ]);
        assert_eq!(info.author, "");
    }

    #[test]
    fn fallback_fires_on_labeled_fragments_too() {
        // The translator line is short and confident, so with no author yet it
        // also lands in the author field.
        let info = attribute(&[
            fragment("THE TRIAL", 0.98, 0.0),
            fragment("Translated by Willa Muir", 0.9, 300.0),
        ]);
        assert_eq!(info.translator, "Willa Muir");
        assert_eq!(info.author, "Translated by Willa Muir");
    }

    #[test]
    fn fallback_can_preempt_a_later_label() {
        let info = attribute(&[
            fragment("THE TRIAL", 0.98, 0.0),
            fragment("Penguin Classics", 0.9, 600.0),
            fragment("by Franz Kafka", 0.8, 300.0),
        ]);
        assert_eq!(info.author, "Penguin Classics");
    }

    #[test]
    fn nan_confidence_fails_and_degrades() {
        let fragments = [
            fragment("TITLE", 0.9, 0.0),
            fragment("noise", f32::NAN, 10.0),
        ];
        let attributor = FieldAttributor::default();
        assert!(matches!(
            attributor.attribute(&fragments),
            Err(CoverScanError::Attribution(_))
        ));
        assert_eq!(attributor.attribute_or_default(&fragments), BookInfo::default());
    }

    #[test]
    fn thresholds_follow_config() {
        let attributor = FieldAttributor::new(0.5, 1);
        let info = attributor
            .attribute(&[fragment("EMMA", 0.99, 0.0), fragment("Austen", 0.6, 100.0)])
            .unwrap();
        assert_eq!(info.author, "Austen");

        let info = attributor
            .attribute(&[
                fragment("EMMA", 0.99, 0.0),
                fragment("Jane Austen", 0.6, 100.0),
            ])
            .unwrap();
        assert_eq!(info.author, "");
    }
}
