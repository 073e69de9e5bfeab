// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confidence filtering of recognized fragments.

use coverscan_core::TextFragment;
use tracing::debug;

/// Keep fragments scoring strictly above `min_confidence`, in input order,
/// with surrounding whitespace trimmed from their text.
pub fn filter_by_confidence(fragments: Vec<TextFragment>, min_confidence: f32) -> Vec<TextFragment> {
    let before = fragments.len();
    let kept: Vec<TextFragment> = fragments
        .into_iter()
        .filter(|fragment| fragment.confidence > min_confidence)
        .map(|fragment| TextFragment {
            text: fragment.text.trim().to_string(),
            ..fragment
        })
        .collect();
    debug!(
        before,
        after = kept.len(),
        min_confidence,
        "Confidence filter applied"
    );
    kept
}
