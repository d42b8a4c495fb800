// SPDX-License-Identifier: MIT
//
// Page selection validation.
//
// Callers hand over an already-tokenised set of 1-based page numbers (the
// raw "1,3,5-7" parsing happens upstream). This module deduplicates,
// clamps to the live document bounds, and orders the result.

use std::collections::BTreeSet;

use quire_core::error::{EngineError, Result};
use tracing::debug;

/// Validate a requested page selection against the current page count.
///
/// Duplicates collapse, values outside `[1, page_count]` are silently
/// dropped (a range like `5-100` on a 10-page document clamps to the real
/// last page rather than erroring), and the output is always ascending.
///
/// Fails with [`EngineError::InvalidPageRange`] only when nothing usable
/// remains.
pub fn validate_selection(requested: &[u32], page_count: u32) -> Result<Vec<u32>> {
    let valid: BTreeSet<u32> = requested
        .iter()
        .copied()
        .filter(|page| (1..=page_count).contains(page))
        .collect();

    if valid.is_empty() {
        return Err(EngineError::InvalidPageRange(format!(
            "none of the {} requested pages fall within 1..={}",
            requested.len(),
            page_count
        )));
    }

    let dropped = requested.len() - valid.len();
    if dropped > 0 {
        debug!(dropped, kept = valid.len(), "Selection clamped to document bounds");
    }

    Ok(valid.into_iter().collect())
}

/// The ascending set of pages NOT in `selection`, for a document with
/// `page_count` pages. `selection` must already be validated.
pub fn complement(selection: &[u32], page_count: u32) -> Vec<u32> {
    let chosen: BTreeSet<u32> = selection.iter().copied().collect();
    (1..=page_count).filter(|page| !chosen.contains(page)).collect()
}
