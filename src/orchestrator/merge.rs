//! Merge, interleave, and deduplicate result streams across providers.
//!
//! Compact layouts show one combined list instead of per-provider columns.
//! Streams are interleaved round-robin by rank so no provider dominates
//! the visible prefix, then deduplicated by canonical URL with the first
//! occurrence winning.

use std::collections::HashSet;

use crate::types::{ProviderResponse, SearchResult};

use super::url_normalize::dedup_key;

/// A combined cross-provider view of one page's responses.
#[derive(Debug, Clone)]
pub struct MergedView {
    /// Interleaved, deduplicated results.
    pub results: Vec<SearchResult>,
    /// True if any constituent provider has more pages.
    pub has_more: bool,
    /// Sum of constituent counts before deduplication — a display
    /// approximation, not an exact post-dedup count.
    pub total_results: usize,
}

/// Round-robin merge of ordered streams.
///
/// Takes index 0 from each stream in the given order, then index 1, and
/// so on, skipping streams shorter than the current rank. Each stream's
/// internal order is preserved.
pub fn interleave<T>(streams: Vec<Vec<T>>) -> Vec<T> {
    let longest = streams.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(streams.iter().map(Vec::len).sum());
    let mut iters: Vec<std::vec::IntoIter<T>> = streams.into_iter().map(Vec::into_iter).collect();

    for _ in 0..longest {
        for iter in &mut iters {
            if let Some(item) = iter.next() {
                out.push(item);
            }
        }
    }
    out
}

/// Stable dedup by canonical URL; the first occurrence wins.
///
/// Idempotent: deduping an already-deduped sequence is a no-op.
pub fn dedupe(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|result| seen.insert(dedup_key(&result.url)))
        .collect()
}

/// Combine provider responses, in priority order, into one merged view.
///
/// Failed slots contribute nothing (their `results` are empty and their
/// `has_more` false), so a partial upstream failure degrades the merged
/// view rather than erroring it.
pub fn merge_responses(responses: &[&ProviderResponse]) -> MergedView {
    let total_results = responses.iter().map(|r| r.results.len()).sum();
    let has_more = responses.iter().any(|r| r.has_more);
    let streams: Vec<Vec<SearchResult>> =
        responses.iter().map(|r| r.results.clone()).collect();

    MergedView {
        results: dedupe(interleave(streams)),
        has_more,
        total_results,
    }
}
