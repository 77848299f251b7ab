//! Candidate deduplication and ordering.

use std::collections::HashSet;

use crate::store::SearchHit;

/// Characters of chunk text that identify a duplicate together with its source.
pub const DEDUP_PREFIX_CHARS: usize = 100;

/// Identity of a hit for deduplication: source plus the text prefix.
#[must_use]
pub fn dedup_key(hit: &SearchHit) -> (String, String) {
    (
        hit.source.clone(),
        hit.text.chars().take(DEDUP_PREFIX_CHARS).collect(),
    )
}

/// Drop duplicate candidates (first occurrence wins) and order the rest by
/// descending score. Equal scores keep their input order.
#[must_use]
pub fn rerank(candidates: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut unique: Vec<SearchHit> = candidates
        .into_iter()
        .filter(|hit| seen.insert(dedup_key(hit)))
        .collect();

    unique.sort_by(|a, b| b.score.total_cmp(&a.score));
    apply_recency_boost(&mut unique);
    unique
}

/// Hook for favouring recently indexed chunks. Scores are left untouched.
pub fn apply_recency_boost(_hits: &mut [SearchHit]) {}
