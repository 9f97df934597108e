// src/rank.rs
//! Selection: stable prefix take over the filter's ordering.
//!
//! The relevance filter already sorts by score (stable on ties), so selection
//! never reorders. Ranking policy changes belong in the filter.

use crate::types::ScoredItem;

/// First `min(max, items.len())` items, order untouched.
pub fn select(mut items: Vec<ScoredItem>, max: usize) -> Vec<ScoredItem> {
    items.truncate(max);
    items
}
