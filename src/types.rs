// src/types.rs
//! Item shapes flowing through a curation run.
//!
//! `CandidateItem` → `ScoredItem` (relevance filter) → `CuratedItem` (summarizer).
//! Each stage wraps the previous one instead of copying fields, so the original
//! candidate is never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw unit of content before any judgment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    /// Canonical URL; unique key, stable across runs.
    pub identifier: String,
    pub title: String,
    pub source_name: String,
    /// Low-cardinality topic bucket, e.g. "tech", "ai", "jp".
    pub category: String,
    /// Supporting text/metadata; may be absent or very short.
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl CandidateItem {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        source_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            source_name: source_name.into(),
            category: category.into(),
            raw_content: None,
            published_at: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.raw_content = Some(content.into());
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Content as a trimmed slice ("" when absent).
    pub fn content(&self) -> &str {
        self.raw_content.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Candidate annotated by the relevance filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredItem {
    pub item: CandidateItem,
    /// In [0,1]; `>= threshold` passes.
    pub relevance_score: f32,
    /// Diagnostic only, never shown to end users.
    pub relevance_reason: String,
}

impl ScoredItem {
    pub fn new(item: CandidateItem, relevance_score: f32, reason: impl Into<String>) -> Self {
        Self {
            item,
            relevance_score,
            relevance_reason: reason.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.item.identifier
    }
}

/// Scored item with its final one-line gloss.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CuratedItem {
    pub scored: ScoredItem,
    /// Empty only for exempt categories.
    pub gloss: String,
}

impl CuratedItem {
    pub fn new(scored: ScoredItem, gloss: impl Into<String>) -> Self {
        Self {
            scored,
            gloss: gloss.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.scored.item.identifier
    }

    pub fn title(&self) -> &str {
        &self.scored.item.title
    }

    /// Text to show to a reader: the gloss, or the title for exempt items.
    pub fn display_text(&self) -> &str {
        if self.gloss.trim().is_empty() {
            self.title()
        } else {
            &self.gloss
        }
    }
}
