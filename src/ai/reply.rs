// src/ai/reply.rs
//! Explicit validation of collaborator replies.
//!
//! A reply is either parsed into typed entries or rejected as [`Malformed`].
//! Individual entries with bad indices are dropped later by [`by_index`], which
//! is the per-entry bounds check.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Reply text that did not match the expected schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed reply: {0}")]
pub struct Malformed(pub String);

/// Scoring entry: `{"index":1,"score":0.8,"reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreEntry {
    pub index: i64,
    pub score: f64,
    #[serde(default)]
    pub reason: String,
}

/// Summary/rewrite entry: `{"index":1,"text":"..."}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextEntry {
    pub index: i64,
    #[serde(default, alias = "summary", alias = "title")]
    pub text: String,
}

// Tolerated envelopes: {"results":[...]} or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Envelope<T> {
    fn into_entries(self) -> Vec<T> {
        match self {
            Envelope::Wrapped { results } => results,
            Envelope::Bare(v) => v,
        }
    }
}

pub fn parse_scores(text: &str) -> Result<Vec<ScoreEntry>, Malformed> {
    parse_entries(text)
}

pub fn parse_texts(text: &str) -> Result<Vec<TextEntry>, Malformed> {
    parse_entries(text)
}

fn parse_entries<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, Malformed> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(Malformed("empty reply".into()));
    }
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(env) => Ok(env.into_entries()),
        Err(first_err) => {
            // Models sometimes wrap the JSON in a sentence; retry on the outermost object.
            let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) else {
                return Err(Malformed(first_err.to_string()));
            };
            if end <= start {
                return Err(Malformed(first_err.to_string()));
            }
            serde_json::from_str::<Envelope<T>>(&body[start..=end])
                .map(Envelope::into_entries)
                .map_err(|e| Malformed(e.to_string()))
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // drop the info string ("json") up to the first newline
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Entries carrying a 1-based `index`.
pub trait Indexed {
    fn index(&self) -> i64;
}

impl Indexed for ScoreEntry {
    fn index(&self) -> i64 {
        self.index
    }
}

impl Indexed for TextEntry {
    fn index(&self) -> i64 {
        self.index
    }
}

/// Place entries into `len` slots by 1-based index. Out-of-range indices are
/// dropped; for a duplicated index the first entry wins.
pub fn by_index<T: Indexed>(entries: Vec<T>, len: usize) -> Vec<Option<T>> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for e in entries {
        let idx = e.index();
        if idx < 1 {
            continue;
        }
        let Ok(pos) = usize::try_from(idx - 1) else {
            continue;
        };
        if let Some(slot) = slots.get_mut(pos) {
            if slot.is_none() {
                *slot = Some(e);
            }
        }
    }
    slots
}
