// src/relevance.rs
//! Relevance filter: asks the external scorer to rate unseen candidates in
//! fixed-size batches and keeps those at or above the threshold.
//!
//! Fail-open: when the scorer is missing, errors, or replies with something we
//! cannot validate, the affected items pass with score 0.5 and a reason naming
//! the degraded path. Losing content silently is worse than a noisy digest.

use metrics::counter;
use tracing::{debug, info, warn};

use crate::ai::prompts::{self, PromptEntry};
use crate::ai::reply::{self, ScoreEntry};
use crate::ai::{AiError, DynAiClient};
use crate::config::RelevanceConfig;
use crate::types::{CandidateItem, ScoredItem};

pub use crate::config::curator::DEFAULT_RELEVANCE_THRESHOLD;

/// Score assigned on every degraded path.
pub const FALLBACK_SCORE: f32 = 0.5;

pub const REASON_UNFILTERED: &str = "unfiltered";
pub const REASON_API_ERROR: &str = "api error";
pub const REASON_TRANSPORT: &str = "error";
pub const REASON_MALFORMED: &str = "malformed response";

// Dev logging gate: RELEVANCE_DEV_LOG=1 AND a debug build or CURATOR_ENV in {local,development,dev}
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("RELEVANCE_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("CURATOR_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short stable hash so diagnostics can correlate items without logging them.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_decision(identifier: &str, score: f32, threshold: f32, reason: &str, kept: bool) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(identifier);
    // Never log raw titles. Only hashed id + verdict.
    info!(target: "relevance", %id, %score, %threshold, kept, reason);
}

enum BatchOutcome {
    Scored(Vec<ScoredItem>),
    Degraded {
        items: Vec<ScoredItem>,
        reason: &'static str,
    },
}

#[derive(Clone)]
pub struct RelevanceFilter {
    client: Option<DynAiClient>,
    threshold: f32,
    batch_size: usize,
    interests: String,
}

impl std::fmt::Debug for RelevanceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceFilter")
            .field("client", &self.client.as_ref().map(|c| c.provider_name()))
            .field("threshold", &self.threshold)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl RelevanceFilter {
    pub fn new(client: Option<DynAiClient>, cfg: &RelevanceConfig) -> Self {
        Self {
            client,
            threshold: if cfg.threshold.is_finite() {
                cfg.threshold.clamp(0.0, 1.0)
            } else {
                DEFAULT_RELEVANCE_THRESHOLD
            },
            batch_size: cfg.batch_size.max(1),
            interests: cfg.interests.clone(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns only passing items, sorted by score descending (stable on ties).
    pub async fn filter(&self, candidates: Vec<CandidateItem>) -> Vec<ScoredItem> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let Some(client) = self.client.as_ref() else {
            debug!(target: "relevance", n = candidates.len(), "no scorer configured; pass-through");
            return candidates
                .into_iter()
                .map(|c| ScoredItem::new(c, FALLBACK_SCORE, REASON_UNFILTERED))
                .collect();
        };

        let total = candidates.len();
        let mut out = Vec::with_capacity(total);
        let mut pending = candidates.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<CandidateItem> = pending.by_ref().take(self.batch_size).collect();
            match self.score_batch(client, batch).await {
                BatchOutcome::Scored(mut kept) => out.append(&mut kept),
                BatchOutcome::Degraded { mut items, reason } => {
                    warn!(target: "relevance", reason, n = items.len(), "scorer batch degraded; passing batch through");
                    counter!("curator_degraded_batches_total", "stage" => "relevance").increment(1);
                    out.append(&mut items);
                }
            }
        }

        let dropped = total.saturating_sub(out.len());
        counter!("curator_filtered_out_total").increment(dropped as u64);
        info!(target: "relevance", total, kept = out.len(), dropped, "relevance filter done");

        out.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        out
    }

    async fn score_batch(&self, client: &DynAiClient, batch: Vec<CandidateItem>) -> BatchOutcome {
        let system = prompts::relevance_system(&self.interests, self.threshold);
        let user = {
            let entries: Vec<PromptEntry<'_>> = batch
                .iter()
                .map(|c| PromptEntry {
                    title: &c.title,
                    source: &c.source_name,
                    content: c.content(),
                })
                .collect();
            prompts::relevance_user(&entries)
        };

        let reply = client.complete(&system, &user).await;
        let parsed = match reply {
            Ok(text) => reply::parse_scores(&text),
            Err(AiError::Api { status }) => {
                debug!(target: "relevance", status, "scorer returned non-success status");
                return degraded(batch, REASON_API_ERROR);
            }
            Err(AiError::Transport(e)) => {
                debug!(target: "relevance", error = %e, "scorer transport failure");
                return degraded(batch, REASON_TRANSPORT);
            }
            Err(AiError::Malformed(e)) => {
                debug!(target: "relevance", error = %e, "scorer body unreadable");
                return degraded(batch, REASON_MALFORMED);
            }
        };
        let entries = match parsed {
            Ok(entries) => entries,
            Err(e) => {
                debug!(target: "relevance", error = %e, "scorer reply failed validation");
                return degraded(batch, REASON_MALFORMED);
            }
        };

        let slots = reply::by_index(entries, batch.len());
        let mut kept = Vec::new();
        for (cand, slot) in batch.into_iter().zip(slots) {
            match slot.and_then(|e| self.accept(e)) {
                Some((score, reason)) => {
                    dev_log_decision(&cand.identifier, score, self.threshold, &reason, true);
                    kept.push(ScoredItem::new(cand, score, reason));
                }
                None => {
                    dev_log_decision(&cand.identifier, 0.0, self.threshold, "below threshold", false);
                }
            }
        }
        BatchOutcome::Scored(kept)
    }

    /// Defensive re-check of a scorer entry.
    fn accept(&self, entry: ScoreEntry) -> Option<(f32, String)> {
        if !entry.score.is_finite() || !(0.0..=1.0).contains(&entry.score) {
            return None;
        }
        // compare before narrowing: 0.49999999 rounds to 0.5 as f32
        if entry.score < f64::from(self.threshold) {
            return None;
        }
        let score = entry.score as f32;
        let reason = entry.reason.trim();
        let reason = if reason.is_empty() { "relevant" } else { reason };
        Some((score, crate::ai::sanitize_line(reason, 120)))
    }
}

fn degraded(batch: Vec<CandidateItem>, reason: &'static str) -> BatchOutcome {
    BatchOutcome::Degraded {
        items: batch
            .into_iter()
            .map(|c| ScoredItem::new(c, FALLBACK_SCORE, reason))
            .collect(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiClient, BoxFuture};
    use std::sync::{Arc, Mutex};

    struct Fixed {
        reply: Result<String, AiError>,
        calls: Mutex<usize>,
    }

    impl AiClient for Fixed {
        fn complete<'a>(
            &'a self,
            _system: &'a str,
            _user: &'a str,
        ) -> BoxFuture<'a, Result<String, AiError>> {
            *self.calls.lock().unwrap() += 1;
            let r = self.reply.clone();
            Box::pin(async move { r })
        }
        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn filter_with(reply: Result<String, AiError>) -> (RelevanceFilter, Arc<Fixed>) {
        let client = Arc::new(Fixed {
            reply,
            calls: Mutex::new(0),
        });
        let f = RelevanceFilter::new(Some(client.clone()), &RelevanceConfig::default());
        (f, client)
    }

    fn cands(n: usize) -> Vec<CandidateItem> {
        (1..=n)
            .map(|i| CandidateItem::new(format!("https://x/{i}"), format!("Item {i}"), "Feed", "tech"))
            .collect()
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("https://x/1");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("https://x/1"));
        assert_ne!(a, anon_hash("https://x/2"));
    }

    #[tokio::test]
    async fn threshold_boundary_is_inclusive() {
        let (f, _) = filter_with(Ok(
            r#"{"results":[{"index":1,"score":0.5,"reason":"edge"},{"index":2,"score":0.499,"reason":"near"}]}"#
                .to_string(),
        ));
        let out = f.filter(cands(2)).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier(), "https://x/1");
        assert_eq!(out[0].relevance_reason, "edge");
    }

    #[tokio::test]
    async fn out_of_range_scores_are_ignored() {
        let (f, _) = filter_with(Ok(
            r#"{"results":[{"index":1,"score":1.5},{"index":2,"score":-0.1},{"index":3,"score":0.9}]}"#
                .to_string(),
        ));
        let out = f.filter(cands(3)).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier(), "https://x/3");
        assert_eq!(out[0].relevance_reason, "relevant");
    }

    #[tokio::test]
    async fn transport_error_fails_open() {
        let (f, _) = filter_with(Err(AiError::Transport("timeout".into())));
        let out = f.filter(cands(2)).await;
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|s| s.relevance_score == FALLBACK_SCORE && s.relevance_reason == REASON_TRANSPORT));
    }

    #[tokio::test]
    async fn empty_input_makes_no_call() {
        let (f, client) = filter_with(Ok("{}".into()));
        assert!(f.filter(Vec::new()).await.is_empty());
        assert_eq!(*client.calls.lock().unwrap(), 0);
    }
}
