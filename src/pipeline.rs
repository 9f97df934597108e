// src/pipeline.rs
//! One curation run:
//! INTAKE → DEDUPE → (nothing new? done) → FILTER → SELECT → SUMMARIZE → PERSIST → return.
//!
//! PERSIST records every candidate that survived DEDUPE, including the ones
//! FILTER and SELECT dropped, so nothing is evaluated twice. It runs before the
//! batch is handed back; delivery and `mark_delivered` are the caller's job.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, gauge, histogram};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::ai::DynAiClient;
use crate::config::CuratorConfig;
use crate::history::{HistoryRecord, HistoryStore, StoreError};
use crate::ingest::{self, DynConnector};
use crate::rank;
use crate::relevance::RelevanceFilter;
use crate::summarize::Summarizer;
use crate::types::{CandidateItem, CuratedItem};

/// The only failure a run surfaces. Collaborator failures degrade locally.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("history store unavailable: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Candidates handed to DEDUPE.
    pub candidates: usize,
    /// Not seen before.
    pub fresh: usize,
    pub passed: usize,
    pub selected: usize,
    /// New history rows written.
    pub persisted: usize,
}

#[derive(Debug, Default)]
pub struct RunOutput {
    /// Selected and summarized batch, best first.
    pub curated: Vec<CuratedItem>,
    /// Every candidate that survived DEDUPE (all of them were persisted).
    pub fresh: Vec<CandidateItem>,
    pub stats: RunStats,
}

pub struct Curator {
    store: HistoryStore,
    connectors: Vec<DynConnector>,
    filter: RelevanceFilter,
    summarizer: Summarizer,
    max_output: usize,
    // runs never overlap
    run_lock: Mutex<()>,
}

impl std::fmt::Debug for Curator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Curator")
            .field("connectors", &self.connectors.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("filter", &self.filter)
            .field("summarizer", &self.summarizer)
            .field("max_output", &self.max_output)
            .finish()
    }
}

impl Curator {
    pub fn new(
        store: HistoryStore,
        connectors: Vec<DynConnector>,
        filter: RelevanceFilter,
        summarizer: Summarizer,
        max_output: usize,
    ) -> Self {
        Self {
            store,
            connectors,
            filter,
            summarizer,
            max_output,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire filter and summarizer from config around one shared client.
    pub fn from_config(
        cfg: &CuratorConfig,
        store: HistoryStore,
        connectors: Vec<DynConnector>,
        client: Option<DynAiClient>,
    ) -> Self {
        let filter = RelevanceFilter::new(client.clone(), &cfg.relevance);
        let summarizer = Summarizer::new(client, cfg.summary.clone());
        Self::new(store, connectors, filter, summarizer, cfg.selection.max_output)
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Full run: pull every connector, then [`curate`](Self::curate).
    pub async fn run_once(&self) -> Result<RunOutput, RunError> {
        let _guard = self.run_lock.lock().await;
        let intake = ingest::intake(&self.connectors).await;
        self.curate_locked(intake.items).await
    }

    /// Run from DEDUPE on, over candidates gathered elsewhere.
    pub async fn curate(&self, candidates: Vec<CandidateItem>) -> Result<RunOutput, RunError> {
        let _guard = self.run_lock.lock().await;
        self.curate_locked(candidates).await
    }

    async fn curate_locked(&self, candidates: Vec<CandidateItem>) -> Result<RunOutput, RunError> {
        let t0 = Instant::now();
        let mut stats = RunStats {
            candidates: candidates.len(),
            ..RunStats::default()
        };

        let fresh = self.dedupe(candidates)?;
        stats.fresh = fresh.len();
        if fresh.is_empty() {
            info!(target: "pipeline", candidates = stats.candidates, "nothing new");
            finish_metrics(t0);
            return Ok(RunOutput {
                stats,
                ..RunOutput::default()
            });
        }

        let passed = self.filter.filter(fresh.clone()).await;
        stats.passed = passed.len();
        let score_of: HashMap<String, f32> = passed
            .iter()
            .map(|s| (s.identifier().to_string(), s.relevance_score))
            .collect();

        let overflow = passed.len().saturating_sub(self.max_output);
        let selected = rank::select(passed, self.max_output);
        stats.selected = selected.len();
        if overflow > 0 {
            debug!(target: "pipeline", overflow, max = self.max_output, "selection cut");
        }

        let curated = self.summarizer.summarize(selected).await;

        stats.persisted = self.persist(&fresh, &score_of, &curated)?;
        counter!("curator_selected_total").increment(curated.len() as u64);

        info!(
            target: "pipeline",
            candidates = stats.candidates,
            fresh = stats.fresh,
            passed = stats.passed,
            selected = stats.selected,
            persisted = stats.persisted,
            "run complete"
        );
        finish_metrics(t0);

        Ok(RunOutput {
            curated,
            fresh,
            stats,
        })
    }

    /// Drop seen identifiers (and repeats within the input). A read failure aborts the run.
    fn dedupe(&self, candidates: Vec<CandidateItem>) -> Result<Vec<CandidateItem>, StoreError> {
        let mut in_run: HashSet<String> = HashSet::new();
        let mut fresh = Vec::with_capacity(candidates.len());
        let mut dropped = 0usize;
        for c in candidates {
            if !in_run.insert(c.identifier.clone()) || self.store.has_seen(&c.identifier)? {
                dropped += 1;
                continue;
            }
            fresh.push(c);
        }
        counter!("curator_dedup_total").increment(dropped as u64);
        Ok(fresh)
    }

    fn persist(
        &self,
        fresh: &[CandidateItem],
        scores: &HashMap<String, f32>,
        curated: &[CuratedItem],
    ) -> Result<usize, StoreError> {
        let now = Utc::now();
        let by_id: HashMap<&str, &CuratedItem> =
            curated.iter().map(|c| (c.identifier(), c)).collect();
        let records: Vec<HistoryRecord> = fresh
            .iter()
            .map(|c| {
                let rec = HistoryRecord::from_candidate(c, now);
                match (by_id.get(c.identifier.as_str()), scores.get(&c.identifier)) {
                    (Some(cur), _) => rec.with_gloss(cur),
                    (None, Some(&score)) => rec.with_score(score),
                    (None, None) => rec,
                }
            })
            .collect();
        self.store.record_seen_all(&records)
    }
}

fn finish_metrics(t0: Instant) {
    histogram!("curator_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    gauge!("curator_last_run_ts").set(Utc::now().timestamp() as f64);
}
