// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ai;
pub mod api;
pub mod config;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod rank;
pub mod relevance;
pub mod scheduler;
pub mod summarize;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::CuratorConfig;
pub use crate::history::{HistoryRecord, HistoryStore, StoreError};
pub use crate::notify::{DeliveryReport, DeliveryTracker, Notifier};
pub use crate::pipeline::{Curator, RunError, RunOutput, RunStats};
pub use crate::relevance::RelevanceFilter;
pub use crate::summarize::Summarizer;
pub use crate::types::{CandidateItem, CuratedItem, ScoredItem};
