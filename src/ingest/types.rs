// src/ingest/types.rs
use anyhow::Result;

use crate::types::CandidateItem;

/// A source of candidates. Connectors share no state with the pipeline beyond
/// their own read-only configuration.
#[async_trait::async_trait]
pub trait SourceConnector: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CandidateItem>>;
    /// Human label, also stamped on every item as `source_name`.
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    /// Max items taken from this source per run.
    fn cap(&self) -> usize;
}

pub type DynConnector = Box<dyn SourceConnector>;
