// src/notify/log.rs
use anyhow::Result;

use super::{item_line, Notifier};
use crate::types::CuratedItem;

/// Writes batches to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, batch: &[CuratedItem]) -> Result<()> {
        for (i, item) in batch.iter().enumerate() {
            tracing::info!(target: "notify", n = i + 1, score = item.scored.relevance_score, "{}", item_line(item));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
