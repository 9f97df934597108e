// src/notify/tracker.rs
//! Delivery policy: mark exactly the delivered identifiers, and only after the
//! notifier confirmed the whole batch.
//!
//! A failed batch is not retried. Its items are already in the history store,
//! so the next run will not surface them again.

use metrics::counter;

use super::Notifier;
use crate::history::{HistoryStore, StoreError};
use crate::types::CuratedItem;

#[derive(Debug)]
pub enum DeliveryReport {
    /// Nothing to send; the notifier was not called.
    Empty,
    /// Sent; `marked` rows flipped to delivered (already-delivered rows do not count).
    Delivered { marked: usize },
    /// Not confirmed sent; nothing was marked.
    Failed { error: anyhow::Error },
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryReport::Delivered { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryTracker {
    store: HistoryStore,
}

impl DeliveryTracker {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// Mark identifiers delivered. Idempotent; unknown identifiers are ignored.
    pub fn mark_delivered(&self, identifiers: &[String]) -> Result<usize, StoreError> {
        let marked = self.store.mark_delivered(identifiers)?;
        counter!("curator_delivered_total").increment(marked as u64);
        Ok(marked)
    }

    /// Deliver `batch` through `notifier`, then mark it. A storage error while
    /// marking is returned; the batch itself did go out.
    pub async fn deliver(
        &self,
        notifier: &dyn Notifier,
        batch: &[CuratedItem],
    ) -> Result<DeliveryReport, StoreError> {
        if batch.is_empty() {
            return Ok(DeliveryReport::Empty);
        }
        if let Err(error) = notifier.deliver(batch).await {
            counter!("curator_delivery_failures_total").increment(1);
            tracing::warn!(
                target: "notify",
                notifier = notifier.name(),
                items = batch.len(),
                error = %error,
                "delivery failed; batch not marked and will not be re-surfaced"
            );
            return Ok(DeliveryReport::Failed { error });
        }
        let ids: Vec<String> = batch.iter().map(|c| c.identifier().to_string()).collect();
        let marked = self.mark_delivered(&ids)?;
        tracing::info!(target: "notify", notifier = notifier.name(), items = batch.len(), marked, "batch delivered");
        Ok(DeliveryReport::Delivered { marked })
    }
}
