// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::notify::{DeliveryReport, DeliveryTracker, DynNotifier};
use crate::pipeline::{Curator, RunError, RunStats};

#[derive(Debug)]
pub struct CycleOutcome {
    pub stats: RunStats,
    pub delivery: DeliveryReport,
}

/// One run, then delivery of its batch, then marking.
pub async fn run_cycle(
    curator: &Curator,
    tracker: &DeliveryTracker,
    notifier: &DynNotifier,
) -> Result<CycleOutcome, RunError> {
    let out = curator.run_once().await?;
    let delivery = tracker.deliver(notifier.as_ref(), &out.curated).await?;
    Ok(CycleOutcome {
        stats: out.stats,
        delivery,
    })
}

/// Tick every `interval_secs`. A slow cycle delays the next tick; runs never overlap.
pub fn spawn_scheduler(
    curator: Arc<Curator>,
    tracker: DeliveryTracker,
    notifier: DynNotifier,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("curator_runs_total").increment(1);
            match run_cycle(&curator, &tracker, &notifier).await {
                Ok(c) => tracing::info!(
                    target: "pipeline",
                    selected = c.stats.selected,
                    delivered = c.delivery.is_delivered(),
                    "cycle finished"
                ),
                Err(e) => tracing::error!(target: "pipeline", error = %e, "cycle aborted"),
            }
        }
    })
}
