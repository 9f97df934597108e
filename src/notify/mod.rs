// src/notify/mod.rs
//! Delivery collaborators. The pipeline treats delivery as opaque: a batch
//! either went out (`Ok`) or it did not.

pub mod discord;
pub mod log;
pub mod slack;
pub mod tracker;

use anyhow::Result;
use std::sync::Arc;

use crate::types::CuratedItem;

pub use discord::DiscordNotifier;
pub use log::LogNotifier;
pub use slack::SlackNotifier;
pub use tracker::{DeliveryReport, DeliveryTracker};

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the whole batch. `Ok` only when every part was accepted.
    async fn deliver(&self, batch: &[CuratedItem]) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// Discord if `DISCORD_WEBHOOK_URL` is set, else Slack if `SLACK_WEBHOOK_URL`
/// is set, else the log notifier.
pub fn from_env() -> DynNotifier {
    let env = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
    if let Some(url) = env("DISCORD_WEBHOOK_URL") {
        return Arc::new(DiscordNotifier::new(url));
    }
    if let Some(url) = env("SLACK_WEBHOOK_URL") {
        return Arc::new(SlackNotifier::new(url));
    }
    tracing::info!(target: "notify", "no webhook configured; batches go to the log");
    Arc::new(LogNotifier)
}

/// One display line per item: "<text> (<source>)\n<identifier>".
pub(crate) fn item_line(item: &CuratedItem) -> String {
    format!(
        "{} ({})\n{}",
        item.display_text(),
        item.scored.item.source_name,
        item.identifier()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CandidateItem, ScoredItem};

    #[serial_test::serial]
    #[test]
    fn from_env_prefers_discord_then_slack_then_log() {
        std::env::set_var("DISCORD_WEBHOOK_URL", "https://discord.invalid/hook");
        std::env::set_var("SLACK_WEBHOOK_URL", "https://slack.invalid/hook");
        assert_eq!(from_env().name(), "discord");

        std::env::remove_var("DISCORD_WEBHOOK_URL");
        assert_eq!(from_env().name(), "slack");

        std::env::set_var("SLACK_WEBHOOK_URL", "  ");
        assert_eq!(from_env().name(), "log");
        std::env::remove_var("SLACK_WEBHOOK_URL");
    }

    #[test]
    fn item_line_uses_title_for_empty_gloss() {
        let c = CandidateItem::new("https://x/1", "新しいリリース", "Zenn", "jp");
        let item = CuratedItem::new(ScoredItem::new(c, 0.9, "ok"), "");
        assert_eq!(item_line(&item), "新しいリリース (Zenn)\nhttps://x/1");
    }
}
