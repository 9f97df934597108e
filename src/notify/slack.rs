// src/notify/slack.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{item_line, Notifier};
use crate::types::CuratedItem;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// One bullet per item, source and link on the following line.
pub(crate) fn render(batch: &[CuratedItem]) -> String {
    batch
        .iter()
        .map(|it| format!("• {}", item_line(it)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, batch: &[CuratedItem]) -> Result<()> {
        let body = serde_json::json!({ "text": render(batch) });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
