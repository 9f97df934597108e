// src/notify/discord.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::types::CuratedItem;

/// Discord rejects messages with more than 10 embeds.
pub const MAX_EMBEDS: usize = 10;

const TITLE_MAX: usize = 256;
const DESCRIPTION_MAX: usize = 4096;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_attempts: u8,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_attempts: 1,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Attempts per chunk. A retried chunk may be posted twice if the first
    /// response was lost, so the default is a single attempt.
    pub fn with_attempts(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn post(&self, payload: &DiscordWebhookPayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Discord webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord webhook request failed: {e}"),
            };
            if attempt >= self.max_attempts {
                return Err(err);
            }
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, batch: &[CuratedItem]) -> Result<()> {
        let chunks = batch.chunks(MAX_EMBEDS).count();
        for (i, chunk) in batch.chunks(MAX_EMBEDS).enumerate() {
            let payload = DiscordWebhookPayload::from_items(chunk);
            self.post(&payload)
                .await
                .map_err(|e| e.context(format!("chunk {}/{}", i + 1, chunks)))?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    url: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn from_items(items: &[CuratedItem]) -> Self {
        let embeds = items
            .iter()
            .map(|it| {
                let source = format!("_{}_", it.scored.item.source_name);
                let description = if it.display_text() == it.title() {
                    source
                } else {
                    format!("{}\n\n{source}", it.display_text())
                };
                DiscordEmbed {
                    title: truncate(it.title(), TITLE_MAX),
                    url: it.identifier().to_string(),
                    description: truncate(&description, DESCRIPTION_MAX),
                }
            })
            .collect();
        Self {
            content: None,
            embeds,
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
