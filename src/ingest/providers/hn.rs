// src/ingest/providers/hn.rs
//! Hacker News top stories via the public Firebase API.
//!
//! HN items carry no prose, only a score and a comment count. Both go into
//! `raw_content` as "HN Score: <score>, <n> comments" so the summarizer can
//! tell a busy thread from a quiet one.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use crate::ingest::normalize_text;
use crate::ingest::types::SourceConnector;
use crate::types::CandidateItem;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Map one API item to a candidate; `None` for dead, deleted or untitled items.
pub fn item_to_candidate(it: &HnItem, source: &str, category: &str) -> Option<CandidateItem> {
    if it.dead || it.deleted {
        return None;
    }
    if it.kind.as_deref().is_some_and(|k| k != "story") {
        return None;
    }
    let title = normalize_text(it.title.as_deref().unwrap_or_default(), 300);
    if title.is_empty() {
        return None;
    }
    // Ask HN and text posts have no url; the discussion page is the canonical link
    let identifier = it
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", it.id));

    let content = format!(
        "HN Score: {}, {} comments",
        it.score.unwrap_or(0),
        it.descendants.unwrap_or(0)
    );
    let mut item = CandidateItem::new(identifier, title, source, category).with_content(content);
    if let Some(at) = it.time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)) {
        item = item.published(at);
    }
    Some(item)
}

pub struct HnConnector {
    name: String,
    category: String,
    base_url: String,
    cap: usize,
    client: reqwest::Client,
}

impl HnConnector {
    pub fn new(name: &str, category: &str, base_url: &str, cap: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("feed-curator/0.1")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("building hn http client")?;
        let base = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url.trim()
        };
        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            base_url: base.trim_end_matches('/').to_string(),
            cap,
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("hn get {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("hn {url} returned {status}"));
        }
        resp.json::<T>().await.with_context(|| format!("hn decode {url}"))
    }
}

#[async_trait]
impl SourceConnector for HnConnector {
    async fn fetch(&self) -> Result<Vec<CandidateItem>> {
        let ids: Vec<u64> = self.get_json("topstories.json").await?;
        let mut out = Vec::with_capacity(self.cap);
        for id in ids {
            if out.len() >= self.cap {
                break;
            }
            // one bad item does not sink the source
            match self.get_json::<Option<HnItem>>(&format!("item/{id}.json")).await {
                Ok(Some(it)) => {
                    if let Some(c) = item_to_candidate(&it, &self.name, &self.category) {
                        out.push(c);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "ingest", error = %e, id, "hn item skipped");
                }
            }
        }
        counter!("curator_fetched_total", "source" => self.name.clone()).increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> HnItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn story_maps_to_engagement_annotated_candidate() {
        let it = parse(
            r#"{"id":1,"type":"story","title":"Show HN: a tiny database","url":"https://db.example/",
                "score":500,"descendants":150,"time":1757150000,"by":"someone"}"#,
        );
        let c = item_to_candidate(&it, "Hacker News", "tech").unwrap();
        assert_eq!(c.identifier, "https://db.example/");
        assert_eq!(c.title, "Show HN: a tiny database");
        assert_eq!(c.content(), "HN Score: 500, 150 comments");
        assert!(c.published_at.is_some());
    }

    #[test]
    fn text_post_uses_discussion_url() {
        let it = parse(r#"{"id":42,"type":"story","title":"Ask HN: What are you reading?","score":12}"#);
        let c = item_to_candidate(&it, "Hacker News", "tech").unwrap();
        assert_eq!(c.identifier, "https://news.ycombinator.com/item?id=42");
        assert_eq!(c.content(), "HN Score: 12, 0 comments");
    }

    #[test]
    fn dead_jobs_and_untitled_are_dropped() {
        assert!(item_to_candidate(&parse(r#"{"id":1,"title":"x","dead":true}"#), "HN", "tech").is_none());
        assert!(item_to_candidate(&parse(r#"{"id":2,"type":"job","title":"Hiring"}"#), "HN", "tech").is_none());
        assert!(item_to_candidate(&parse(r#"{"id":3,"type":"story"}"#), "HN", "tech").is_none());
    }
}
