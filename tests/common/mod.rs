// tests/common/mod.rs
// Shared in-process doubles: scripted AI client, recording notifier, static connector.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use feed_curator::ai::{AiClient, AiError, BoxFuture};
use feed_curator::ingest::SourceConnector;
use feed_curator::notify::Notifier;
use feed_curator::types::{CandidateItem, CuratedItem};

/// Replies in order; records every (system, user) prompt pair.
pub struct ScriptedAi {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedAi {
    pub fn new(replies: Vec<Result<String, AiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }
}

impl AiClient for ScriptedAi {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, AiError>> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        let r = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Transport("script exhausted".into())));
        Box::pin(async move { r })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Records delivered batches; fails every call when `fail` is set.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, batch: &[CuratedItem]) -> Result<()> {
        self.batches
            .lock()
            .unwrap()
            .push(batch.iter().map(|c| c.identifier().to_string()).collect());
        if self.fail {
            Err(anyhow!("webhook returned 502"))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Returns the same items on every fetch.
pub struct StaticConnector {
    pub name: String,
    pub category: String,
    pub cap: usize,
    pub items: Vec<CandidateItem>,
}

impl StaticConnector {
    pub fn new(name: &str, category: &str, items: Vec<CandidateItem>) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            cap: 10,
            items,
        }
    }
}

#[async_trait::async_trait]
impl SourceConnector for StaticConnector {
    async fn fetch(&self) -> Result<Vec<CandidateItem>> {
        Ok(self.items.clone())
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

pub const PROSE: &str =
    "The release replaces the scheduler with a work-stealing design and cuts p99 latency by 40 percent.";

pub fn candidate(id: &str, title: &str) -> CandidateItem {
    CandidateItem::new(id, title, "Feed", "tech")
}

/// `{"results":[{"index":i,"score":s,"reason":"r"}...]}` for 1..=n, all with `score`.
pub fn uniform_scores(n: usize, score: f32) -> String {
    let entries: Vec<String> = (1..=n)
        .map(|i| format!(r#"{{"index":{i},"score":{score},"reason":"fits"}}"#))
        .collect();
    format!(r#"{{"results":[{}]}}"#, entries.join(","))
}
