// src/ingest/providers/rss.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::normalize_text;
use crate::ingest::types::SourceConnector;
use crate::types::CandidateItem;

/// Content excerpt kept per item; prompts truncate further.
const CONTENT_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct RssConnector {
    name: String,
    category: String,
    cap: usize,
    mode: Mode,
}

impl RssConnector {
    pub fn from_fixture(name: &str, category: &str, xml: &str, cap: usize) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            cap,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, category: &str, url: &str, cap: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("feed-curator/0.1")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("building rss http client")?;
        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            cap,
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<CandidateItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing rss xml for {}", self.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let identifier = it
                .link
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    it.guid
                        .as_ref()
                        .and_then(|g| g.value.as_deref())
                        .map(str::trim)
                        .filter(|s| s.starts_with("http"))
                });
            let Some(identifier) = identifier else {
                continue;
            };
            let title = normalize_text(it.title.as_deref().unwrap_or_default(), 300);
            if title.is_empty() {
                continue;
            }
            let mut item = CandidateItem::new(identifier, title, &self.name, &self.category);
            let content = normalize_text(
                it.description.as_deref().unwrap_or_default(),
                CONTENT_CHARS,
            );
            if !content.is_empty() {
                item = item.with_content(content);
            }
            if let Some(at) = it.pub_date.as_deref().and_then(parse_rfc2822) {
                item = item.published(at);
            }
            out.push(item);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("curator_parse_ms").record(ms);
        counter!("curator_fetched_total", "source" => self.name.clone()).increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceConnector for RssConnector {
    async fn fetch(&self) -> Result<Vec<CandidateItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("rss get {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(anyhow!("rss {url} returned {status}"));
                }
                let body = resp.text().await.context("rss body")?;
                self.parse_items_from_str(&body)
            }
        }
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

// quick-xml only knows the five XML entities
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
