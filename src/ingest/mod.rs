// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::HashSet;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::types::CandidateItem;

pub use types::{DynConnector, SourceConnector};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("curator_fetched_total", "Items parsed from sources.");
        describe_counter!("curator_candidates_total", "Candidates accepted by intake.");
        describe_counter!("curator_source_errors_total", "Source fetch/parse errors.");
        describe_counter!(
            "curator_dedup_total",
            "Candidates dropped as seen before or duplicated within a run."
        );
        describe_counter!("curator_filtered_out_total", "Candidates rejected by relevance.");
        describe_counter!(
            "curator_degraded_batches_total",
            "External batches that fell back to defaults."
        );
        describe_counter!("curator_gloss_rejected_total", "Glosses rejected by the quality gate.");
        describe_counter!("curator_selected_total", "Items selected into a batch.");
        describe_counter!("curator_delivered_total", "Items marked delivered.");
        describe_counter!("curator_delivery_failures_total", "Failed delivery attempts.");
        describe_counter!("curator_runs_total", "Scheduled cycles started.");
        describe_histogram!("curator_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("curator_run_ms", "Pipeline run time in milliseconds.");
        describe_gauge!("curator_last_run_ts", "Unix ts of the last finished run.");
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Decode entities, strip tags, collapse whitespace, cap at `max_chars`.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();
    out = RE_TAGS.replace_all(&out, "").to_string();

    // “ ” « » ‘ ’ to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    out = RE_WS.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }
    out
}

/// What intake produced, with per-source bookkeeping for logs.
#[derive(Debug, Default)]
pub struct IntakeReport {
    pub items: Vec<CandidateItem>,
    /// (source name, items taken after cap)
    pub per_source: Vec<(String, usize)>,
    pub failed_sources: Vec<String>,
    /// In-run duplicates dropped (same identifier from two sources).
    pub duplicates: usize,
}

/// Pull every connector once. Each source is capped independently; a failing
/// source is logged and skipped. Within a run the first occurrence of an
/// identifier wins.
pub async fn intake(connectors: &[DynConnector]) -> IntakeReport {
    ensure_metrics_described();

    let mut report = IntakeReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for c in connectors {
        let fetched = match c.fetch().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = c.name(), "source error");
                counter!("curator_source_errors_total", "source" => c.name().to_string())
                    .increment(1);
                report.failed_sources.push(c.name().to_string());
                continue;
            }
        };

        let taken = take_capped(&**c, fetched);
        let mut kept = 0usize;
        for item in taken {
            if !seen.insert(item.identifier.clone()) {
                report.duplicates += 1;
                continue;
            }
            kept += 1;
            report.items.push(item);
        }
        report.per_source.push((c.name().to_string(), kept));
    }

    counter!("curator_candidates_total").increment(report.items.len() as u64);
    counter!("curator_dedup_total").increment(report.duplicates as u64);
    tracing::info!(
        target: "ingest",
        candidates = report.items.len(),
        sources = connectors.len(),
        failed = report.failed_sources.len(),
        duplicates = report.duplicates,
        "intake done"
    );
    report
}

fn take_capped(c: &dyn SourceConnector, fetched: Vec<CandidateItem>) -> Vec<CandidateItem> {
    fetched
        .into_iter()
        .filter(|it| !it.identifier.trim().is_empty() && !it.title.trim().is_empty())
        .take(c.cap())
        .collect()
}
