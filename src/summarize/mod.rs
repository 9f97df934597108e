// src/summarize/mod.rs
//! Quality-gated summarizer: turns selected `ScoredItem`s into `CuratedItem`s.
//!
//! Per item, in order:
//! - exempt category: gloss stays "" and the item is never sent out;
//! - enough source material: batched summary request, output checked by the
//!   standard [`QualityGate`], title on rejection;
//! - thin material with newsworthy engagement: batched title rewrite, annotated
//!   with the engagement label;
//! - anything else: title, annotated when engagement is notable.
//!
//! A failed or malformed batch falls back to titles for that batch only.

pub mod quality;
pub mod sufficiency;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::ai::prompts::{self, PromptEntry};
use crate::ai::reply::{self, TextEntry};
use crate::ai::{sanitize_line, DynAiClient};
use crate::config::SummaryConfig;
use crate::types::{CuratedItem, ScoredItem};

pub use quality::{GlossCheck, QualityGate};
pub use sufficiency::{ContentClass, Engagement};

#[derive(Debug, Clone, PartialEq)]
enum Plan {
    Exempt,
    Summarize,
    Rewrite(Engagement),
    Local(Option<Engagement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Summary,
    Rewrite,
}

impl CallKind {
    fn stage(self) -> &'static str {
        match self {
            CallKind::Summary => "summarize",
            CallKind::Rewrite => "rewrite",
        }
    }
}

#[derive(Clone)]
pub struct Summarizer {
    client: Option<DynAiClient>,
    cfg: SummaryConfig,
    gate: QualityGate,
    rewrite_gate: QualityGate,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("client", &self.client.as_ref().map(|c| c.provider_name()))
            .field("exempt", &self.cfg.exempt_categories)
            .field("checks", &self.gate.tags())
            .finish()
    }
}

impl Summarizer {
    pub fn new(client: Option<DynAiClient>, cfg: SummaryConfig) -> Self {
        Self {
            client,
            cfg,
            gate: QualityGate::standard(),
            rewrite_gate: QualityGate::rewrite(),
        }
    }

    /// Replace the summary gate (extra heuristics, tests).
    pub fn with_gate(mut self, gate: QualityGate) -> Self {
        self.gate = gate;
        self
    }

    /// One `CuratedItem` per input, same order.
    pub async fn summarize(&self, items: Vec<ScoredItem>) -> Vec<CuratedItem> {
        if items.is_empty() {
            return Vec::new();
        }

        let plans: Vec<Plan> = items.iter().map(|s| self.plan(s)).collect();
        let mut glosses: Vec<Option<String>> = vec![None; items.len()];

        let mut to_summarize = Vec::new();
        let mut to_rewrite = Vec::new();
        for (i, plan) in plans.iter().enumerate() {
            match plan {
                Plan::Exempt => glosses[i] = Some(String::new()),
                Plan::Local(eng) => glosses[i] = Some(self.local_gloss(&items[i], eng.as_ref())),
                Plan::Summarize => to_summarize.push(i),
                Plan::Rewrite(_) => to_rewrite.push(i),
            }
        }

        match self.client.as_ref() {
            None => {
                for &i in &to_summarize {
                    glosses[i] = Some(items[i].item.title.clone());
                }
                for &i in &to_rewrite {
                    glosses[i] = Some(annotate(&items[i].item.title, engagement_of(&plans[i])));
                }
            }
            Some(client) => {
                for chunk in to_summarize.chunks(self.cfg.batch_size.max(1)) {
                    let out = self.run_batch(client, CallKind::Summary, &items, chunk).await;
                    for (&i, text) in chunk.iter().zip(out) {
                        let title = &items[i].item.title;
                        glosses[i] = Some(self.accept_summary(text, title));
                    }
                }
                for chunk in to_rewrite.chunks(self.cfg.batch_size.max(1)) {
                    let out = self.run_batch(client, CallKind::Rewrite, &items, chunk).await;
                    for (&i, text) in chunk.iter().zip(out) {
                        let title = &items[i].item.title;
                        let base = self.accept_rewrite(text, title);
                        glosses[i] = Some(annotate(&base, engagement_of(&plans[i])));
                    }
                }
            }
        }

        info!(
            target: "summarize",
            total = items.len(),
            summarized = to_summarize.len(),
            rewritten = to_rewrite.len(),
            "summarize done"
        );

        items
            .into_iter()
            .zip(glosses)
            .map(|(scored, gloss)| {
                let gloss = gloss.unwrap_or_else(|| scored.item.title.clone());
                CuratedItem::new(scored, gloss)
            })
            .collect()
    }

    fn plan(&self, scored: &ScoredItem) -> Plan {
        let item = &scored.item;
        if self.cfg.is_exempt(&item.category) {
            return Plan::Exempt;
        }
        match sufficiency::classify(item, self.cfg.min_content_chars) {
            ContentClass::Sufficient => Plan::Summarize,
            ContentClass::Insufficient {
                engagement: Some(e),
            } if e.value >= self.cfg.engagement_newsworthy_min => Plan::Rewrite(e),
            ContentClass::Insufficient { engagement } => Plan::Local(engagement),
        }
    }

    fn local_gloss(&self, scored: &ScoredItem, engagement: Option<&Engagement>) -> String {
        let notable = engagement.filter(|e| e.value >= self.cfg.engagement_annotate_min);
        annotate(&scored.item.title, notable)
    }

    /// Texts for `chunk` in chunk order; `None` everywhere when the batch degraded.
    async fn run_batch(
        &self,
        client: &DynAiClient,
        kind: CallKind,
        items: &[ScoredItem],
        chunk: &[usize],
    ) -> Vec<Option<String>> {
        let lang = &self.cfg.output_language;
        let max = self.cfg.max_gloss_chars;
        let (system, user) = {
            let entries: Vec<PromptEntry<'_>> = chunk
                .iter()
                .map(|&i| PromptEntry {
                    title: &items[i].item.title,
                    source: &items[i].item.source_name,
                    content: items[i].item.content(),
                })
                .collect();
            match kind {
                CallKind::Summary => (
                    prompts::summary_system(lang, max),
                    prompts::summary_user(&entries),
                ),
                CallKind::Rewrite => (
                    prompts::rewrite_system(lang, max),
                    prompts::rewrite_user(&entries),
                ),
            }
        };

        let reason = match client.complete(&system, &user).await {
            Ok(text) => match reply::parse_texts(&text) {
                Ok(entries) => {
                    return reply::by_index(entries, chunk.len())
                        .into_iter()
                        .map(|slot| slot.map(|e: TextEntry| e.text))
                        .collect();
                }
                Err(e) => {
                    debug!(target: "summarize", error = %e, "summary reply failed validation");
                    "malformed response"
                }
            },
            Err(e) => {
                debug!(target: "summarize", error = %e, "summary call failed");
                "error"
            }
        };
        warn!(
            target: "summarize",
            stage = kind.stage(),
            reason,
            n = chunk.len(),
            "batch degraded; using titles"
        );
        counter!("curator_degraded_batches_total", "stage" => kind.stage()).increment(1);
        vec![None; chunk.len()]
    }

    fn accept_summary(&self, text: Option<String>, title: &str) -> String {
        let Some(text) = text else {
            return title.to_string();
        };
        // leave headroom over the requested length; the model is asked, not forced
        let gloss = sanitize_line(&text, self.cfg.max_gloss_chars.saturating_mul(2));
        match self.gate.verdict(&gloss, title) {
            Ok(()) => gloss,
            Err(tag) => {
                debug!(target: "summarize", check = tag, "gloss rejected; using title");
                counter!("curator_gloss_rejected_total", "check" => tag).increment(1);
                title.to_string()
            }
        }
    }

    fn accept_rewrite(&self, text: Option<String>, title: &str) -> String {
        let Some(text) = text else {
            return title.to_string();
        };
        let rewritten = sanitize_line(&text, self.cfg.max_gloss_chars.saturating_mul(2));
        match self.rewrite_gate.verdict(&rewritten, title) {
            Ok(()) => rewritten,
            Err(tag) => {
                debug!(target: "summarize", check = tag, "title rewrite rejected; using title");
                counter!("curator_gloss_rejected_total", "check" => tag).increment(1);
                title.to_string()
            }
        }
    }
}

fn engagement_of(plan: &Plan) -> Option<&Engagement> {
    match plan {
        Plan::Rewrite(e) => Some(e),
        Plan::Local(e) => e.as_ref(),
        _ => None,
    }
}

fn annotate(base: &str, engagement: Option<&Engagement>) -> String {
    match engagement {
        Some(e) => format!("{base} ({})", e.label()),
        None => base.to_string(),
    }
}
