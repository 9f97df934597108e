// src/config/curator.rs
//! Curator configuration loaded from TOML.
//!
//! Resolution order for the file:
//! 1) $CURATOR_CONFIG_PATH (must exist if set)
//! 2) config/curator.toml
//! 3) built-in defaults
//!
//! `RELEVANCE_THRESHOLD` overrides `[relevance].threshold` (clamped to 0..=1).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/curator.toml";
pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const ENV_RELEVANCE_THRESHOLD: &str = "RELEVANCE_THRESHOLD";

pub const DEFAULT_PER_SOURCE_CAP: usize = 10;
pub const DEFAULT_MAX_OUTPUT: usize = 20;
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    pub intake: IntakeConfig,
    pub selection: SelectionConfig,
    pub relevance: RelevanceConfig,
    pub summary: SummaryConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub ai: AiConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub per_source_cap: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            per_source_cap: DEFAULT_PER_SOURCE_CAP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_output: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub threshold: f32,
    pub batch_size: usize,
    /// Free text telling the scorer what the audience cares about.
    pub interests: String,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            interests: "software engineering, AI and machine learning, developer tools, \
                        open source releases, security advisories"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub batch_size: usize,
    pub output_language: String,
    /// Categories that skip external summarization (gloss stays empty).
    pub exempt_categories: Vec<String>,
    pub max_gloss_chars: usize,
    pub min_content_chars: usize,
    /// Engagement at or above this is appended to a locally built gloss.
    pub engagement_annotate_min: u64,
    /// Engagement at or above this earns a title rewrite call.
    pub engagement_newsworthy_min: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            output_language: "English".to_string(),
            exempt_categories: Vec::new(),
            max_gloss_chars: 100,
            min_content_chars: 50,
            engagement_annotate_min: 100,
            engagement_newsworthy_min: 300,
        }
    }
}

impl SummaryConfig {
    pub fn is_exempt(&self, category: &str) -> bool {
        self.exempt_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("state/history.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Hn,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub category: String,
    pub kind: SourceKind,
    pub url: String,
    /// Overrides `[intake].per_source_cap` for this source.
    #[serde(default)]
    pub cap: Option<usize>,
}

impl CuratorConfig {
    /// Load with env + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default().sanitized()
            }
        };

        if let Some(t) = parse_threshold_env(std::env::var(ENV_RELEVANCE_THRESHOLD).ok()) {
            cfg.relevance.threshold = t;
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading curator config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing curator config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: CuratorConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    /// Replace nonsense values with defaults instead of failing the run.
    pub fn sanitized(mut self) -> Self {
        if self.intake.per_source_cap == 0 {
            self.intake.per_source_cap = DEFAULT_PER_SOURCE_CAP;
        }
        if self.selection.max_output == 0 {
            self.selection.max_output = DEFAULT_MAX_OUTPUT;
        }
        if self.relevance.batch_size == 0 {
            self.relevance.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.summary.batch_size == 0 {
            self.summary.batch_size = DEFAULT_BATCH_SIZE;
        }
        if !self.relevance.threshold.is_finite() {
            self.relevance.threshold = DEFAULT_RELEVANCE_THRESHOLD;
        }
        self.relevance.threshold = self.relevance.threshold.clamp(0.0, 1.0);
        if self.summary.max_gloss_chars == 0 {
            self.summary.max_gloss_chars = SummaryConfig::default().max_gloss_chars;
        }
        if self.summary.output_language.trim().is_empty() {
            self.summary.output_language = SummaryConfig::default().output_language;
        }
        self.summary.exempt_categories = clean_list(std::mem::take(
            &mut self.summary.exempt_categories,
        ));
        self
    }

    /// Intake cap for one source, honoring its override.
    pub fn cap_for(&self, source: &SourceConfig) -> usize {
        source
            .cap
            .filter(|&c| c > 0)
            .unwrap_or(self.intake.per_source_cap)
    }
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
