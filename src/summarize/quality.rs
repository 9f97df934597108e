// src/summarize/quality.rs
//! Low-quality gloss detection.
//!
//! A [`QualityGate`] is an ordered list of tagged [`GlossCheck`]s. The first check
//! that fires rejects the gloss and the caller falls back to the original title.
//! New heuristics are added as checks; the summarizer's control flow stays as is.

use regex::Regex;

/// Lowercase, keep only alphanumerics (any script: Latin, CJK, kana, Hangul...).
pub fn normalize_for_compare(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Shared character multiset size divided by the longer length. 0.0 for empty input.
pub fn char_overlap_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let mut b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let mut shared = 0usize;
    for ch in &a {
        if let Some(pos) = b.iter().position(|x| x == ch) {
            b.swap_remove(pos);
            shared += 1;
        }
    }
    shared as f32 / longest as f32
}

#[derive(Debug, Clone)]
pub enum GlossCheck {
    /// Nothing left after trimming.
    Empty,
    /// Generic filler that carries no fact.
    Filler { tag: &'static str, pattern: Regex },
    /// Same characters as the title once normalized.
    SameAsTitle,
    /// Mostly the title's characters and not meaningfully longer.
    TitleOverlap { max_ratio: f32, max_growth: f32 },
}

impl GlossCheck {
    pub fn filler(tag: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Filler {
            tag,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            GlossCheck::Empty => "empty",
            GlossCheck::Filler { tag, .. } => tag,
            GlossCheck::SameAsTitle => "same_as_title",
            GlossCheck::TitleOverlap { .. } => "title_overlap",
        }
    }

    /// True when the gloss should be rejected.
    pub fn rejects(&self, gloss: &str, title: &str) -> bool {
        match self {
            GlossCheck::Empty => gloss.trim().is_empty(),
            GlossCheck::Filler { pattern, .. } => pattern.is_match(gloss.trim()),
            GlossCheck::SameAsTitle => {
                let g = normalize_for_compare(gloss);
                !g.is_empty() && g == normalize_for_compare(title)
            }
            GlossCheck::TitleOverlap {
                max_ratio,
                max_growth,
            } => {
                let g = normalize_for_compare(gloss);
                let t = normalize_for_compare(title);
                if g.is_empty() || t.is_empty() {
                    return false;
                }
                let g_len = g.chars().count() as f32;
                let t_len = t.chars().count() as f32;
                let not_longer = g_len <= t_len * max_growth;
                not_longer && char_overlap_ratio(&g, &t) > *max_ratio
            }
        }
    }
}

// (tag, pattern) for the default filler list
const FILLER_PATTERNS: &[(&str, &str)] = &[
    (
        "see_article",
        r"(?i)\b(see|read|check)( out)? (the )?(full |original |linked )?(article|post|link|source|story)\b",
    ),
    (
        "details_in_article",
        r"(?i)\bdetails?( are| can be found)? (in|at|on) the (article|post|link|source|story)\b",
    ),
    ("click_through", r"(?i)\b(click (here|the link)|read more|learn more)\b"),
    (
        "bare_announcement",
        r"(?i)^an? (new )?[\p{L}\p{N}.\-]+( [\p{L}\p{N}.\-]+)? (was|has been|is|were|have been) (announced|released|launched|published|introduced)[.!]?$",
    ),
    ("about_phrase", r"(?i)^(an? (article|post|story) )?(about|regarding|on) \S"),
    ("see_article_ja", r"(詳細|詳しく)は(記事|リンク先|元記事)"),
    ("about_phrase_ja", r"^.{1,40}(についての|に関する)(記事|話題|ニュース)です?。?$"),
];

#[derive(Debug, Clone)]
pub struct QualityGate {
    checks: Vec<GlossCheck>,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::standard()
    }
}

impl QualityGate {
    pub fn new(checks: Vec<GlossCheck>) -> Self {
        Self { checks }
    }

    /// Full gate for summaries: empty, fillers, same-as-title, title overlap > 0.8.
    pub fn standard() -> Self {
        let mut checks = vec![GlossCheck::Empty];
        checks.extend(default_fillers());
        checks.push(GlossCheck::SameAsTitle);
        checks.push(GlossCheck::TitleOverlap {
            max_ratio: 0.8,
            max_growth: 1.2,
        });
        Self { checks }
    }

    /// Gate for title rewrites, where resemblance to the title is expected.
    pub fn rewrite() -> Self {
        let mut checks = vec![GlossCheck::Empty];
        checks.extend(default_fillers());
        Self { checks }
    }

    pub fn with_check(mut self, check: GlossCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// `Err(tag)` of the first check that rejects the gloss.
    pub fn verdict(&self, gloss: &str, title: &str) -> Result<(), &'static str> {
        match self.checks.iter().find(|c| c.rejects(gloss, title)) {
            Some(c) => Err(c.tag()),
            None => Ok(()),
        }
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.checks.iter().map(GlossCheck::tag).collect()
    }
}

fn default_fillers() -> Vec<GlossCheck> {
    FILLER_PATTERNS
        .iter()
        .filter_map(|(tag, pat)| match GlossCheck::filler(tag, pat) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::error!(target: "summarize", tag, error = %e, "invalid filler pattern skipped");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_letters_of_any_script() {
        assert_eq!(normalize_for_compare("Rust 1.80: It's Out!"), "rust180itsout");
        assert_eq!(normalize_for_compare("新しい Rust、登場！"), "新しいrust登場");
    }

    #[test]
    fn overlap_ratio_bounds() {
        assert_eq!(char_overlap_ratio("", ""), 0.0);
        assert_eq!(char_overlap_ratio("abc", "abc"), 1.0);
        assert_eq!(char_overlap_ratio("abc", "xyz"), 0.0);
        assert!((char_overlap_ratio("aab", "ab") - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn all_default_patterns_compile() {
        let gate = QualityGate::standard();
        assert_eq!(gate.tags().len(), 3 + FILLER_PATTERNS.len());
    }

    #[test]
    fn rejects_filler_and_title_echoes() {
        let gate = QualityGate::standard();
        let title = "Interesting Tech Article";
        assert_eq!(gate.verdict("", title), Err("empty"));
        assert_eq!(gate.verdict("details in the article", title), Err("details_in_article"));
        assert_eq!(gate.verdict("See the full article for more.", title), Err("see_article"));
        assert_eq!(gate.verdict("A new framework was released.", title), Err("bare_announcement"));
        assert_eq!(gate.verdict("About interesting tech", title), Err("about_phrase"));
        assert_eq!(gate.verdict("interesting tech article!", title), Err("same_as_title"));
        assert_eq!(gate.verdict("Interesting tech articles", title), Err("title_overlap"));
        assert_eq!(gate.verdict("詳細は記事をご覧ください", "新機能"), Err("see_article_ja"));
    }

    #[test]
    fn accepts_fact_bearing_gloss() {
        let gate = QualityGate::standard();
        let title = "Tokio 2.0 released";
        assert!(gate
            .verdict("Drops the global runtime; io_uring backend now default on Linux 6.x, MIT licensed", title)
            .is_ok());
    }

    #[test]
    fn long_gloss_reusing_title_chars_is_kept() {
        let gate = QualityGate::standard();
        let title = "SQLite adds vector search";
        let gloss = "SQLite adds vector search via a loadable extension; 3x faster than brute force on 1M rows";
        assert!(gate.verdict(gloss, title).is_ok());
    }

    #[test]
    fn rewrite_gate_allows_title_like_output() {
        let gate = QualityGate::rewrite();
        assert!(gate.verdict("Show HN: 小さなデータベース", "Show HN: a tiny database").is_ok());
        assert!(gate.verdict("Show HN: a tiny database", "Show HN: a tiny database").is_ok());
        assert_eq!(gate.verdict("  ", "x"), Err("empty"));
    }
}
