// src/ai/prompts.rs
//! Prompt builders. Every request is a 1-based numbered list so replies can be
//! mapped back by index.

use std::fmt::Write as _;

/// Characters of supporting content sent per item.
pub const EXCERPT_CHARS: usize = 300;

/// One numbered entry in a batch request.
#[derive(Debug, Clone, Copy)]
pub struct PromptEntry<'a> {
    pub title: &'a str,
    pub source: &'a str,
    pub content: &'a str,
}

pub fn excerpt(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}

fn numbered_list(entries: &[PromptEntry<'_>], with_content: bool) -> String {
    let mut out = String::new();
    for (i, e) in entries.iter().enumerate() {
        let _ = writeln!(out, "{}. Title: {}", i + 1, e.title);
        let _ = writeln!(out, "   Source: {}", e.source);
        if with_content {
            let ex = excerpt(e.content, EXCERPT_CHARS);
            if !ex.is_empty() {
                let _ = writeln!(out, "   Content: {ex}");
            }
        }
    }
    out
}

pub fn relevance_system(interests: &str, threshold: f32) -> String {
    format!(
        "You curate a news digest for readers interested in: {interests}.\n\
         Rate how relevant each numbered item is for these readers with a score from 0.0 to 1.0 \
         and a short reason (max 12 words).\n\
         Omit items scoring below {threshold:.2}.\n\
         Respond with JSON only: {{\"results\":[{{\"index\":1,\"score\":0.8,\"reason\":\"...\"}}]}}"
    )
}

pub fn relevance_user(entries: &[PromptEntry<'_>]) -> String {
    format!("Items:\n{}", numbered_list(entries, true))
}

pub fn summary_system(language: &str, max_chars: usize) -> String {
    format!(
        "You write one-line glosses for a news digest, in {language}.\n\
         For each numbered item write ONE terse sentence of at most {max_chars} characters.\n\
         Surface concrete facts: numbers, named techniques or products, license or availability, \
         target audience. Do not paraphrase the title. No filler such as \"see the article\".\n\
         If no such fact can be extracted, return the original title verbatim.\n\
         Respond with JSON only: {{\"results\":[{{\"index\":1,\"text\":\"...\"}}]}}"
    )
}

pub fn summary_user(entries: &[PromptEntry<'_>]) -> String {
    format!("Items:\n{}", numbered_list(entries, true))
}

pub fn rewrite_system(language: &str, max_chars: usize) -> String {
    format!(
        "Translate each numbered headline into natural {language} of at most {max_chars} characters. \
         Keep names, numbers and product names unchanged. Do not add information.\n\
         Respond with JSON only: {{\"results\":[{{\"index\":1,\"text\":\"...\"}}]}}"
    )
}

pub fn rewrite_user(entries: &[PromptEntry<'_>]) -> String {
    format!("Headlines:\n{}", numbered_list(entries, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_one_based_and_truncates_content() {
        let long = "x".repeat(400);
        let entries = [
            PromptEntry {
                title: "First",
                source: "Feed A",
                content: "",
            },
            PromptEntry {
                title: "Second",
                source: "Feed B",
                content: &long,
            },
        ];
        let s = relevance_user(&entries);
        assert!(s.contains("1. Title: First"));
        assert!(s.contains("2. Title: Second"));
        assert!(!s.contains(&long));
        assert!(s.contains(&format!("{}…", "x".repeat(EXCERPT_CHARS))));
        // empty content line is omitted
        assert_eq!(s.matches("Content:").count(), 1);
    }

    #[test]
    fn rewrite_prompt_omits_content() {
        let entries = [PromptEntry {
            title: "Show HN: a tiny database",
            source: "Hacker News",
            content: "HN Score: 500, 150 comments",
        }];
        let s = rewrite_user(&entries);
        assert!(s.contains("Show HN: a tiny database"));
        assert!(!s.contains("HN Score"));
    }
}
