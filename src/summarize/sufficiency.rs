// src/summarize/sufficiency.rs
//! Does an item carry enough source material to be worth a summarization call?
//!
//! Connectors for link aggregators often put only an engagement annotation in
//! `raw_content` ("HN Score: 500, 150 comments"). That is metadata, not prose,
//! so it never counts as sufficient, but the engagement number is still useful.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::CandidateItem;

static RE_SEGMENT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:,\s+|;|\||\n)\s*").expect("segment split regex"));

// "Score: 500", "Stars = 1.2k", "Language: Rust"
static RE_KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L} ]{1,24}\s*[:=]\s*[\p{L}\p{N}.,+#\-]{1,24}$").expect("key/value regex")
});

// "150 comments", "1,024 stars today"
static RE_COUNT_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d,.]+[kK]?\s+\p{L}+(?:\s+\p{L}+)?$").expect("count/word regex")
});

static RE_SCORE_KEYED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(score|points|stars|upvotes)\s*[:=]?\s*([\d,]+)").expect("score regex")
});

static RE_SCORE_TRAILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([\d,]+)\s+(points|stars|upvotes)\b").expect("score regex")
});

static RE_COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:([\d,]+)\s+comments?\b|comments?\s*[:=]\s*([\d,]+))")
        .expect("comments regex")
});

/// Engagement signal parsed from raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engagement {
    pub value: u64,
    /// "points", "stars" or "upvotes".
    pub unit: &'static str,
    pub comments: Option<u64>,
}

impl Engagement {
    /// Human label, e.g. "500 points, 150 comments".
    pub fn label(&self) -> String {
        match self.comments {
            Some(c) => format!("{} {}, {} comments", self.value, self.unit, c),
            None => format!("{} {}", self.value, self.unit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentClass {
    Sufficient,
    Insufficient { engagement: Option<Engagement> },
}

fn parse_count(s: &str) -> Option<u64> {
    s.replace(',', "").parse().ok()
}

fn unit_for(keyword: &str) -> &'static str {
    match keyword.to_ascii_lowercase().as_str() {
        "stars" => "stars",
        "upvotes" => "upvotes",
        _ => "points",
    }
}

pub fn parse_engagement(content: &str) -> Option<Engagement> {
    let (value, unit) = if let Some(caps) = RE_SCORE_KEYED.captures(content) {
        (parse_count(&caps[2])?, unit_for(&caps[1]))
    } else if let Some(caps) = RE_SCORE_TRAILING.captures(content) {
        (parse_count(&caps[1])?, unit_for(&caps[2]))
    } else {
        return None;
    };
    let comments = RE_COMMENTS.captures(content).and_then(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .and_then(|m| parse_count(m.as_str()))
    });
    Some(Engagement {
        value,
        unit,
        comments,
    })
}

/// True when the text is only metadata segments (key/value pairs, counts).
pub fn is_low_info_template(content: &str) -> bool {
    let t = content.trim().trim_end_matches('.');
    if t.is_empty() {
        return true;
    }
    RE_SEGMENT_SPLIT
        .split(t)
        .filter(|seg| !seg.is_empty())
        .all(|seg| RE_KEY_VALUE.is_match(seg) || RE_COUNT_WORD.is_match(seg))
}

pub fn classify(item: &CandidateItem, min_chars: usize) -> ContentClass {
    let content = item.content();
    let sufficient = !content.is_empty()
        && content.chars().count() >= min_chars
        && !is_low_info_template(content);
    if sufficient {
        ContentClass::Sufficient
    } else {
        ContentClass::Insufficient {
            engagement: parse_engagement(content),
        }
    }
}
