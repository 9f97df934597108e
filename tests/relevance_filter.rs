// tests/relevance_filter.rs
mod common;

use common::{candidate, uniform_scores, ScriptedAi};
use feed_curator::ai::AiError;
use feed_curator::config::RelevanceConfig;
use feed_curator::relevance::{
    RelevanceFilter, FALLBACK_SCORE, REASON_API_ERROR, REASON_MALFORMED, REASON_TRANSPORT,
    REASON_UNFILTERED,
};
use feed_curator::types::CandidateItem;

fn two() -> Vec<CandidateItem> {
    vec![candidate("https://x/a", "A"), candidate("https://x/b", "B")]
}

fn ids(out: &[feed_curator::types::ScoredItem]) -> Vec<&str> {
    out.iter().map(|s| s.identifier()).collect()
}

#[tokio::test]
async fn no_credential_passes_everything_through() {
    let f = RelevanceFilter::new(None, &RelevanceConfig::default());
    let out = f.filter(two()).await;
    assert_eq!(ids(&out), vec!["https://x/a", "https://x/b"]);
    assert!(out
        .iter()
        .all(|s| s.relevance_score == 0.5 && s.relevance_reason == REASON_UNFILTERED));
}

#[tokio::test]
async fn failing_scorer_fails_open_with_reason() {
    for (reply, reason) in [
        (Err(AiError::Api { status: 429 }), REASON_API_ERROR),
        (Err(AiError::Transport("connection reset".into())), REASON_TRANSPORT),
        (Err(AiError::Malformed("expected value at line 1".into())), REASON_MALFORMED),
        (Ok("I cannot help with that.".to_string()), REASON_MALFORMED),
        (Ok(r#"{"scores":{"1":0.9}}"#.to_string()), REASON_MALFORMED),
    ] {
        let ai = ScriptedAi::new(vec![reply]);
        let f = RelevanceFilter::new(Some(ai), &RelevanceConfig::default());
        let out = f.filter(two()).await;
        assert_eq!(out.len(), 2, "never fewer items than input ({reason})");
        assert!(out
            .iter()
            .all(|s| s.relevance_score == FALLBACK_SCORE && s.relevance_reason == reason));
    }
}

#[tokio::test]
async fn boundary_score_passes_and_just_below_fails() {
    let ai = ScriptedAi::ok(&[
        r#"{"results":[{"index":1,"score":0.5,"reason":"borderline"},{"index":2,"score":0.499,"reason":"close"}]}"#,
    ]);
    let f = RelevanceFilter::new(Some(ai), &RelevanceConfig::default());
    let out = f.filter(two()).await;
    assert_eq!(ids(&out), vec!["https://x/a"]);
    assert_eq!(out[0].relevance_score, 0.5);

    // below the threshold by less than f32 precision
    let ai = ScriptedAi::ok(&[r#"{"results":[{"index":1,"score":0.49999999,"reason":"close"}]}"#]);
    let f = RelevanceFilter::new(Some(ai), &RelevanceConfig::default());
    let out = f.filter(two()).await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn only_failed_batch_degrades() {
    let cands: Vec<CandidateItem> = (1..=25)
        .map(|i| candidate(&format!("https://x/{i}"), &format!("Item {i}")))
        .collect();
    // first batch (20) scored at 0.9, second batch (5) errors
    let ai = ScriptedAi::new(vec![
        Ok(uniform_scores(20, 0.9)),
        Err(AiError::Transport("timeout".into())),
    ]);
    let f = RelevanceFilter::new(Some(ai.clone()), &RelevanceConfig::default());
    let out = f.filter(cands).await;

    assert_eq!(ai.calls(), 2);
    assert_eq!(out.len(), 25);
    assert!(out[..20].iter().all(|s| s.relevance_score == 0.9));
    assert!(out[20..].iter().all(|s| s.relevance_reason == REASON_TRANSPORT));
    assert_eq!(out[20].identifier(), "https://x/21");
}

#[tokio::test]
async fn output_sorted_desc_and_stable_on_ties() {
    let cands: Vec<CandidateItem> = ["a", "b", "c", "d"]
        .iter()
        .map(|s| candidate(&format!("https://x/{s}"), s))
        .collect();
    let ai = ScriptedAi::ok(&[
        r#"{"results":[{"index":1,"score":0.6},{"index":2,"score":0.9},{"index":3,"score":0.6},{"index":4,"score":0.9}]}"#,
    ]);
    let f = RelevanceFilter::new(Some(ai), &RelevanceConfig::default());
    let out = f.filter(cands).await;
    assert_eq!(
        ids(&out),
        vec!["https://x/b", "https://x/d", "https://x/a", "https://x/c"]
    );
}

#[tokio::test]
async fn prompts_carry_numbered_items_and_respect_batch_size() {
    let cfg = RelevanceConfig {
        batch_size: 2,
        ..RelevanceConfig::default()
    };
    let cands: Vec<CandidateItem> = (1..=3)
        .map(|i| candidate(&format!("https://x/{i}"), &format!("Item {i}")))
        .collect();
    let ai = ScriptedAi::ok(&[uniform_scores(2, 0.7).as_str(), uniform_scores(1, 0.7).as_str()]);
    let f = RelevanceFilter::new(Some(ai.clone()), &cfg);
    let out = f.filter(cands).await;

    assert_eq!(out.len(), 3);
    let users = ai.user_prompts();
    assert_eq!(users.len(), 2);
    assert!(users[0].contains("1. Title: Item 1") && users[0].contains("2. Title: Item 2"));
    assert!(users[1].contains("1. Title: Item 3"));
    assert!(!users[1].contains("Item 1"));
}
