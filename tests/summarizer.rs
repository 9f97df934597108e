// tests/summarizer.rs
mod common;

use common::{ScriptedAi, PROSE};
use feed_curator::ai::AiError;
use feed_curator::config::SummaryConfig;
use feed_curator::summarize::Summarizer;
use feed_curator::types::{CandidateItem, ScoredItem};

fn scored(id: &str, title: &str, category: &str, content: Option<&str>) -> ScoredItem {
    let mut c = CandidateItem::new(id, title, "Feed", category);
    if let Some(s) = content {
        c = c.with_content(s);
    }
    ScoredItem::new(c, 0.8, "fits")
}

#[tokio::test]
async fn filler_gloss_falls_back_to_title() {
    let ai = ScriptedAi::ok(&[r#"{"results":[{"index":1,"text":"details in the article"}]}"#]);
    let s = Summarizer::new(Some(ai), SummaryConfig::default());
    let out = s
        .summarize(vec![scored("https://x/1", "Interesting Tech Article", "tech", Some(PROSE))])
        .await;
    assert_eq!(out[0].gloss, "Interesting Tech Article");
}

#[tokio::test]
async fn fact_bearing_gloss_is_kept_and_sanitized() {
    let ai = ScriptedAi::ok(&[
        "```json\n{\"results\":[{\"index\":1,\"text\":\"Work-stealing\\n scheduler cuts p99 latency 40%\"}]}\n```",
    ]);
    let s = Summarizer::new(Some(ai.clone()), SummaryConfig::default());
    let out = s
        .summarize(vec![scored("https://x/1", "Runtime 2.0 released", "tech", Some(PROSE))])
        .await;
    assert_eq!(out[0].gloss, "Work-stealing scheduler cuts p99 latency 40%");
    assert!(ai.user_prompts()[0].contains("Content: The release replaces"));
}

#[tokio::test]
async fn newsworthy_thin_item_takes_rewrite_path() {
    let cfg = SummaryConfig {
        output_language: "Japanese".into(),
        ..SummaryConfig::default()
    };
    let ai = ScriptedAi::ok(&[r#"{"results":[{"index":1,"text":"Show HN: 小さなデータベース"}]}"#]);
    let s = Summarizer::new(Some(ai.clone()), cfg);
    let out = s
        .summarize(vec![scored(
            "https://db.example/",
            "Show HN: a tiny database",
            "tech",
            Some("HN Score: 500, 150 comments"),
        )])
        .await;

    assert_eq!(out[0].gloss, "Show HN: 小さなデータベース (500 points, 150 comments)");
    assert_eq!(ai.calls(), 1);
    let system = &ai.system_prompts()[0];
    assert!(system.contains("Translate each numbered headline"));
    assert!(system.contains("Japanese"));
    assert!(!ai.user_prompts()[0].contains("HN Score"));
}

#[tokio::test]
async fn exempt_items_are_never_sent() {
    let cfg = SummaryConfig {
        exempt_categories: vec!["jp".into()],
        ..SummaryConfig::default()
    };
    let ai = ScriptedAi::ok(&[
        r#"{"results":[{"index":1,"text":"Adds vector search via a loadable extension"},{"index":2,"text":"Drops Python 3.8; wheels for musl"}]}"#,
    ]);
    let s = Summarizer::new(Some(ai.clone()), cfg);
    let out = s
        .summarize(vec![
            scored("https://x/jp", "日本語の記事タイトル", "JP", Some(PROSE)),
            scored("https://x/1", "SQLite 3.50", "tech", Some(PROSE)),
            scored("https://x/2", "numpy 2.3", "tech", Some(PROSE)),
        ])
        .await;

    assert_eq!(out[0].gloss, "");
    assert_eq!(out[1].gloss, "Adds vector search via a loadable extension");
    assert_eq!(out[2].gloss, "Drops Python 3.8; wheels for musl");
    assert_eq!(ai.calls(), 1);
    let user = &ai.user_prompts()[0];
    assert!(!user.contains("日本語の記事タイトル"));
    assert!(user.contains("1. Title: SQLite 3.50"));
}

#[tokio::test]
async fn all_exempt_makes_no_call() {
    let cfg = SummaryConfig {
        exempt_categories: vec!["jp".into()],
        ..SummaryConfig::default()
    };
    let ai = ScriptedAi::ok(&[]);
    let s = Summarizer::new(Some(ai.clone()), cfg);
    let out = s
        .summarize(vec![
            scored("https://x/1", "一", "jp", Some(PROSE)),
            scored("https://x/2", "二", "jp", None),
        ])
        .await;
    assert!(out.iter().all(|c| c.gloss.is_empty()));
    assert_eq!(ai.calls(), 0);
}

#[tokio::test]
async fn gloss_is_never_empty_for_non_exempt_items() {
    let replies = vec![
        Ok(r#"{"results":[{"index":1,"text":""},{"index":2,"text":"   "},{"index":3,"text":"See the article"},{"index":4,"text":"about rust"},{"index":6,"text":"ok"}]}"#.to_string()),
        Err(AiError::Api { status: 500 }),
        Ok("garbage".to_string()),
    ];
    let ai = ScriptedAi::new(replies);
    let cfg = SummaryConfig {
        batch_size: 4,
        ..SummaryConfig::default()
    };
    let s = Summarizer::new(Some(ai), cfg);

    let mut items = Vec::new();
    for i in 1..=8 {
        items.push(scored(&format!("https://x/{i}"), &format!("Title {i}"), "tech", Some(PROSE)));
    }
    items.push(scored("https://x/thin", "Thin", "tech", Some("short")));
    items.push(scored("https://x/none", "Nothing", "tech", None));
    items.push(scored("https://x/hot", "Hot", "tech", Some("Points: 900")));

    let out = s.summarize(items).await;
    assert_eq!(out.len(), 11);
    for c in &out {
        assert!(!c.gloss.trim().is_empty(), "empty gloss for {}", c.identifier());
    }
    // order preserved
    assert_eq!(out[0].identifier(), "https://x/1");
    assert_eq!(out[10].identifier(), "https://x/hot");
    assert_eq!(out[0].gloss, "Title 1");
    assert_eq!(out[2].gloss, "Title 3");
    // rewrite batch hit "garbage": title plus the engagement label
    assert_eq!(out[10].gloss, "Hot (900 points)");
}
