//! External scoring/summarizing collaborator.
//!
//! The pipeline only needs "send a system + user prompt, get text back, maybe fail".
//! Prompt construction lives in [`prompts`], reply validation in [`reply`].

pub mod prompts;
pub mod reply;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;

/// Failure talking to the collaborator. A readable completion whose text does
/// not validate is caught by the caller instead (see [`reply`]).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AiError {
    /// Non-success HTTP status.
    #[error("api error: status {status}")]
    Api { status: u16 },
    /// Network error or timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// Success status, but the body is not a completion.
    #[error("malformed completion: {0}")]
    Malformed(String),
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait object used by the relevance filter and the summarizer.
pub trait AiClient: Send + Sync {
    /// One chat-style completion. Returns the raw assistant text.
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, AiError>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynAiClient = Arc<dyn AiClient>;

/// Factory: `None` when AI is disabled or no credential is configured.
pub fn build_client_from_config(config: &AiConfig) -> Option<DynAiClient> {
    let key = config.resolved_api_key()?;
    match config.provider.to_ascii_lowercase().as_str() {
        "openai" => match OpenAiClient::new(key, &config.model, &config.base_url) {
            Ok(c) => Some(Arc::new(c)),
            Err(e) => {
                tracing::warn!(error = %e, "could not build AI http client; running without AI");
                None
            }
        },
        other => {
            tracing::warn!(provider = other, "unsupported AI provider; running without AI");
            None
        }
    }
}

/// OpenAI-compatible Chat Completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("feed-curator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()?;
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            endpoint,
        })
    }

    async fn complete_impl(&self, system: &str, user: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        completion_text(&bytes)
    }
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// First choice's message content. A body that is not a completion envelope is `Malformed`.
fn completion_text(body: &[u8]) -> Result<String, AiError> {
    let resp: Resp =
        serde_json::from_slice(body).map_err(|e| AiError::Malformed(e.to_string()))?;
    Ok(resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

impl AiClient for OpenAiClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, AiError>> {
        Box::pin(self.complete_impl(system, user))
    }
    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Collapse whitespace to a single line and cap at `max_chars` characters.
pub fn sanitize_line(input: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_chars * 4));
    let mut prev_space = false;
    let mut count = 0usize;
    for ch in input.chars() {
        let c = if ch.is_whitespace() || ch.is_control() {
            ' '
        } else {
            ch
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
                count += 1;
            }
            prev_space = true;
        } else {
            out.push(c);
            count += 1;
            prev_space = false;
        }
        if count >= max_chars {
            break;
        }
    }
    out.trim().to_string()
}
