// src/config/ai.rs
use serde::Deserialize;
use std::env;

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// `[ai]` section. A missing credential is not an error: the pipeline then runs
/// its pass-through / title-as-gloss fallbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "openai" (any OpenAI-compatible chat completions endpoint)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

impl AiConfig {
    /// Resolve the credential. `None` means "no scorer configured".
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let raw = self.api_key.trim();
        let key = if raw.eq_ignore_ascii_case("env") {
            match self.provider.to_ascii_lowercase().as_str() {
                "openai" => env::var("OPENAI_API_KEY").ok()?,
                _ => return None,
            }
        } else {
            raw.to_string()
        };
        let key = key.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_or_empty_key_resolves_to_none() {
        let cfg = AiConfig::default();
        assert!(cfg.resolved_api_key().is_none());

        let cfg = AiConfig {
            enabled: true,
            api_key: "   ".into(),
            ..AiConfig::default()
        };
        assert!(cfg.resolved_api_key().is_none());
    }

    #[test]
    fn literal_key_is_used() {
        let cfg = AiConfig {
            enabled: true,
            api_key: " sk-test ".into(),
            ..AiConfig::default()
        };
        assert_eq!(cfg.resolved_api_key().as_deref(), Some("sk-test"));
    }

    #[serial_test::serial]
    #[test]
    fn env_key_is_resolved() {
        std::env::set_var("OPENAI_API_KEY", "sk-from-env");
        let cfg = AiConfig {
            enabled: true,
            api_key: "ENV".into(),
            ..AiConfig::default()
        };
        assert_eq!(cfg.resolved_api_key().as_deref(), Some("sk-from-env"));
        std::env::remove_var("OPENAI_API_KEY");
        assert!(cfg.resolved_api_key().is_none());
    }
}
