// src/config/gemini.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::resolve_secret;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_max_output_tokens() -> u32 {
    1024
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// `"ENV"` means: read from GEMINI_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl GeminiConfig {
    pub(crate) fn apply_env<F>(&mut self, get: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = get(ENV_API_KEY).filter(|v| !v.trim().is_empty());
        self.api_key = from_env.or_else(|| resolve_secret(self.api_key.take(), ENV_API_KEY, get));
        if let Some(m) = get("GEMINI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = m.trim().to_string();
        }
    }
}

// Only the key length is ever printed.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key_len", &self.api_key.as_ref().map(|k| k.len()))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}
