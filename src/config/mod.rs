// src/config/mod.rs
//! Agent configuration: built-in defaults, optional TOML file, env overrides.
//! Read once at startup and passed down explicitly.

pub mod gemini;
pub mod linkedin;

pub use gemini::GeminiConfig;
pub use linkedin::LinkedInConfig;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generate::GenerateOptions;
use crate::ingest::types::FeedSource;
use crate::ingest::FeedLimits;

pub const ENV_CONFIG_PATH: &str = "AGENT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";
pub const DEFAULT_SCHEDULE: &str = "0 9 * * *";

pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
        FeedSource::new("O'Reilly", "https://feeds.feedburner.com/oreilly/radar"),
        FeedSource::new("AI News", "https://www.artificialintelligence-news.com/feed/"),
        FeedSource::new("Hacker News", "https://feeds.feedburner.com/TheHackersNews"),
        FeedSource::new("The Rundown AI", "https://rss.beehiiv.com/feeds/TNKFQKnpbx.xml"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Cron expression (5-field or seconds-first 6/7-field).
    pub schedule: String,
    /// Run the pipeline once and exit instead of scheduling.
    pub run_now: bool,
    /// Log the post instead of publishing it.
    pub dry_run: bool,
    pub feeds: Vec<FeedSource>,
    pub items_per_feed: usize,
    pub top_items_total: usize,
    pub max_post_chars: usize,
    pub http_timeout_secs: u64,
    /// Serve Prometheus metrics on this address in scheduled mode.
    pub metrics_addr: Option<String>,
    pub gemini: GeminiConfig,
    pub linkedin: LinkedInConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_SCHEDULE.to_string(),
            run_now: false,
            dry_run: false,
            feeds: default_feeds(),
            items_per_feed: 5,
            top_items_total: 10,
            max_post_chars: 3000,
            http_timeout_secs: 20,
            metrics_addr: None,
            gemini: GeminiConfig::default(),
            linkedin: LinkedInConfig::default(),
        }
    }
}

fn env_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

impl AgentConfig {
    /// Parse a TOML file; missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading agent config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing agent config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AgentConfig = toml::from_str(s)?;
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $AGENT_CONFIG_PATH (must exist)
    /// 2) config/agent.toml
    /// 3) built-in defaults
    ///
    /// Environment overrides are applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from_file(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Apply environment overrides through `get` (injectable for tests).
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("CRON_SCHEDULE").filter(|v| !v.trim().is_empty()) {
            self.schedule = v.trim().to_string();
        }
        if let Some(v) = get("RUN_NOW") {
            self.run_now = env_flag(&v);
        }
        if let Some(v) = get("DRY_RUN") {
            self.dry_run = env_flag(&v);
        }
        if let Some(v) = get("METRICS_ADDR").filter(|v| !v.trim().is_empty()) {
            self.metrics_addr = Some(v);
        }
        self.gemini.apply_env(&get);
        self.linkedin.apply_env(&get);
    }

    pub fn feed_limits(&self) -> FeedLimits {
        FeedLimits {
            items_per_feed: self.items_per_feed,
            top_items_total: self.top_items_total,
        }
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            max_output_tokens: self.gemini.max_output_tokens,
            max_post_chars: self.max_post_chars,
        }
    }
}

/// A secret given as the literal `"ENV"` (any case) is read from `var`.
pub(crate) fn resolve_secret<F>(value: Option<String>, var: &str, get: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Some(v) if v.trim().eq_ignore_ascii_case("env") => get(var),
        Some(v) if v.trim().is_empty() => None,
        other => other,
    }
}
