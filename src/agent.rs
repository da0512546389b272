// src/agent.rs
//! One pipeline run: fetch feeds, synthesize a post, publish it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::AgentConfig;
use crate::generate::{generate_post, GeminiProvider, GenerateError, GenerateOptions, LanguageModel};
use crate::ingest::providers::RssFeedProvider;
use crate::ingest::types::SourceProvider;
use crate::ingest::{fetch_news, FeedLimits};
use crate::publish::{DryRunPublisher, LinkedInPublisher, PublishError, PublishedPost, Publisher};

const USER_AGENT: &str = concat!("linkedin-news-agent/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published(PublishedPost),
    /// No news items survived aggregation; nothing was generated or posted.
    Skipped,
}

pub struct Agent {
    pub providers: Vec<Arc<dyn SourceProvider>>,
    pub limits: FeedLimits,
    pub model: Arc<dyn LanguageModel>,
    pub options: GenerateOptions,
    pub publisher: Arc<dyn Publisher>,
}

impl Agent {
    /// Wire real feeds, Gemini and LinkedIn (or the dry-run publisher) from config.
    pub fn from_config(cfg: &AgentConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building HTTP client")?;

        let providers = cfg
            .feeds
            .iter()
            .map(|f| Arc::new(RssFeedProvider::from_source(f, http.clone())) as Arc<dyn SourceProvider>)
            .collect();

        let publisher: Arc<dyn Publisher> = if cfg.dry_run {
            Arc::new(DryRunPublisher)
        } else {
            Arc::new(LinkedInPublisher::new(&cfg.linkedin, http.clone()))
        };

        Ok(Self {
            providers,
            limits: cfg.feed_limits(),
            model: Arc::new(GeminiProvider::new(&cfg.gemini, http)),
            options: cfg.generate_options(),
            publisher,
        })
    }

    /// Fetch, generate, publish. Empty news ends the run quietly as `Skipped`.
    pub async fn run_once(&self) -> Result<RunOutcome, RunError> {
        tracing::info!(feeds = self.providers.len(), "agent run started");

        let items = fetch_news(&self.providers, &self.limits).await;
        if items.is_empty() {
            tracing::warn!("no news items fetched; skipping post");
            return Ok(RunOutcome::Skipped);
        }

        let post = generate_post(self.model.as_ref(), &items, &self.options)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "post generation failed"))?;
        tracing::info!(post = %post, "generated post preview");

        let published = self
            .publisher
            .publish(&post)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "publishing failed"))?;

        tracing::info!(
            urn = %published.urn,
            publisher = self.publisher.name(),
            "agent run finished"
        );
        Ok(RunOutcome::Published(published))
    }
}
