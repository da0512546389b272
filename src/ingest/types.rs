// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// A configured feed: display name + address.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One entry as the provider parsed it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Short description / Atom summary (may contain HTML).
    pub description: Option<String>,
    /// Full body (`content:encoded` / Atom content), used when no description exists.
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Normalized article handed to the synthesizer. Ephemeral, one run only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub summary: String, // <= 300 chars
    pub link: String,
    pub published_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Entries in the order the feed lists them.
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &str;
}
