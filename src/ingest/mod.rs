// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{FeedEntry, NewsItem, SourceProvider};

/// Max characters kept from an entry's description/content.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_fetch_errors_total",
            "Feed sources that failed to fetch or parse."
        );
        describe_counter!(
            "feed_items_kept_total",
            "News items kept after capping, normalization and ranking."
        );
        describe_counter!(
            "feed_items_dropped_total",
            "Entries dropped because their title was empty."
        );
        describe_gauge!(
            "feed_aggregate_last_run_ts",
            "Unix ts when feeds were last aggregated."
        );
    });
}

/// Per-run caps applied while merging feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedLimits {
    pub items_per_feed: usize,
    pub top_items_total: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            items_per_feed: 5,
            top_items_total: 10,
        }
    }
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Plain-text snippet of at most `SUMMARY_MAX_CHARS` characters.
pub fn snippet(raw: &str) -> String {
    let text = normalize_text(raw);
    let cut: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    cut.trim().to_string()
}

/// Turn a raw entry into a `NewsItem`. Missing dates fall back to `now`.
pub fn normalize_entry(source: &str, entry: FeedEntry, now: DateTime<Utc>) -> NewsItem {
    let title = entry
        .title
        .as_deref()
        .map(|t| normalize_text(t))
        .unwrap_or_default();
    let body = entry
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or(entry.content.as_deref())
        .unwrap_or_default();

    NewsItem {
        source: source.to_string(),
        title,
        summary: snippet(body),
        link: entry.link.map(|l| l.trim().to_string()).unwrap_or_default(),
        published_at: entry.published_at.unwrap_or(now),
    }
}

/// Merge per-source outcomes into the ranked item list.
///
/// Failed sources contribute nothing. Each source is capped at
/// `items_per_feed` (in feed order) before empty titles are dropped; the
/// union is sorted newest-first and cut to `top_items_total`.
pub fn aggregate(
    results: Vec<(String, anyhow::Result<Vec<FeedEntry>>)>,
    limits: &FeedLimits,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut all = Vec::new();
    let mut dropped = 0usize;
    for (source, result) in results {
        let entries = match result {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), source = %source, "feed failed");
                counter!("feed_fetch_errors_total").increment(1);
                continue;
            }
        };

        for entry in entries.into_iter().take(limits.items_per_feed) {
            let item = normalize_entry(&source, entry, now);
            if item.title.is_empty() {
                dropped += 1;
                continue;
            }
            all.push(item);
        }
    }

    // Stable sort: ties keep source order.
    all.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    all.truncate(limits.top_items_total);

    counter!("feed_items_kept_total").increment(all.len() as u64);
    counter!("feed_items_dropped_total").increment(dropped as u64);
    gauge!("feed_aggregate_last_run_ts").set(now.timestamp() as f64);

    all
}

/// Fetch every provider concurrently and aggregate the results.
///
/// One task per source; all tasks are joined before merging. A failing or
/// panicking source only loses its own slot.
pub async fn fetch_news(
    providers: &[Arc<dyn SourceProvider>],
    limits: &FeedLimits,
) -> Vec<NewsItem> {
    let now = Utc::now();

    let handles: Vec<_> = providers
        .iter()
        .map(|p| {
            let p = Arc::clone(p);
            let name = p.name().to_string();
            (name, tokio::spawn(async move { p.fetch_entries().await }))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(r) => r,
            Err(join_err) => Err(anyhow!("fetch task aborted: {join_err}")),
        };
        results.push((name, outcome));
    }

    let items = aggregate(results, limits, now);
    tracing::info!(
        items = items.len(),
        feeds = providers.len(),
        "fetched news items"
    );
    items
}
