// tests/metrics.rs
mod common;

use std::sync::Arc;

use linkedin_news_agent::config::LinkedInConfig;
use linkedin_news_agent::ingest::providers::RssFeedProvider;
use linkedin_news_agent::ingest::types::SourceProvider;
use linkedin_news_agent::ingest::{fetch_news, FeedLimits};
use linkedin_news_agent::metrics::Metrics;
use linkedin_news_agent::publish::{LinkedInPublisher, Publisher};

const TECHCRUNCH_XML: &str = include_str!("fixtures/techcrunch_rss.xml");

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init().expect("recorder installs once per process");
    let base = common::spawn_server(metrics.router()).await;

    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(RssFeedProvider::from_fixture("TechCrunch", TECHCRUNCH_XML)),
        Arc::new(RssFeedProvider::from_fixture("Broken", "<rss><channel></item></rss>")),
    ];
    let items = fetch_news(&providers, &FeedLimits::default()).await;
    assert_eq!(items.len(), 4);

    let publisher = LinkedInPublisher::new(&LinkedInConfig::default(), reqwest::Client::new());
    assert!(publisher.publish("x").await.is_err());

    let text = reqwest::get(format!("{base}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    for needle in [
        "feed_fetch_errors_total 1",
        "feed_items_kept_total 4",
        "feed_items_dropped_total 1",
        "feed_aggregate_last_run_ts",
        "feed_parse_ms",
        "publish_errors_total 1",
    ] {
        assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
    }
}
