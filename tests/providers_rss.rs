// tests/providers_rss.rs
mod common;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use linkedin_news_agent::ingest::providers::RssFeedProvider;
use linkedin_news_agent::ingest::types::{FeedSource, SourceProvider};

const TECHCRUNCH_XML: &str = include_str!("fixtures/techcrunch_rss.xml");
const RUNDOWN_XML: &str = include_str!("fixtures/rundown_atom.xml");

async fn feed_server() -> String {
    let app = Router::new()
        .route("/rss", get(|| async { TECHCRUNCH_XML }))
        .route("/atom", get(|| async { RUNDOWN_XML }))
        .route("/down", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }))
        .route("/html", get(|| async { "<html><body>not a feed</div></html>" }));
    common::spawn_server(app).await
}

fn provider(base: &str, path: &str) -> RssFeedProvider {
    RssFeedProvider::from_source(
        &FeedSource::new("Mock", format!("{base}{path}")),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn rss_over_http_keeps_feed_order() {
    let base = feed_server().await;
    let p = provider(&base, "/rss");
    assert_eq!(p.name(), "Mock");

    let entries = p.fetch_entries().await.expect("rss ok");
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries[0].title.as_deref(),
        Some("Chipmaker unveils 2nm AI accelerator")
    );
    assert!(entries[0].published_at.is_some());
    // dc:date is used when pubDate is absent
    assert!(entries[3].published_at.is_some());
    assert!(entries[2].content.as_deref().unwrap_or_default().contains("community model"));
}

#[tokio::test]
async fn atom_over_http() {
    let base = feed_server().await;
    let entries = provider(&base, "/atom").fetch_entries().await.expect("atom ok");
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[1].link.as_deref(),
        Some("https://rundown.ai/audit-guidance")
    );
    // `updated` stands in for a missing `published`
    assert!(entries[1].published_at.is_some());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let base = feed_server().await;
    let err = provider(&base, "/down").fetch_entries().await.unwrap_err();
    assert!(format!("{err:#}").contains("503"));
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let base = feed_server().await;
    assert!(provider(&base, "/html").fetch_entries().await.is_err());
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    let p = RssFeedProvider::from_source(
        &FeedSource::new("Nowhere", "http://127.0.0.1:9/feed"),
        reqwest::Client::new(),
    );
    assert!(p.fetch_entries().await.is_err());
}
