use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::{FeedEntry, FeedSource, SourceProvider};

// ---- RSS 2.0 / RSS 1.0 (RDF) ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Option<Channel>,
    // RDF feeds list items next to the channel, not inside it.
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded", alias = "encoded")]
    content_encoded: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(default)]
    link: Vec<AtomLink>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element text that may carry attributes (`<title type="html">`).
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

impl AtomEntry {
    fn alternate_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
            .or_else(|| self.link.first())
            .and_then(|l| l.href.clone())
    }
}

/// RFC 2822 (RSS) or RFC 3339 (Atom, dc:date) to UTC.
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let odt = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    Utc.timestamp_opt(odt.unix_timestamp(), odt.nanosecond()).single()
}

/// Parse an RSS 2.0, RSS 1.0 or Atom document into entries (feed order).
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let entries = match from_str::<Rss>(&xml_clean) {
        Ok(rss) if rss.channel.is_some() || !rss.item.is_empty() => {
            let mut items = rss.item;
            if let Some(ch) = rss.channel {
                items.extend(ch.item);
            }
            items.into_iter().map(rss_entry).collect()
        }
        _ => {
            let atom: AtomFeed = from_str(&xml_clean).context("parsing feed xml (rss/atom)")?;
            atom.entry.into_iter().map(atom_entry).collect()
        }
    };

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(entries)
}

fn rss_entry(it: Item) -> FeedEntry {
    let published_at = it
        .pub_date
        .as_deref()
        .or(it.dc_date.as_deref())
        .and_then(parse_feed_date);
    FeedEntry {
        title: it.title,
        link: it.link,
        description: it.description,
        content: it.content_encoded,
        published_at,
    }
}

fn atom_entry(e: AtomEntry) -> FeedEntry {
    let link = e.alternate_link();
    let published_at = e
        .published
        .as_deref()
        .or(e.updated.as_deref())
        .and_then(parse_feed_date);
    FeedEntry {
        title: e.title.map(|t| t.text),
        link,
        description: e.summary.map(|t| t.text),
        content: e.content.map(|t| t.text),
        published_at,
    }
}

pub struct RssFeedProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeedProvider {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_source(source: &FeedSource, client: reqwest::Client) -> Self {
        Self {
            name: source.name.clone(),
            mode: Mode::Http {
                url: source.url.clone(),
                client,
            },
        }
    }
}

#[async_trait]
impl SourceProvider for RssFeedProvider {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(anyhow!("GET {url} returned {status}"));
                }
                let body = resp.text().await.context("reading feed body")?;
                parse_feed(&body).with_context(|| format!("feed at {url}"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// HTML entities are not valid XML; map the common ones before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
