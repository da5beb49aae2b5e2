#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Nasdaq market headline source.
//!
//! Reads the public Nasdaq RSS feed and turns its items into [`NewsItem`]s:
//!
//! - titles have leftover `&quot;`/`&#039;` entities unescaped
//! - descriptions have HTML tags removed, entities unescaped, newlines
//!   flattened and are cut to 150 characters plus `...`
//!
//! # Example
//!
//! ```ignore
//! use tape_nasdaq::NasdaqProvider;
//! use tape_core::HeadlineSource;
//!
//! let provider = NasdaqProvider::new();
//! let headlines = provider.fetch_headlines(10).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tape_core::{
    DataError, DataProvider, HeadlineSource, NewsItem, Result,
    text::{clean_summary, unescape_entities},
};

/// Nasdaq RSS feed, Nasdaq category.
const NASDAQ_FEED_URL: &str = "https://www.nasdaq.com/feed/rssoutbound?category=Nasdaq";

/// The feed rejects requests without a user agent.
const USER_AGENT: &str = concat!("tape/", env!("CARGO_PKG_VERSION"));

/// Nasdaq RSS headline source. Needs no credentials.
#[derive(Debug, Clone, Default)]
pub struct NasdaqProvider {
    client: Client,
}

impl NasdaqProvider {
    /// Creates a new Nasdaq provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Nasdaq provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_feed(&self) -> Result<String> {
        tracing::debug!("Nasdaq RSS request");

        let response = self
            .client
            .get(NASDAQ_FEED_URL)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| DataError::unavailable("Nasdaq", e))?;

        if !response.status().is_success() {
            return Err(DataError::unavailable(
                "Nasdaq",
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::unavailable("Nasdaq", e))?;

        if body.trim().is_empty() {
            return Err(DataError::unavailable("Nasdaq", "empty response"));
        }
        Ok(body)
    }
}

impl DataProvider for NasdaqProvider {
    fn name(&self) -> &str {
        "Nasdaq"
    }

    fn description(&self) -> &str {
        "Nasdaq RSS - Market headlines"
    }
}

#[async_trait]
impl HeadlineSource for NasdaqProvider {
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let body = self.fetch_feed().await?;
        let headlines = parse_feed(&body, limit)?;
        tracing::debug!(headlines = headlines.len(), "Nasdaq headlines");
        Ok(headlines)
    }
}

/// Parses an RSS 2.0 document into at most `limit` headlines.
fn parse_feed(xml: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let rss: Rss = quick_xml::de::from_str(xml).map_err(|e| DataError::Parse(e.to_string()))?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .take(limit)
        .map(NewsItem::from)
        .collect())
}

// ============================================================================
// RSS document
// ============================================================================

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

impl From<RssItem> for NewsItem {
    fn from(item: RssItem) -> Self {
        Self {
            headline: unescape_entities(item.title.trim()),
            summary: clean_summary(&item.description),
            url: item.link.trim().to_string(),
            author: None,
            published_at: item
                .pub_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
                .map(|d| d.with_timezone(&Utc)),
            source: Some("Nasdaq".to_string()),
            symbols: Vec::new(),
        }
    }
}
