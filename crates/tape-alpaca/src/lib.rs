#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpaca market data source.
//!
//! This crate implements the tape-core traits for the
//! [Alpaca Market Data](https://docs.alpaca.markets/docs/about-market-data-api) API:
//!
//! - [`BarSource`] - Stock bars (IEX feed, raw prices) at 1Min/5Min/1Hour/1Day
//! - [`MarketMoverSource`] - Screener gainers, losers and most active stocks
//! - [`CryptoQuoteSource`] - Latest crypto quotes
//! - [`SymbolNewsSource`] - News tagged with a symbol
//!
//! # Usage
//!
//! ```rust,ignore
//! use tape_alpaca::AlpacaProvider;
//! use tape_core::{BarSource, Symbol, Timeframe};
//!
//! let provider = AlpacaProvider::new("key_id", "secret_key");
//! let window = Timeframe::FiveDays.window_at(chrono::Utc::now());
//! let bars = provider.fetch_bars(&Symbol::new("AAPL"), &window).await?;
//! ```

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tape_core::{
    ActiveStock, BarSource, CryptoQuote, CryptoQuoteSource, DataError, DataProvider,
    MarketMoverSource, MarketMovers, MoverQuote, NewsItem, RawBar, Result, SamplingInterval,
    Symbol, SymbolNewsSource, TimeframeWindow, parse_timestamp,
};

/// Base URL for the Alpaca market data API.
const ALPACA_DATA_URL: &str = "https://data.alpaca.markets";

/// Page size requested from the bars endpoint.
const BARS_PAGE_LIMIT: usize = 1000;

/// Upper bound on followed `next_page_token`s for a single bars request.
const MAX_BAR_PAGES: usize = 50;

/// Supported bar intervals for Alpaca.
const SUPPORTED_INTERVALS: &[SamplingInterval] = &[
    SamplingInterval::OneMinute,
    SamplingInterval::FiveMinute,
    SamplingInterval::OneHour,
    SamplingInterval::OneDay,
];

/// Alpaca market data source.
#[derive(Clone)]
pub struct AlpacaProvider {
    client: Client,
    api_key: String,
    secret_key: String,
}

impl fmt::Debug for AlpacaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaProvider")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl AlpacaProvider {
    /// Create a new Alpaca provider with the given key pair.
    #[must_use]
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key, secret_key)
    }

    /// Create a new Alpaca provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    fn url(path: &str) -> String {
        format!("{ALPACA_DATA_URL}{path}")
    }

    /// Make an authenticated GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!(path, "Alpaca request");

        let response = self
            .client
            .get(Self::url(path))
            .header("accept", "application/json")
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
            .query(query)
            .send()
            .await
            .map_err(|e| DataError::unavailable("Alpaca", e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: "Alpaca".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DataError::unavailable("Alpaca", format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataError::unavailable("Alpaca", e))?;

        serde_json::from_str(&text).map_err(|e| DataError::Parse(format!("{e}: {text}")))
    }
}

/// Alpaca's name for a sampling interval.
const fn timeframe_param(interval: SamplingInterval) -> &'static str {
    match interval {
        SamplingInterval::OneMinute => "1Min",
        SamplingInterval::FiveMinute => "5Min",
        SamplingInterval::OneHour => "1Hour",
        SamplingInterval::OneDay => "1Day",
    }
}

fn bars_query(
    symbol: &Symbol,
    window: &TimeframeWindow,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("symbols", symbol.to_string()),
        ("timeframe", timeframe_param(window.interval).to_string()),
        ("start", window.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("end", window.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("limit", BARS_PAGE_LIMIT.to_string()),
        ("adjustment", "raw".to_string()),
        ("feed", "iex".to_string()),
        ("sort", "asc".to_string()),
    ];
    if let Some(token) = page_token {
        query.push(("page_token", token.to_string()));
    }
    query
}

impl DataProvider for AlpacaProvider {
    fn name(&self) -> &str {
        "Alpaca"
    }

    fn description(&self) -> &str {
        "Alpaca Markets - Stock bars, screeners, crypto quotes and news"
    }

    fn supported_intervals(&self) -> &[SamplingInterval] {
        SUPPORTED_INTERVALS
    }
}

#[async_trait]
impl BarSource for AlpacaProvider {
    async fn fetch_bars(&self, symbol: &Symbol, window: &TimeframeWindow) -> Result<Vec<RawBar>> {
        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=MAX_BAR_PAGES {
            let query = bars_query(symbol, window, page_token.as_deref());
            let response: AlpacaBarsResponse = self.get("/v2/stocks/bars", &query).await?;

            page_token = response.next_page_token.clone();
            bars.extend(response.into_raw_bars(symbol));

            if page_token.is_none() {
                break;
            }
            if page == MAX_BAR_PAGES {
                tracing::warn!(symbol = %symbol, pages = page, "Stopped following bar pages");
            }
        }

        tracing::debug!(symbol = %symbol, interval = %window.interval, bars = bars.len(), "Alpaca bars");
        Ok(bars)
    }
}

#[async_trait]
impl MarketMoverSource for AlpacaProvider {
    async fn fetch_movers(&self, top: usize) -> Result<MarketMovers> {
        let response: AlpacaMoversResponse = self
            .get("/v1beta1/screener/stocks/movers", &[("top", top.to_string())])
            .await?;
        Ok(response.into_movers(top))
    }

    async fn fetch_most_active(&self, top: usize) -> Result<Vec<ActiveStock>> {
        let response: AlpacaMostActivesResponse = self
            .get(
                "/v1beta1/screener/stocks/most-actives",
                &[("by", "volume".to_string()), ("top", top.to_string())],
            )
            .await?;
        Ok(response.into_active(top))
    }
}

#[async_trait]
impl CryptoQuoteSource for AlpacaProvider {
    async fn fetch_crypto_quotes(&self, pairs: &[Symbol]) -> Result<Vec<CryptoQuote>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let symbols = pairs
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let response: AlpacaCryptoQuotesResponse = self
            .get("/v1beta3/crypto/us/latest/quotes", &[("symbols", symbols)])
            .await?;
        Ok(response.into_quotes(pairs))
    }
}

#[async_trait]
impl SymbolNewsSource for AlpacaProvider {
    async fn fetch_symbol_news(&self, symbol: &Symbol, limit: usize) -> Result<Vec<NewsItem>> {
        let response: AlpacaNewsResponse = self
            .get(
                "/v1beta1/news",
                &[
                    ("sort", "desc".to_string()),
                    ("symbols", symbol.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        let mut news: Vec<NewsItem> = response.news.into_iter().map(NewsItem::from).collect();
        news.truncate(limit);
        Ok(news)
    }
}

// ============================================================================
// Alpaca API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    #[serde(default)]
    bars: Option<HashMap<String, Vec<AlpacaBar>>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl AlpacaBarsResponse {
    fn into_raw_bars(self, symbol: &Symbol) -> Vec<RawBar> {
        self.bars
            .and_then(|mut by_symbol| by_symbol.remove(symbol.as_str()))
            .unwrap_or_default()
            .into_iter()
            .map(|b| RawBar::from_parts(b.t.as_deref(), b.c))
            .collect()
    }
}

/// Only the fields the chart uses.
#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: Option<String>,
    c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AlpacaMoversResponse {
    #[serde(default)]
    gainers: Vec<AlpacaMover>,
    #[serde(default)]
    losers: Vec<AlpacaMover>,
}

impl AlpacaMoversResponse {
    fn into_movers(self, top: usize) -> MarketMovers {
        let convert = |movers: Vec<AlpacaMover>| -> Vec<MoverQuote> {
            movers
                .into_iter()
                .take(top)
                .map(|m| MoverQuote {
                    symbol: Symbol::new(m.symbol),
                    price: m.price,
                    change: m.change,
                    percent_change: m.percent_change,
                })
                .collect()
        };
        MarketMovers {
            gainers: convert(self.gainers),
            losers: convert(self.losers),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaMover {
    symbol: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    change: f64,
    #[serde(default)]
    percent_change: f64,
}

#[derive(Debug, Deserialize)]
struct AlpacaMostActivesResponse {
    #[serde(default)]
    most_actives: Vec<AlpacaMostActive>,
}

impl AlpacaMostActivesResponse {
    fn into_active(self, top: usize) -> Vec<ActiveStock> {
        self.most_actives
            .into_iter()
            .take(top)
            .map(|a| ActiveStock {
                symbol: Symbol::new(a.symbol),
                volume: a.volume,
                price: a.price,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaMostActive {
    symbol: String,
    #[serde(default)]
    volume: f64,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AlpacaCryptoQuotesResponse {
    #[serde(default)]
    quotes: HashMap<String, AlpacaCryptoQuote>,
}

impl AlpacaCryptoQuotesResponse {
    /// Quotes in the order the pairs were requested.
    fn into_quotes(mut self, pairs: &[Symbol]) -> Vec<CryptoQuote> {
        pairs
            .iter()
            .filter_map(|pair| {
                let quote = self.quotes.remove(pair.as_str());
                if quote.is_none() {
                    tracing::debug!(pair = %pair, "No crypto quote returned");
                }
                quote.map(|q| CryptoQuote {
                    symbol: pair.clone(),
                    ask: q.ap,
                    bid: q.bp,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaCryptoQuote {
    ap: f64,
    bp: f64,
}

#[derive(Debug, Deserialize)]
struct AlpacaNewsResponse {
    #[serde(default)]
    news: Vec<AlpacaNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct AlpacaNewsArticle {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
    author: Option<String>,
    created_at: Option<String>,
    source: Option<String>,
    #[serde(default)]
    symbols: Vec<String>,
}

impl From<AlpacaNewsArticle> for NewsItem {
    fn from(a: AlpacaNewsArticle) -> Self {
        Self {
            headline: a.headline,
            summary: a.summary,
            url: a.url,
            author: a.author.filter(|s| !s.is_empty()),
            published_at: a.created_at.as_deref().and_then(parse_timestamp),
            source: a.source,
            symbols: a.symbols.into_iter().map(Symbol::new).collect(),
        }
    }
}
