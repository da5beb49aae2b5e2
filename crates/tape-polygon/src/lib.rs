#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Polygon.io reference data source.
//!
//! Implements [`ReferenceDataProvider`] for the
//! [Polygon.io](https://polygon.io/docs/stocks) ticker reference endpoints:
//! company overviews and ticker search.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tape_core::{
    CompanyOverview, DataError, DataProvider, ReferenceDataProvider, Result, SearchOutcome,
    Symbol, TickerMatch,
};

/// Base URL for the Polygon API.
const POLYGON_BASE_URL: &str = "https://api.polygon.io";

/// Maximum number of search results requested.
const SEARCH_LIMIT: usize = 10;

/// Polygon.io data source.
#[derive(Clone)]
pub struct PolygonProvider {
    client: Client,
    api_key: String,
}

impl fmt::Debug for PolygonProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonProvider")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl PolygonProvider {
    /// Create a new Polygon provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a new Polygon provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Build a URL with the API key appended.
    fn url(&self, endpoint: &str) -> String {
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        format!("{POLYGON_BASE_URL}/{endpoint}{sep}apiKey={}", self.api_key)
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!("Polygon request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::unavailable("Polygon", e))?;

        match response.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(DataError::RateLimited {
                    provider: "Polygon".to_string(),
                    retry_after: retry_after(&response),
                });
            }
            reqwest::StatusCode::NOT_FOUND => {
                return Err(DataError::SymbolNotFound(endpoint.to_string()));
            }
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(DataError::unavailable(
                    "Polygon",
                    format!("HTTP {status}: {text}"),
                ));
            }
            _ => {}
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataError::unavailable("Polygon", e))?;

        serde_json::from_str(&text).map_err(|e| DataError::Parse(format!("{e}: {text}")))
    }
}

fn retry_after(response: &reqwest::Response) -> Option<std::time::Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(std::time::Duration::from_secs)
}

fn overview_endpoint(symbol: &Symbol) -> String {
    format!("v3/reference/tickers/{}", symbol.as_str())
}

fn search_endpoint(query: &str) -> String {
    format!(
        "v3/reference/tickers?type=CS&market=stocks&search={}&active=true&order=asc&limit={SEARCH_LIMIT}&sort=ticker",
        encode_query_value(query.trim())
    )
}

/// Percent-encodes everything outside the unreserved set.
fn encode_query_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

impl DataProvider for PolygonProvider {
    fn name(&self) -> &str {
        "Polygon"
    }

    fn description(&self) -> &str {
        "Polygon.io - Ticker reference data and search"
    }
}

#[async_trait]
impl ReferenceDataProvider for PolygonProvider {
    async fn company_overview(&self, symbol: &Symbol) -> Result<CompanyOverview> {
        let response: PolygonTickerDetailsResponse = self
            .get(&overview_endpoint(symbol))
            .await
            .map_err(|e| match e {
                DataError::SymbolNotFound(_) => DataError::SymbolNotFound(symbol.to_string()),
                other => other,
            })?;

        response
            .results
            .map(CompanyOverview::from)
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(DataError::InvalidParameter(
                "search query must not be empty".to_string(),
            ));
        }

        let response: PolygonTickerSearchResponse = self.get(&search_endpoint(query)).await?;
        let matches = response.into_matches();
        tracing::debug!(query, matches = matches.len(), "Polygon ticker search");

        Ok(SearchOutcome::from_matches(query, matches))
    }
}

// ============================================================================
// Polygon API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct PolygonTickerDetailsResponse {
    results: Option<PolygonTickerDetails>,
}

#[derive(Debug, Deserialize)]
struct PolygonTickerDetails {
    ticker: String,
    #[serde(default)]
    name: String,
    description: Option<String>,
    sic_description: Option<String>,
    homepage_url: Option<String>,
    market_cap: Option<f64>,
    locale: Option<String>,
}

impl From<PolygonTickerDetails> for CompanyOverview {
    fn from(d: PolygonTickerDetails) -> Self {
        Self {
            symbol: Symbol::new(d.ticker),
            name: d.name,
            description: d.description,
            sic_description: d.sic_description,
            homepage_url: d.homepage_url,
            market_cap: d.market_cap,
            locale: d.locale,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PolygonTickerSearchResponse {
    #[serde(default)]
    results: Vec<PolygonTickerSummary>,
}

impl PolygonTickerSearchResponse {
    fn into_matches(self) -> Vec<TickerMatch> {
        self.results
            .into_iter()
            .map(|t| TickerMatch {
                symbol: Symbol::new(t.ticker),
                name: t.name,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PolygonTickerSummary {
    ticker: String,
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let provider = PolygonProvider::new("test_key");
        assert_eq!(
            provider.url(&overview_endpoint(&Symbol::new("aapl"))),
            "https://api.polygon.io/v3/reference/tickers/AAPL?apiKey=test_key"
        );
        assert_eq!(
            provider.url(&search_endpoint("apple")),
            "https://api.polygon.io/v3/reference/tickers?type=CS&market=stocks&search=apple&active=true&order=asc&limit=10&sort=ticker&apiKey=test_key"
        );
    }

    #[test]
    fn test_search_query_is_encoded() {
        assert_eq!(
            search_endpoint(" AT&T inc "),
            "v3/reference/tickers?type=CS&market=stocks&search=AT%26T%20inc&active=true&order=asc&limit=10&sort=ticker"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = PolygonProvider::new("secret_key_12345");
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_decode_overview() {
        let json = r#"{
            "request_id": "31d59dda80977c1b9e8d4ef8a6d4b1f8",
            "results": {
                "ticker": "AAPL",
                "name": "Apple Inc.",
                "market": "stocks",
                "locale": "us",
                "active": true,
                "market_cap": 2771126040150,
                "description": "Apple designs a wide variety of consumer electronic devices.",
                "sic_description": "ELECTRONIC COMPUTERS",
                "homepage_url": "https://www.apple.com"
            },
            "status": "OK"
        }"#;
        let response: PolygonTickerDetailsResponse = serde_json::from_str(json).unwrap();
        let overview = CompanyOverview::from(response.results.unwrap());

        assert_eq!(overview.symbol.as_str(), "AAPL");
        assert_eq!(overview.market_cap_display(), "$2.77T");
        assert_eq!(overview.industry(), "Electronic Computers");
        assert_eq!(overview.locale_display(), "US");
        assert_eq!(overview.homepage_url.as_deref(), Some("https://www.apple.com"));
    }

    #[test]
    fn test_decode_overview_missing_fields() {
        let json = r#"{"results": {"ticker": "XYZ"}, "status": "OK"}"#;
        let response: PolygonTickerDetailsResponse = serde_json::from_str(json).unwrap();
        let overview = CompanyOverview::from(response.results.unwrap());

        assert_eq!(overview.name, "");
        assert_eq!(overview.market_cap_display(), "N/A");
        assert_eq!(overview.industry(), "");
    }

    #[test]
    fn test_decode_search() {
        let json = r#"{
            "results": [
                {"ticker": "AAPL", "name": "Apple Inc.", "market": "stocks", "type": "CS"},
                {"ticker": "APLE", "name": "Apple Hospitality REIT, Inc.", "market": "stocks", "type": "CS"}
            ],
            "status": "OK",
            "count": 2
        }"#;
        let response: PolygonTickerSearchResponse = serde_json::from_str(json).unwrap();
        let matches = response.into_matches();

        assert_eq!(matches.len(), 2);
        assert_eq!(
            SearchOutcome::from_matches("aapl", matches.clone()),
            SearchOutcome::ExactMatch(Symbol::new("AAPL"))
        );
        assert_eq!(
            SearchOutcome::from_matches("apple", matches.clone()),
            SearchOutcome::Matches(matches)
        );
    }

    #[test]
    fn test_decode_search_without_results() {
        let json = r#"{"status": "OK", "count": 0}"#;
        let response: PolygonTickerSearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_matches().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_is_rejected() {
        let provider = PolygonProvider::new("test_key");
        let result = provider.search("   ").await;
        assert!(matches!(result, Err(DataError::InvalidParameter(_))));
    }
}
