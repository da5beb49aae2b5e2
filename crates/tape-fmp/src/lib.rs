#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial Modeling Prep (FMP) data source.
//!
//! This crate implements the tape-core traits for the
//! [Financial Modeling Prep](https://financialmodelingprep.com/) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tape_fmp::FmpProvider;
//! use tape_core::{BarSource, SectorSource, Symbol, Timeframe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = FmpProvider::new("your_api_key");
//!
//!     // Sector performance for the key sectors
//!     let sectors = provider.fetch_sector_performance().await?;
//!
//!     // Daily bars for the last year
//!     let window = Timeframe::OneYear.window_at(chrono::Utc::now());
//!     let bars = provider.fetch_bars(&Symbol::new("AAPL"), &window).await?;
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tape_core::{
    BarSource, DataError, DataProvider, KEY_SECTORS, RawBar, Result, SamplingInterval,
    SectorPerformance, SectorSource, Symbol, TimeframeWindow,
};

/// Base URL for the FMP v3 API.
const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Supported bar intervals for FMP.
const SUPPORTED_INTERVALS: &[SamplingInterval] = &[SamplingInterval::OneDay];

/// Financial Modeling Prep data source.
///
/// Provides access to:
/// - Sector performance for the trading day
/// - Historical daily prices (secondary bar source)
#[derive(Clone)]
pub struct FmpProvider {
    client: Client,
    api_key: String,
}

impl fmt::Debug for FmpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmpProvider")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl FmpProvider {
    /// Create a new FMP provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a new FMP provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Build a URL with the API key appended.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.contains('?') {
            format!("{FMP_BASE_URL}/{endpoint}&apikey={}", self.api_key)
        } else {
            format!("{FMP_BASE_URL}/{endpoint}?apikey={}", self.api_key)
        }
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!("FMP request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::unavailable("FMP", e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: "FMP".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DataError::unavailable("FMP", format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataError::unavailable("FMP", e))?;

        // FMP reports errors with a 200 status
        if text.contains("\"Error Message\"") || text.contains("\"error\"") {
            return Err(DataError::unavailable("FMP", text));
        }

        serde_json::from_str(&text).map_err(|e| DataError::Parse(format!("{e}: {text}")))
    }
}

impl DataProvider for FmpProvider {
    fn name(&self) -> &str {
        "FMP"
    }

    fn description(&self) -> &str {
        "Financial Modeling Prep - Sector performance and daily prices"
    }

    fn supported_intervals(&self) -> &[SamplingInterval] {
        SUPPORTED_INTERVALS
    }
}

#[async_trait]
impl BarSource for FmpProvider {
    async fn fetch_bars(&self, symbol: &Symbol, window: &TimeframeWindow) -> Result<Vec<RawBar>> {
        if window.interval != SamplingInterval::OneDay {
            return Err(DataError::NotSupported(format!(
                "FMP only supports daily bars, got {}",
                window.interval
            )));
        }

        let endpoint = format!(
            "historical-price-full/{}?from={}&to={}",
            symbol.as_str(),
            window.start.date_naive(),
            window.end.date_naive()
        );
        let response: FmpHistoricalResponse = self.get(&endpoint).await?;
        let bars = bars_from_historical(response);

        tracing::debug!(symbol = %symbol, bars = bars.len(), "FMP historical prices");
        Ok(bars)
    }
}

#[async_trait]
impl SectorSource for FmpProvider {
    async fn fetch_sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        let sectors: Vec<FmpSector> = self.get("sectors-performance").await?;
        Ok(key_sectors(sectors))
    }
}

/// FMP lists history newest first; bars are returned oldest first.
fn bars_from_historical(response: FmpHistoricalResponse) -> Vec<RawBar> {
    let mut bars: Vec<RawBar> = response
        .historical
        .into_iter()
        .map(|p| RawBar::from_parts(p.date.as_deref(), p.close))
        .collect();
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// Keeps [`KEY_SECTORS`] in upstream order. Unparseable percentages are dropped.
fn key_sectors(sectors: Vec<FmpSector>) -> Vec<SectorPerformance> {
    sectors
        .into_iter()
        .filter(|s| KEY_SECTORS.contains(&s.sector.as_str()))
        .filter_map(|s| match parse_percentage(&s.changes_percentage) {
            Some(change_percent) => Some(SectorPerformance {
                sector: s.sector,
                change_percent,
            }),
            None => {
                tracing::warn!(sector = %s.sector, value = %s.changes_percentage, "Unparseable sector change");
                None
            }
        })
        .collect()
}

/// Parses `"1.25%"`, `"-0.4%"` or a bare number.
fn parse_percentage(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ============================================================================
// FMP API Response Types
// ============================================================================

/// FMP historical price response. Unknown symbols come back as `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
struct FmpHistoricalResponse {
    #[allow(dead_code)]
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    historical: Vec<FmpHistoricalPrice>,
}

/// FMP historical price row.
#[derive(Debug, Clone, Deserialize)]
struct FmpHistoricalPrice {
    date: Option<String>,
    close: Option<f64>,
}

/// FMP sector performance row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpSector {
    sector: String,
    #[serde(default)]
    changes_percentage: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tape_core::Timeframe;

    #[test]
    fn test_url_building() {
        let provider = FmpProvider::new("test_key");
        assert_eq!(
            provider.url("historical-price-full/AAPL?from=2024-01-01&to=2024-06-01"),
            "https://financialmodelingprep.com/api/v3/historical-price-full/AAPL?from=2024-01-01&to=2024-06-01&apikey=test_key"
        );
        assert_eq!(
            provider.url("sectors-performance"),
            "https://financialmodelingprep.com/api/v3/sectors-performance?apikey=test_key"
        );
    }

    #[test]
    fn test_provider_metadata() {
        let provider = FmpProvider::new("test_key");
        assert_eq!(provider.name(), "FMP");
        assert!(!provider.description().is_empty());
        assert_eq!(provider.supported_intervals(), &[SamplingInterval::OneDay]);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = FmpProvider::new("secret_key_12345");
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_historical_is_returned_ascending() {
        let json = r#"{
            "symbol": "AAPL",
            "historical": [
                {"date": "2024-01-04", "open": 182.1, "close": 181.9},
                {"date": "2024-01-03", "close": 184.25},
                {"date": "2024-01-02", "close": 185.64}
            ]
        }"#;
        let response: FmpHistoricalResponse = serde_json::from_str(json).unwrap();
        let bars = bars_from_historical(response);

        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(bars[0].close, Some(185.64));
        assert_eq!(bars[2].close, Some(181.9));
    }

    #[test]
    fn test_historical_unknown_symbol_is_empty() {
        let response: FmpHistoricalResponse = serde_json::from_str("{}").unwrap();
        assert!(bars_from_historical(response).is_empty());
    }

    #[test]
    fn test_historical_keeps_incomplete_rows() {
        let json = r#"{"historical": [{"date": "2024-01-02"}, {"close": 10.0}]}"#;
        let response: FmpHistoricalResponse = serde_json::from_str(json).unwrap();
        let bars = bars_from_historical(response);
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.usable().is_none()));
    }

    #[test]
    fn test_key_sectors_filter_and_parse() {
        let json = r#"[
            {"sector": "Basic Materials", "changesPercentage": "0.10%"},
            {"sector": "Technology", "changesPercentage": "1.25%"},
            {"sector": "Energy", "changesPercentage": "-0.4%"},
            {"sector": "Utilities", "changesPercentage": "n/a"}
        ]"#;
        let sectors: Vec<FmpSector> = serde_json::from_str(json).unwrap();
        let parsed = key_sectors(sectors);

        assert_eq!(
            parsed,
            vec![
                SectorPerformance {
                    sector: "Technology".to_string(),
                    change_percent: 1.25,
                },
                SectorPerformance {
                    sector: "Energy".to_string(),
                    change_percent: -0.4,
                },
            ]
        );
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("1.25%"), Some(1.25));
        assert_eq!(parse_percentage(" -0.5 % "), Some(-0.5));
        assert_eq!(parse_percentage("2"), Some(2.0));
        assert_eq!(parse_percentage(""), None);
        assert_eq!(parse_percentage("NaN%"), None);
    }

    #[tokio::test]
    async fn test_intraday_bars_not_supported() {
        let provider = FmpProvider::new("test_key");
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 15, 0, 0).unwrap();
        let window = Timeframe::OneDay.window_at(now);

        assert!(!provider.supports_window(&window));
        let result = provider.fetch_bars(&Symbol::new("AAPL"), &window).await;
        assert!(matches!(result, Err(DataError::NotSupported(_))));
    }
}
