#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage forex source.
//!
//! Fetches `CURRENCY_EXCHANGE_RATE` for each of the [`MAJOR_PAIRS`]
//! concurrently. A pair whose request fails, or whose payload has no usable
//! rate, is reported with `rate: None` instead of failing the whole card.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tape_core::{DataError, DataProvider, ForexPair, ForexRate, ForexSource, MAJOR_PAIRS, Result};

/// Alpha Vantage query endpoint.
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage data source.
#[derive(Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl fmt::Debug for AlphaVantageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageProvider")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a new Alpha Vantage provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    fn exchange_rate_query(&self, pair: ForexPair) -> [(&'static str, &str); 4] {
        [
            ("function", "CURRENCY_EXCHANGE_RATE"),
            ("from_currency", pair.from),
            ("to_currency", pair.to),
            ("apikey", self.api_key.as_str()),
        ]
    }

    /// Fetches one pair. `Ok(None)` when the payload carries no usable rate.
    async fn fetch_rate(&self, pair: ForexPair) -> Result<Option<f64>> {
        tracing::debug!(pair = %pair.label(), "Alpha Vantage request");

        let response = self
            .client
            .get(ALPHA_VANTAGE_URL)
            .query(&self.exchange_rate_query(pair))
            .send()
            .await
            .map_err(|e| DataError::unavailable("Alpha Vantage", e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: "Alpha Vantage".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DataError::unavailable(
                "Alpha Vantage",
                format!("HTTP {status}: {text}"),
            ));
        }

        let body: ExchangeRateResponse = response
            .json()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))?;

        body.rate(pair)
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    fn description(&self) -> &str {
        "Alpha Vantage - Realtime currency exchange rates"
    }
}

#[async_trait]
impl ForexSource for AlphaVantageProvider {
    async fn fetch_forex_rates(&self) -> Result<Vec<ForexRate>> {
        let results = join_all(MAJOR_PAIRS.iter().map(|&pair| self.fetch_rate(pair))).await;
        collect_rates(&MAJOR_PAIRS, results)
    }
}

/// Pairs the results back up in order. Errors only if every request failed.
fn collect_rates(pairs: &[ForexPair], results: Vec<Result<Option<f64>>>) -> Result<Vec<ForexRate>> {
    let mut last_error = None;
    let mut any_answered = false;

    let rates = pairs
        .iter()
        .zip(results)
        .map(|(&pair, result)| match result {
            Ok(rate) => {
                any_answered = true;
                ForexRate::new(pair, rate)
            }
            Err(e) => {
                tracing::warn!(pair = %pair.label(), error = %e, "Exchange rate request failed");
                last_error = Some(e);
                ForexRate::new(pair, None)
            }
        })
        .collect();

    match last_error {
        Some(e) if !any_answered => Err(e),
        _ => Ok(rates),
    }
}

// ============================================================================
// Alpha Vantage API Response Types
// ============================================================================

/// Throttled requests come back with a 200 status and a `Note` or
/// `Information` field instead of the rate object.
#[derive(Debug, Default, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    realtime: Option<RealtimeExchangeRate>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ExchangeRateResponse {
    /// The pair's rate. A throttling notice without a rate is
    /// [`DataError::RateLimited`]; a missing or unparseable rate is `None`.
    fn rate(&self, pair: ForexPair) -> Result<Option<f64>> {
        let raw = self
            .realtime
            .as_ref()
            .and_then(|r| r.exchange_rate.as_deref());

        let Some(raw) = raw else {
            if let Some(notice) = self.note.as_deref().or(self.information.as_deref()) {
                tracing::warn!(pair = %pair.label(), notice, "Alpha Vantage throttled the request");
                return Err(DataError::RateLimited {
                    provider: "Alpha Vantage".to_string(),
                    retry_after: None,
                });
            }
            tracing::warn!(pair = %pair.label(), "No exchange rate in response");
            return Ok(None);
        };

        let rate = raw.trim().parse::<f64>().ok().filter(|r| r.is_finite());
        if rate.is_none() {
            tracing::warn!(pair = %pair.label(), value = raw, "Invalid exchange rate");
        }
        Ok(rate)
    }
}

#[derive(Debug, Deserialize)]
struct RealtimeExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    exchange_rate: Option<String>,
}
