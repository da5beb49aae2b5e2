//! Dashboard configuration.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use tape_core::{DataError, Result};

/// Default bound on a single outbound request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Alpaca key pair.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AlpacaCredentials {
    /// `APCA-API-KEY-ID`.
    pub api_key: String,
    /// `APCA-API-SECRET-KEY`.
    pub secret_key: String,
}

impl fmt::Debug for AlpacaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaCredentials")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Settings for [`Dashboard::from_config`](crate::Dashboard::from_config).
///
/// A source is registered only when its credentials are present.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Upper bound on each outbound request, in seconds.
    pub request_timeout_secs: u64,
    /// How long a cached response counts as fresh, in seconds.
    pub cache_ttl_secs: u64,
    /// Alpaca bars, screeners, crypto quotes and symbol news.
    pub alpaca: Option<AlpacaCredentials>,
    /// Polygon company overview and ticker search.
    pub polygon_api_key: Option<String>,
    /// FMP sector performance and daily bars.
    pub fmp_api_key: Option<String>,
    /// Alpha Vantage forex rates.
    pub alpha_vantage_api_key: Option<String>,
    /// Whether to register the Nasdaq RSS headline source.
    pub nasdaq_news: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            alpaca: None,
            polygon_api_key: None,
            fmp_api_key: None,
            alpha_vantage_api_key: None,
            nasdaq_news: true,
        }
    }
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let configured = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("DashboardConfig")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("alpaca", &self.alpaca)
            .field("polygon_api_key", &configured(&self.polygon_api_key))
            .field("fmp_api_key", &configured(&self.fmp_api_key))
            .field("alpha_vantage_api_key", &configured(&self.alpha_vantage_api_key))
            .field("nasdaq_news", &self.nasdaq_news)
            .finish()
    }
}

impl DashboardConfig {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `ALPACA_API_KEY`, `ALPACA_SECRET_KEY` | Alpaca key pair, both required |
    /// | `POLYGON_API_KEY` | Polygon key |
    /// | `FMP_API_KEY` | Financial Modeling Prep key |
    /// | `ALPHA_VANTAGE_API_KEY` | Alpha Vantage key |
    /// | `TAPE_REQUEST_TIMEOUT_SECS` | request timeout, default 10 |
    /// | `TAPE_CACHE_TTL_SECS` | cache TTL, default 300 |
    /// | `TAPE_NASDAQ_NEWS` | `0`/`false` disables Nasdaq headlines |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let alpaca = match (var("ALPACA_API_KEY"), var("ALPACA_SECRET_KEY")) {
            (Some(api_key), Some(secret_key)) => Some(AlpacaCredentials {
                api_key,
                secret_key,
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("Only one of ALPACA_API_KEY and ALPACA_SECRET_KEY is set; Alpaca disabled");
                None
            }
        };

        let config = Self {
            request_timeout_secs: parse_secs("TAPE_REQUEST_TIMEOUT_SECS", var("TAPE_REQUEST_TIMEOUT_SECS"))?
                .unwrap_or(defaults.request_timeout_secs),
            cache_ttl_secs: parse_secs("TAPE_CACHE_TTL_SECS", var("TAPE_CACHE_TTL_SECS"))?
                .unwrap_or(defaults.cache_ttl_secs),
            alpaca,
            polygon_api_key: var("POLYGON_API_KEY"),
            fmp_api_key: var("FMP_API_KEY"),
            alpha_vantage_api_key: var("ALPHA_VANTAGE_API_KEY"),
            nasdaq_news: var("TAPE_NASDAQ_NEWS")
                .is_none_or(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(DataError::InvalidParameter(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cache TTL as a [`Duration`].
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_secs(name: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.parse::<u64>()
                .map_err(|e| DataError::InvalidParameter(format!("{name}={v}: {e}")))
        })
        .transpose()
}
