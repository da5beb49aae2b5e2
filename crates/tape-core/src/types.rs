//! Core data types for price series.
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`RawBar`] - One price sample as received from a bar source
//! - [`AnnotatedPoint`] - One chartable sample with its optional moving average
//! - [`PercentChange`] - A percentage that may be undefined
//! - [`PriceRange`] - Minimum and maximum price over a series
//! - [`SeriesSummary`] - Statistics derived from an annotated series

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation. Pairs such as `BTC/USD` keep
/// their separator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One price sample as delivered by an external bar source.
///
/// Both fields are optional on purpose: untrusted feeds omit them, and the
/// aggregator drops such bars instead of defaulting them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// When the bar was sampled.
    pub timestamp: Option<DateTime<Utc>>,
    /// Closing price of the bar.
    pub close: Option<f64>,
}

impl RawBar {
    /// Creates a complete bar.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            close: Some(close),
        }
    }

    /// Builds a bar from a textual timestamp, see [`parse_timestamp`].
    #[must_use]
    pub fn from_parts(timestamp: Option<&str>, close: Option<f64>) -> Self {
        Self {
            timestamp: timestamp.and_then(parse_timestamp),
            close,
        }
    }

    /// Returns `(timestamp, close)` when the bar is usable.
    ///
    /// A bar is usable when it has a timestamp and a finite close.
    #[must_use]
    pub fn usable(&self) -> Option<(DateTime<Utc>, f64)> {
        match (self.timestamp, self.close) {
            (Some(t), Some(c)) if c.is_finite() => Some((t, c)),
            _ => None,
        }
    }
}

/// Parses an RFC 3339 instant or a bare `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// One chartable sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    /// Copied from the raw bar.
    pub timestamp: DateTime<Utc>,
    /// Copied from the raw bar's close.
    pub price: f64,
    /// Trailing moving average, when the window policy defines one here.
    pub moving_average: Option<f64>,
}

/// A percentage that is undefined when its base is zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PercentChange {
    /// A finite percentage.
    Value(f64),
    /// The base was zero.
    Undefined,
}

impl PercentChange {
    /// `(to - from) / from * 100`, or [`PercentChange::Undefined`] when `from` is zero.
    #[must_use]
    pub fn between(from: f64, to: f64) -> Self {
        if from == 0.0 {
            return Self::Undefined;
        }
        let pct = (to - from) / from * 100.0;
        if pct.is_finite() {
            Self::Value(pct)
        } else {
            Self::Undefined
        }
    }

    /// The percentage, if defined.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Undefined => None,
        }
    }

    /// True when the change is defined and not negative.
    #[must_use]
    pub fn is_gain(&self) -> bool {
        self.value().is_some_and(|v| v >= 0.0)
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}%"),
            Self::Undefined => f.write_str("N/A"),
        }
    }
}

/// Minimum and maximum price over a series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lowest price.
    pub min: f64,
    /// Highest price.
    pub max: f64,
}

impl PriceRange {
    /// Computes the range of `prices`, `None` when empty.
    #[must_use]
    pub fn of(prices: impl IntoIterator<Item = f64>) -> Option<Self> {
        prices.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self { min: p, max: p }),
            Some(r) => Some(Self {
                min: r.min.min(p),
                max: r.max.max(p),
            }),
        })
    }

    /// `(max - min) / min * 100`.
    #[must_use]
    pub fn spread_percent(&self) -> PercentChange {
        PercentChange::between(self.min, self.max)
    }
}

/// Statistics derived from an annotated series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Price of the last point.
    pub current_price: f64,
    /// Price of the first point.
    pub open_price: f64,
    /// Change from the first to the last point.
    pub percent_change: PercentChange,
    /// Range over all points.
    pub price_range: PriceRange,
    /// Moving average at the last point, if it has one.
    pub latest_moving_average: Option<f64>,
    /// Whether the US equity market is open at the time the summary was built.
    pub is_market_open: bool,
}
