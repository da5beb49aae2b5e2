//! Timeframe tokens and the windows they resolve to.
//!
//! A [`Timeframe`] is the user's selector (`1D`, `5D`, `1M`, `6M`, `YTD`, `1Y`, `5Y`).
//! [`Timeframe::window_at`] maps it to a concrete [`TimeframeWindow`] relative to a
//! given instant; [`TimeframeResolver`] does the same against an injected [`Clock`].
//!
//! | token | start                        | interval |
//! |-------|------------------------------|----------|
//! | 1D    | now - 1 day                  | 5m       |
//! | 5D    | now - 5 days                 | 1h       |
//! | 1M    | now - 1 month                | 1h       |
//! | 6M    | now - 6 months               | 1d       |
//! | YTD   | January 1 (UTC) of this year | 1d       |
//! | 1Y    | now - 1 year                 | 1d       |
//! | 5Y    | now - 5 years                | 1d       |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock, error::DataError, interval::SamplingInterval, market_hours::MarketHours,
};

/// Logical chart timeframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// `1D`
    #[serde(rename = "1D")]
    OneDay,
    /// `5D`
    #[serde(rename = "5D")]
    FiveDays,
    /// `1M`
    #[serde(rename = "1M")]
    OneMonth,
    /// `6M`
    #[serde(rename = "6M")]
    SixMonths,
    /// `YTD`
    #[serde(rename = "YTD")]
    YearToDate,
    /// `1Y`
    #[serde(rename = "1Y")]
    OneYear,
    /// `5Y`
    #[serde(rename = "5Y")]
    FiveYears,
}

impl Timeframe {
    /// All timeframes in display order.
    pub const ALL: [Self; 7] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::SixMonths,
        Self::YearToDate,
        Self::OneYear,
        Self::FiveYears,
    ];

    /// The token for this timeframe.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::FiveDays => "5D",
            Self::OneMonth => "1M",
            Self::SixMonths => "6M",
            Self::YearToDate => "YTD",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
        }
    }

    /// Bar granularity requested for this timeframe.
    #[must_use]
    pub const fn sampling_interval(&self) -> SamplingInterval {
        match self {
            Self::OneDay => SamplingInterval::FiveMinute,
            Self::FiveDays | Self::OneMonth => SamplingInterval::OneHour,
            Self::SixMonths | Self::YearToDate | Self::OneYear | Self::FiveYears => {
                SamplingInterval::OneDay
            }
        }
    }

    /// Resolves this timeframe to a window ending at `now`.
    #[must_use]
    pub fn window_at(&self, now: DateTime<Utc>) -> TimeframeWindow {
        let start = match self {
            Self::OneDay => now - TimeDelta::days(1),
            Self::FiveDays => now - TimeDelta::days(5),
            Self::OneMonth => months_before(now, 1),
            Self::SixMonths => months_before(now, 6),
            Self::YearToDate => start_of_year(now),
            Self::OneYear => months_before(now, 12),
            Self::FiveYears => months_before(now, 60),
        };

        TimeframeWindow {
            timeframe: *self,
            start,
            end: now,
            interval: self.sampling_interval(),
        }
    }

    /// Formats an instant as a chart axis label for this timeframe.
    ///
    /// Labels use exchange time (America/New_York). Intraday views show the
    /// time of day, the five day view shows month/day, and everything longer
    /// shows the full date.
    #[must_use]
    pub fn axis_label(&self, at: DateTime<Utc>) -> String {
        let at = at.with_timezone(&MarketHours::us_equities().timezone);
        match self {
            Self::OneDay => at.format("%H:%M").to_string(),
            Self::FiveDays => at.format("%m/%d").to_string(),
            _ => at.format("%Y/%m/%d").to_string(),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.token() == s)
            .ok_or_else(|| DataError::InvalidTimeframe(s.to_string()))
    }
}

/// Clamps to the last valid day of the target month, like calendar arithmetic
/// in most charting libraries (March 31 minus one month is February 28/29).
fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Midnight UTC on January 1 of `now`'s year.
#[must_use]
pub fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_yo_opt(now.year(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |dt| dt.and_utc())
}

/// Concrete query range for a timeframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeWindow {
    /// The timeframe this window was resolved from.
    pub timeframe: Timeframe,
    /// Inclusive start of the range.
    pub start: DateTime<Utc>,
    /// End of the range (the instant of resolution).
    pub end: DateTime<Utc>,
    /// Requested bar granularity.
    pub interval: SamplingInterval,
}

/// Resolves timeframes against an injected clock.
#[derive(Clone, Debug)]
pub struct TimeframeResolver {
    clock: Arc<dyn Clock>,
}

impl TimeframeResolver {
    /// Creates a resolver reading "now" from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Resolves `timeframe` to a window ending at the clock's current instant.
    #[must_use]
    pub fn resolve(&self, timeframe: Timeframe) -> TimeframeWindow {
        timeframe.window_at(self.clock.now())
    }
}
