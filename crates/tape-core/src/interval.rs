//! Sampling interval definitions.
//!
//! This module defines [`SamplingInterval`], the bar granularity requested from a
//! raw bar source for a given timeframe window.

use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Granularity of the bars requested for a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingInterval {
    /// One-minute bars.
    OneMinute,
    /// Five-minute bars.
    FiveMinute,
    /// Hourly bars.
    OneHour,
    /// Daily bars.
    OneDay,
}

impl SamplingInterval {
    /// Returns true for every interval shorter than a day.
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(self, Self::OneMinute | Self::FiveMinute | Self::OneHour)
    }

    /// Length of one bar.
    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        match self {
            Self::OneMinute => TimeDelta::minutes(1),
            Self::FiveMinute => TimeDelta::minutes(5),
            Self::OneHour => TimeDelta::hours(1),
            Self::OneDay => TimeDelta::days(1),
        }
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OneMinute => "1m",
            Self::FiveMinute => "5m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intraday() {
        assert!(SamplingInterval::FiveMinute.is_intraday());
        assert!(SamplingInterval::OneHour.is_intraday());
        assert!(!SamplingInterval::OneDay.is_intraday());
    }

    #[test]
    fn test_ordering_by_duration() {
        assert!(SamplingInterval::OneMinute.duration() < SamplingInterval::FiveMinute.duration());
        assert!(SamplingInterval::OneHour.duration() < SamplingInterval::OneDay.duration());
    }
}
