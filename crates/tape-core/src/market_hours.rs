//! US equity market hours.
//!
//! The regular session runs 09:30 to 16:00 America/New_York, Monday through
//! Friday. Exchange holidays are not modelled.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::clock::Clock;

/// Regular trading session in a civil timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketHours {
    /// Exchange timezone.
    pub timezone: Tz,
    /// Session open, minutes after local midnight (inclusive).
    pub open_minute: u32,
    /// Session close, minutes after local midnight (exclusive).
    pub close_minute: u32,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self::us_equities()
    }
}

impl MarketHours {
    /// NYSE/Nasdaq regular session.
    #[must_use]
    pub const fn us_equities() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            open_minute: 9 * 60 + 30,
            close_minute: 16 * 60,
        }
    }

    /// Whether the session is open at `at`.
    #[must_use]
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let minute = local.hour() * 60 + local.minute();
        minute >= self.open_minute && minute < self.close_minute
    }

    /// Whether the session is open now according to `clock`.
    ///
    /// Reads the clock on every call; callers must not cache the answer.
    #[must_use]
    pub fn is_open(&self, clock: &dyn Clock) -> bool {
        self.is_open_at(clock.now())
    }
}
