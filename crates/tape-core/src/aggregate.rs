//! Turns raw bars into an annotated, chartable series.
//!
//! [`SeriesAggregator::aggregate`] runs three steps:
//!
//! 1. Drop bars without a timestamp or a finite close. Input order is kept.
//! 2. Attach a 20-sample trailing moving average according to the
//!    [`AveragePolicy`] of the window's timeframe.
//! 3. Derive a [`SeriesSummary`] from the final points, plus the market-open
//!    flag read from the injected clock.
//!
//! An input with no usable bars is [`DataError::EmptySeries`], never a summary
//! full of NaN.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    clock::Clock,
    error::{DataError, Result},
    market_hours::MarketHours,
    timeframe::{Timeframe, TimeframeWindow},
    types::{AnnotatedPoint, PercentChange, PriceRange, RawBar, SeriesSummary},
};

/// Number of samples in the trailing moving average.
pub const MOVING_AVERAGE_PERIOD: usize = 20;

/// How the moving average is computed for a timeframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AveragePolicy {
    /// No moving average at all (`1D`, `5D`).
    Disabled,
    /// Plain trailing mean over the last `period` points.
    Trailing,
    /// Trailing mean that never reaches before `year_start` (`YTD`).
    ///
    /// A point gets a value once its absolute index is at least `period - 1`
    /// and it is on or after the first in-year point; the window is shortened
    /// to the in-year points when fewer than `period` are available.
    YearToDate {
        /// First instant of the year.
        year_start: DateTime<Utc>,
    },
}

impl AveragePolicy {
    /// The policy for a resolved window.
    #[must_use]
    pub const fn for_window(window: &TimeframeWindow) -> Self {
        match window.timeframe {
            Timeframe::OneDay | Timeframe::FiveDays => Self::Disabled,
            Timeframe::YearToDate => Self::YearToDate {
                year_start: window.start,
            },
            Timeframe::OneMonth | Timeframe::SixMonths | Timeframe::OneYear | Timeframe::FiveYears => {
                Self::Trailing
            }
        }
    }

    /// Moving average for every point, aligned with `points`.
    #[must_use]
    pub fn apply(&self, points: &[(DateTime<Utc>, f64)], period: usize) -> Vec<Option<f64>> {
        let n = points.len();
        if period == 0 {
            return vec![None; n];
        }

        match self {
            Self::Disabled => vec![None; n],
            Self::Trailing => (0..n)
                .map(|i| (i + 1 >= period).then(|| mean(&points[i + 1 - period..=i])))
                .collect(),
            Self::YearToDate { year_start } => {
                let Some(first_in_year) = points.iter().position(|(t, _)| t >= year_start) else {
                    return vec![None; n];
                };
                (0..n)
                    .map(|i| {
                        (i >= first_in_year && i + 1 >= period).then(|| {
                            let from = first_in_year.max(i + 1 - period);
                            mean(&points[from..=i])
                        })
                    })
                    .collect()
            }
        }
    }
}

fn mean(points: &[(DateTime<Utc>, f64)]) -> f64 {
    points.iter().map(|(_, p)| p).sum::<f64>() / points.len() as f64
}

/// Annotated points plus their summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSeries {
    /// Points in input order, never empty.
    pub points: Vec<AnnotatedPoint>,
    /// Statistics over `points`.
    pub summary: SeriesSummary,
}

impl AnnotatedSeries {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; an empty series is reported as [`DataError::EmptySeries`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Renders the points as a DataFrame with columns `timestamp` (naive UTC, ms),
    /// `price` and `moving_average` (null where absent).
    pub fn to_frame(&self) -> Result<DataFrame> {
        let timestamps: Vec<i64> = self
            .points
            .iter()
            .map(|p| p.timestamp.timestamp_millis())
            .collect();
        let prices: Vec<f64> = self.points.iter().map(|p| p.price).collect();
        let averages: Vec<Option<f64>> = self.points.iter().map(|p| p.moving_average).collect();

        let df = DataFrame::new(vec![
            Column::new("timestamp".into(), timestamps),
            Column::new("price".into(), prices),
            Column::new("moving_average".into(), averages),
        ])
        .map_err(|e| DataError::Parse(e.to_string()))?;

        df.lazy()
            .with_column(col("timestamp").cast(DataType::Datetime(TimeUnit::Milliseconds, None)))
            .collect()
            .map_err(|e| DataError::Parse(e.to_string()))
    }
}

/// Builds annotated series from raw bars.
#[derive(Clone, Debug)]
pub struct SeriesAggregator {
    clock: Arc<dyn Clock>,
    market_hours: MarketHours,
    period: usize,
}

impl SeriesAggregator {
    /// Creates an aggregator for US equities with a 20-sample moving average.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            market_hours: MarketHours::us_equities(),
            period: MOVING_AVERAGE_PERIOD,
        }
    }

    /// Uses a different trading session for the market-open flag.
    #[must_use]
    pub const fn with_market_hours(mut self, market_hours: MarketHours) -> Self {
        self.market_hours = market_hours;
        self
    }

    /// Annotates `bars` fetched for `window` and summarizes the result.
    ///
    /// Bars are expected in ascending time order. They are not re-sorted; an
    /// out-of-order input is logged and processed as given.
    pub fn aggregate(&self, bars: &[RawBar], window: &TimeframeWindow) -> Result<AnnotatedSeries> {
        let usable: Vec<(DateTime<Utc>, f64)> = bars.iter().filter_map(RawBar::usable).collect();
        let dropped = bars.len() - usable.len();
        debug!(
            timeframe = %window.timeframe,
            kept = usable.len(),
            dropped,
            "Filtered raw bars"
        );

        if usable.is_empty() {
            return Err(DataError::EmptySeries);
        }

        if let Some(at) = usable.windows(2).position(|w| w[1].0 < w[0].0) {
            warn!(
                timeframe = %window.timeframe,
                index = at + 1,
                "Bars are not in ascending time order; moving average follows input order"
            );
        }

        let averages = AveragePolicy::for_window(window).apply(&usable, self.period);
        let points: Vec<AnnotatedPoint> = usable
            .iter()
            .zip(averages)
            .map(|(&(timestamp, price), moving_average)| AnnotatedPoint {
                timestamp,
                price,
                moving_average,
            })
            .collect();

        let summary = self.summarize(&points)?;
        Ok(AnnotatedSeries { points, summary })
    }

    fn summarize(&self, points: &[AnnotatedPoint]) -> Result<SeriesSummary> {
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DataError::EmptySeries),
        };
        let price_range =
            PriceRange::of(points.iter().map(|p| p.price)).ok_or(DataError::EmptySeries)?;

        Ok(SeriesSummary {
            current_price: last.price,
            open_price: first.price,
            percent_change: PercentChange::between(first.price, last.price),
            price_range,
            latest_moving_average: last.moving_average,
            is_market_open: self.market_hours.is_open(self.clock.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeDelta, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn aggregator() -> SeriesAggregator {
        // Saturday: market closed.
        SeriesAggregator::new(Arc::new(ManualClock::new(day(2024, 3, 16))))
    }

    fn daily_bars(start: DateTime<Utc>, prices: impl IntoIterator<Item = f64>) -> Vec<RawBar> {
        prices
            .into_iter()
            .enumerate()
            .map(|(i, p)| RawBar::new(start + TimeDelta::days(i as i64), p))
            .collect()
    }

    fn window(tf: Timeframe, now: DateTime<Utc>) -> TimeframeWindow {
        tf.window_at(now)
    }

    #[test]
    fn test_end_to_end_short_timeframe() {
        let bars = vec![
            RawBar::from_parts(Some("2024-01-01"), Some(100.0)),
            RawBar::from_parts(Some("2024-01-02"), Some(110.0)),
            RawBar::from_parts(Some("2024-01-03"), Some(121.0)),
        ];
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneDay, day(2024, 1, 3)))
            .unwrap();

        assert_eq!(series.len(), 3);
        assert!(series.points.iter().all(|p| p.moving_average.is_none()));
        assert_eq!(series.summary.current_price, 121.0);
        assert_eq!(series.summary.open_price, 100.0);
        assert!((series.summary.percent_change.value().unwrap() - 21.0).abs() < 1e-9);
        assert_eq!(series.summary.price_range, PriceRange { min: 100.0, max: 121.0 });
        assert!(!series.summary.is_market_open);
    }

    #[test]
    fn test_short_timeframes_never_average() {
        let bars = daily_bars(day(2024, 1, 1), (1..=60).map(f64::from));
        for tf in [Timeframe::OneDay, Timeframe::FiveDays] {
            let series = aggregator().aggregate(&bars, &window(tf, day(2024, 3, 1))).unwrap();
            assert_eq!(series.len(), 60);
            assert!(series.points.iter().all(|p| p.moving_average.is_none()));
            assert_eq!(series.summary.latest_moving_average, None);
        }
    }

    #[test]
    fn test_trailing_average() {
        let bars = daily_bars(day(2023, 1, 1), (1..=25).map(f64::from));
        for tf in [
            Timeframe::OneMonth,
            Timeframe::SixMonths,
            Timeframe::OneYear,
            Timeframe::FiveYears,
        ] {
            let series = aggregator().aggregate(&bars, &window(tf, day(2023, 2, 1))).unwrap();
            let ma: Vec<Option<f64>> = series.points.iter().map(|p| p.moving_average).collect();

            assert!(ma[..19].iter().all(Option::is_none), "{tf}");
            // mean(1..=20)
            assert_eq!(ma[19], Some(10.5));
            // mean(6..=25)
            assert_eq!(ma[24], Some(15.5));
            assert_eq!(series.summary.latest_moving_average, Some(15.5));
        }
    }

    #[test]
    fn test_trailing_average_needs_full_period() {
        let bars = daily_bars(day(2023, 1, 1), (1..=19).map(f64::from));
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneYear, day(2023, 2, 1)))
            .unwrap();
        assert!(series.points.iter().all(|p| p.moving_average.is_none()));
    }

    #[test]
    fn test_year_to_date_clips_at_year_start() {
        // 12 bars in late December, then 30 bars from January 1.
        let dec = daily_bars(day(2023, 12, 20), std::iter::repeat_n(1000.0, 12));
        let jan = daily_bars(day(2024, 1, 1), (1..=30).map(f64::from));
        let bars: Vec<RawBar> = dec.into_iter().chain(jan).collect();

        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::YearToDate, day(2024, 2, 15)))
            .unwrap();
        let ma: Vec<Option<f64>> = series.points.iter().map(|p| p.moving_average).collect();

        // Nothing before absolute index 19.
        assert!(ma[..19].iter().all(Option::is_none));
        // Index 19 is the 8th in-year point: mean(1..=8), December excluded.
        assert_eq!(ma[19], Some(4.5));
        // Index 31 is the 20th in-year point: full window of in-year points.
        assert_eq!(ma[31], Some(10.5));
        // Index 41: in-year points 11..=30.
        assert_eq!(ma[41], Some(20.5));
        assert!(ma.iter().flatten().all(|v| *v < 1000.0));
    }

    #[test]
    fn test_year_to_date_window_grows_from_first_in_year_point() {
        // 25 December bars put the first January point past index 19.
        let dec = daily_bars(day(2023, 12, 7), std::iter::repeat_n(1000.0, 25));
        let jan = daily_bars(day(2024, 1, 1), (1..=25).map(f64::from));
        let bars: Vec<RawBar> = dec.into_iter().chain(jan).collect();

        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::YearToDate, day(2024, 2, 1)))
            .unwrap();
        let ma: Vec<Option<f64>> = series.points.iter().map(|p| p.moving_average).collect();

        assert!(ma[..25].iter().all(Option::is_none));
        // January 1 averages only itself, then the window grows.
        assert_eq!(ma[25], Some(1.0));
        assert_eq!(ma[26], Some(1.5));
        assert_eq!(ma[34], Some(5.5));
        // Full period once 20 in-year points exist.
        assert_eq!(ma[44], Some(10.5));
        assert_eq!(ma[49], Some(15.5));
    }

    #[test]
    fn test_year_to_date_without_in_year_points() {
        let bars = daily_bars(day(2023, 11, 1), (1..=30).map(f64::from));
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::YearToDate, day(2024, 1, 10)))
            .unwrap();
        assert!(series.points.iter().all(|p| p.moving_average.is_none()));
    }

    #[test]
    fn test_incomplete_bars_are_dropped() {
        let bars = vec![
            RawBar::from_parts(Some("2024-01-01"), Some(50.0)),
            RawBar::from_parts(None, Some(1.0)),
            RawBar::from_parts(Some("2024-01-02"), None),
            RawBar::from_parts(Some("not a date"), Some(2.0)),
            RawBar::from_parts(Some("2024-01-03"), Some(75.0)),
        ];
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneMonth, day(2024, 1, 3)))
            .unwrap();
        let prices: Vec<f64> = series.points.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![50.0, 75.0]);
        assert_eq!(series.summary.price_range, PriceRange { min: 50.0, max: 75.0 });
    }

    #[test]
    fn test_empty_series() {
        let bars = vec![RawBar::from_parts(None, None), RawBar::default()];
        let result = aggregator().aggregate(&bars, &window(Timeframe::OneMonth, day(2024, 1, 3)));
        assert!(matches!(result, Err(DataError::EmptySeries)));

        let result = aggregator().aggregate(&[], &window(Timeframe::OneDay, day(2024, 1, 3)));
        assert!(matches!(result, Err(DataError::EmptySeries)));
    }

    #[test]
    fn test_zero_first_price_is_undefined() {
        let bars = daily_bars(day(2024, 1, 1), [0.0, 3.0, 4.0]);
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneMonth, day(2024, 1, 4)))
            .unwrap();
        assert_eq!(series.summary.percent_change, PercentChange::Undefined);
        assert_eq!(series.summary.percent_change.to_string(), "N/A");
    }

    #[test]
    fn test_range_bounds_every_price() {
        let prices = [12.5, 11.0, 19.25, 14.0, 11.0, 18.0];
        let bars = daily_bars(day(2024, 1, 1), prices);
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneMonth, day(2024, 1, 10)))
            .unwrap();
        let range = series.summary.price_range;
        assert!(series.points.iter().all(|p| range.min <= p.price && p.price <= range.max));
        assert_eq!(range, PriceRange { min: 11.0, max: 19.25 });
    }

    #[test]
    fn test_unsorted_input_keeps_order() {
        let bars = daily_bars(day(2024, 1, 1), [1.0, 2.0, 3.0]);
        let reversed: Vec<RawBar> = bars.into_iter().rev().collect();
        let series = aggregator()
            .aggregate(&reversed, &window(Timeframe::OneMonth, day(2024, 1, 10)))
            .unwrap();
        assert_eq!(series.summary.open_price, 3.0);
        assert_eq!(series.summary.current_price, 1.0);
    }

    #[test]
    fn test_market_open_follows_clock() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 12, 14, 0, 0).unwrap(),
        ));
        let aggregator = SeriesAggregator::new(clock.clone());
        let bars = daily_bars(day(2024, 3, 1), [1.0, 2.0]);
        let w = window(Timeframe::OneMonth, day(2024, 3, 12));

        assert!(aggregator.aggregate(&bars, &w).unwrap().summary.is_market_open);
        clock.advance(TimeDelta::hours(7));
        assert!(!aggregator.aggregate(&bars, &w).unwrap().summary.is_market_open);
    }

    #[test]
    fn test_to_frame() {
        let bars = daily_bars(day(2023, 1, 1), (1..=21).map(f64::from));
        let series = aggregator()
            .aggregate(&bars, &window(Timeframe::OneYear, day(2023, 2, 1)))
            .unwrap();
        let df = series.to_frame().unwrap();

        assert_eq!(df.height(), 21);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("moving_average").unwrap().null_count(), 19);
        assert!(matches!(
            df.column("timestamp").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, _)
        ));
    }
}
