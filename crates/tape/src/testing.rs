//! In-process fake sources for the facade's tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Notify;

use tape_core::{
    ActiveStock, BarSource, CryptoQuote, CryptoQuoteSource, DataError, DataProvider, ForexSource,
    ForexRate, HeadlineSource, MAJOR_PAIRS, ManualClock, MarketMoverSource, MarketMovers,
    MoverQuote, NewsItem, RawBar, Result, SamplingInterval, SectorPerformance, SectorSource,
    Symbol, TimeframeWindow,
};

const ALL_INTERVALS: &[SamplingInterval] = &[
    SamplingInterval::OneMinute,
    SamplingInterval::FiveMinute,
    SamplingInterval::OneHour,
    SamplingInterval::OneDay,
];

/// Tuesday 2024-03-12 11:00 in New York: the market is open.
pub(crate) fn trading_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 12, 15, 0, 0).unwrap()
}

pub(crate) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(trading_morning()))
}

/// Three hourly closes ending at `end`: 100, 110, 121.
pub(crate) fn sample_bars(end: DateTime<Utc>) -> Vec<RawBar> {
    [100.0, 110.0, 121.0]
        .into_iter()
        .enumerate()
        .map(|(i, close)| RawBar::new(end - TimeDelta::hours(2 - i as i64), close))
        .collect()
}

/// Bar source returning fixed bars and counting calls.
#[derive(Debug)]
pub(crate) struct FakeBars {
    name: &'static str,
    bars: Vec<RawBar>,
    intervals: &'static [SamplingInterval],
    delay: Duration,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeBars {
    pub(crate) fn new(name: &'static str, bars: Vec<RawBar>) -> Self {
        Self {
            name,
            bars,
            intervals: ALL_INTERVALS,
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        let source = Self::new(name, Vec::new());
        source.set_failing(true);
        source
    }

    pub(crate) fn daily_only(mut self) -> Self {
        self.intervals = &[SamplingInterval::OneDay];
        self
    }

    pub(crate) const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for FakeBars {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "In-memory bars"
    }

    fn supported_intervals(&self) -> &[SamplingInterval] {
        self.intervals
    }
}

#[async_trait]
impl BarSource for FakeBars {
    async fn fetch_bars(&self, _symbol: &Symbol, _window: &TimeframeWindow) -> Result<Vec<RawBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DataError::unavailable(self.name, "HTTP 503"));
        }
        Ok(self.bars.clone())
    }
}

/// Bar source whose `SLOW` symbol blocks until released.
#[derive(Debug, Default)]
pub(crate) struct GatedBars {
    pub(crate) slow_entered: Notify,
    pub(crate) release_slow: Notify,
}

impl DataProvider for GatedBars {
    fn name(&self) -> &str {
        "gated"
    }

    fn description(&self) -> &str {
        "Bars gated per symbol"
    }

    fn supported_intervals(&self) -> &[SamplingInterval] {
        ALL_INTERVALS
    }
}

#[async_trait]
impl BarSource for GatedBars {
    async fn fetch_bars(&self, symbol: &Symbol, window: &TimeframeWindow) -> Result<Vec<RawBar>> {
        match symbol.as_str() {
            "SLOW" => {
                self.slow_entered.notify_one();
                self.release_slow.notified().await;
                Ok(sample_bars(window.end))
            }
            "EMPTY" => Ok(Vec::new()),
            "BROKEN" => Err(DataError::unavailable("gated", "connection reset")),
            _ => Ok(vec![RawBar::new(window.end, 42.0)]),
        }
    }
}

/// Every overview source at once, with switchable slow and failing sections.
#[derive(Debug, Default)]
pub(crate) struct FakeMarket {
    pub(crate) slow_movers: bool,
    pub(crate) failing_sectors: bool,
}

impl DataProvider for FakeMarket {
    fn name(&self) -> &str {
        "market"
    }

    fn description(&self) -> &str {
        "In-memory market cards"
    }
}

#[async_trait]
impl MarketMoverSource for FakeMarket {
    async fn fetch_movers(&self, _top: usize) -> Result<MarketMovers> {
        if self.slow_movers {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(MarketMovers {
            gainers: vec![MoverQuote {
                symbol: Symbol::new("UP"),
                price: 10.0,
                change: 2.0,
                percent_change: 25.0,
            }],
            losers: Vec::new(),
        })
    }

    async fn fetch_most_active(&self, _top: usize) -> Result<Vec<ActiveStock>> {
        Ok(vec![ActiveStock {
            symbol: Symbol::new("NVDA"),
            volume: 1.0e7,
            price: None,
        }])
    }
}

#[async_trait]
impl CryptoQuoteSource for FakeMarket {
    async fn fetch_crypto_quotes(&self, pairs: &[Symbol]) -> Result<Vec<CryptoQuote>> {
        Ok(pairs
            .iter()
            .map(|p| CryptoQuote {
                symbol: p.clone(),
                ask: 101.0,
                bid: 100.0,
            })
            .collect())
    }
}

#[async_trait]
impl ForexSource for FakeMarket {
    async fn fetch_forex_rates(&self) -> Result<Vec<ForexRate>> {
        Ok(MAJOR_PAIRS
            .iter()
            .map(|&pair| ForexRate::new(pair, Some(1.0)))
            .collect())
    }
}

#[async_trait]
impl SectorSource for FakeMarket {
    async fn fetch_sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        if self.failing_sectors {
            return Err(DataError::unavailable("market", "HTTP 500"));
        }
        Ok(vec![SectorPerformance {
            sector: "Energy".to_string(),
            change_percent: 1.25,
        }])
    }
}

#[async_trait]
impl HeadlineSource for FakeMarket {
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<NewsItem>> {
        Ok((0..limit.min(3))
            .map(|i| NewsItem {
                headline: format!("Headline {i}"),
                ..NewsItem::default()
            })
            .collect())
    }
}

/// Forex source that can start answering with rate-limit errors.
#[derive(Debug, Default)]
pub(crate) struct ThrottledForex {
    throttled: AtomicBool,
    calls: AtomicUsize,
}

impl ThrottledForex {
    pub(crate) fn set_throttled(&self, throttled: bool) {
        self.throttled.store(throttled, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for ThrottledForex {
    fn name(&self) -> &str {
        "throttled forex"
    }

    fn description(&self) -> &str {
        "Forex rates with a daily quota"
    }
}

#[async_trait]
impl ForexSource for ThrottledForex {
    async fn fetch_forex_rates(&self) -> Result<Vec<ForexRate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.throttled.load(Ordering::SeqCst) {
            return Err(DataError::RateLimited {
                provider: "throttled forex".to_string(),
                retry_after: None,
            });
        }
        Ok(MAJOR_PAIRS
            .iter()
            .map(|&pair| ForexRate::new(pair, Some(1.5)))
            .collect())
    }
}
