#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the tape market dashboard.
//!
//! This crate provides the foundational abstractions shared by every source
//! and by the dashboard facade:
//!
//! - [`TimeframeResolver`](timeframe::TimeframeResolver) - Timeframe to fetch window
//! - [`SeriesAggregator`](aggregate::SeriesAggregator) - Moving average and summary stats
//! - [`MarketHours`](market_hours::MarketHours) - Regular session detection
//! - [`Clock`](clock::Clock) - Injectable source of the current time
//! - [`BarSource`](provider::BarSource) and the other source traits
//! - [`DataCache`](cache::DataCache) - Caching abstraction

/// Series annotation and summary statistics.
pub mod aggregate;
/// Cache trait and types for storing fetched data.
pub mod cache;
/// Injectable clocks.
pub mod clock;
/// Error types for data operations.
pub mod error;
/// Bar sampling intervals.
pub mod interval;
/// Records for movers, quotes, rates, sectors, news and company data.
pub mod market;
/// Trading session detection.
pub mod market_hours;
/// Source traits for fetching market data.
pub mod provider;
/// Text cleanup helpers for feed content.
pub mod text;
/// Chart timeframes and their fetch windows.
pub mod timeframe;
/// Core data types (Symbol, RawBar, SeriesSummary, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use aggregate::{AnnotatedSeries, AveragePolicy, MOVING_AVERAGE_PERIOD, SeriesAggregator};
pub use cache::{CacheEntry, CacheKey, DataCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DataError, Result};
pub use interval::SamplingInterval;
pub use market::{
    ActiveStock, CRYPTO_PAIRS, CompanyOverview, CryptoQuote, ForexPair, ForexRate, KEY_SECTORS, MAJOR_PAIRS,
    MarketMovers, MoverQuote, NewsItem, SearchOutcome, SectorPerformance, TickerMatch,
};
pub use market_hours::MarketHours;
pub use provider::{
    BarSource, CryptoQuoteSource, DataProvider, ForexSource, HeadlineSource, MarketMoverSource,
    ReferenceDataProvider, SectorSource, SymbolNewsSource,
};
pub use timeframe::{Timeframe, TimeframeResolver, TimeframeWindow};
pub use types::{
    AnnotatedPoint, PercentChange, PriceRange, RawBar, SeriesSummary, Symbol, parse_timestamp,
};
