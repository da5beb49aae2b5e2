//! Source traits for fetching market data.
//!
//! This module defines the core source traits:
//!
//! - [`DataProvider`] - Base trait for all data sources
//! - [`BarSource`] - Price bars for a symbol over a timeframe window
//! - [`MarketMoverSource`] - Top gainers, losers and most active stocks
//! - [`CryptoQuoteSource`] - Latest crypto bid/ask quotes
//! - [`ForexSource`] - Currency exchange rates
//! - [`SectorSource`] - Sector performance
//! - [`HeadlineSource`] - Market-wide news headlines
//! - [`SymbolNewsSource`] - News tagged with a symbol
//! - [`ReferenceDataProvider`] - Company metadata and ticker search
//!
//! Implementations perform exactly one logical request per call. Timeouts,
//! caching and fallback between sources belong to the caller.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    interval::SamplingInterval,
    market::{
        ActiveStock, CompanyOverview, CryptoQuote, ForexRate, MarketMovers, NewsItem,
        SearchOutcome, SectorPerformance,
    },
    timeframe::TimeframeWindow,
    types::{RawBar, Symbol},
};

/// Base trait for all data sources.
///
/// All sources must implement this trait to provide basic metadata
/// about the source and its capabilities.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "Alpaca").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;

    /// Returns the bar intervals supported by this source.
    ///
    /// Sources without price bars return an empty slice.
    fn supported_intervals(&self) -> &[SamplingInterval] {
        &[]
    }
}

/// Source of raw price bars.
#[async_trait]
pub trait BarSource: DataProvider {
    /// Fetches bars for `symbol` covering `window`, sampled at `window.interval`.
    ///
    /// Returns bars in ascending time order. Fields the upstream omits are left
    /// `None`; filtering is up to the aggregator. An empty vector is a valid
    /// answer for a symbol with no trades in the window.
    async fn fetch_bars(&self, symbol: &Symbol, window: &TimeframeWindow) -> Result<Vec<RawBar>>;

    /// Whether this source can serve `window` at all.
    fn supports_window(&self, window: &TimeframeWindow) -> bool {
        self.supported_intervals().contains(&window.interval)
    }
}

/// Source of daily market movers.
#[async_trait]
pub trait MarketMoverSource: DataProvider {
    /// Fetches the top gainers and losers.
    async fn fetch_movers(&self, top: usize) -> Result<MarketMovers>;

    /// Fetches the most active stocks by volume.
    async fn fetch_most_active(&self, top: usize) -> Result<Vec<ActiveStock>>;
}

/// Source of crypto quotes.
#[async_trait]
pub trait CryptoQuoteSource: DataProvider {
    /// Fetches the latest quote for each pair, e.g. `BTC/USD`.
    ///
    /// Pairs the upstream does not know are omitted from the result.
    async fn fetch_crypto_quotes(&self, pairs: &[Symbol]) -> Result<Vec<CryptoQuote>>;
}

/// Source of currency exchange rates.
#[async_trait]
pub trait ForexSource: DataProvider {
    /// Fetches the rate for every major pair.
    ///
    /// A pair that fails individually yields a [`ForexRate`] with `rate: None`;
    /// the call only errors when the source itself is unusable.
    async fn fetch_forex_rates(&self) -> Result<Vec<ForexRate>>;
}

/// Source of sector performance.
#[async_trait]
pub trait SectorSource: DataProvider {
    /// Fetches today's change for the key sectors.
    async fn fetch_sector_performance(&self) -> Result<Vec<SectorPerformance>>;
}

/// Source of market-wide headlines.
#[async_trait]
pub trait HeadlineSource: DataProvider {
    /// Fetches up to `limit` latest headlines, newest first.
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<NewsItem>>;
}

/// Source of news about a specific symbol.
#[async_trait]
pub trait SymbolNewsSource: DataProvider {
    /// Fetches up to `limit` latest articles tagged with `symbol`, newest first.
    async fn fetch_symbol_news(&self, symbol: &Symbol, limit: usize) -> Result<Vec<NewsItem>>;
}

/// Provider for reference/metadata.
///
/// Implement this trait to provide company information and ticker search.
#[async_trait]
pub trait ReferenceDataProvider: DataProvider {
    /// Fetches company information for a symbol.
    async fn company_overview(&self, symbol: &Symbol) -> Result<CompanyOverview>;

    /// Searches tickers and company names for `query`.
    async fn search(&self, query: &str) -> Result<SearchOutcome>;
}
