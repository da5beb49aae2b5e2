//! Composite market overview.

use tape_core::{
    ActiveStock, AnnotatedSeries, CryptoQuote, DataError, ForexRate, MarketMovers, NewsItem,
    Result, SectorPerformance, Symbol, TimeframeWindow,
};

/// Every card of the market page, each loaded independently.
///
/// A failed section carries its own error and does not affect the others.
#[derive(Debug)]
pub struct MarketOverview {
    /// Top gainers and losers.
    pub movers: Result<MarketMovers>,
    /// Most active stocks by volume.
    pub most_active: Result<Vec<ActiveStock>>,
    /// Crypto bid/ask quotes.
    pub crypto: Result<Vec<CryptoQuote>>,
    /// Major forex pairs.
    pub forex: Result<Vec<ForexRate>>,
    /// Key sector performance.
    pub sectors: Result<Vec<SectorPerformance>>,
    /// Market headlines.
    pub headlines: Result<Vec<NewsItem>>,
}

impl MarketOverview {
    /// Sections that failed, by name.
    #[must_use]
    pub fn failures(&self) -> Vec<(&'static str, &DataError)> {
        [
            ("movers", self.movers.as_ref().err()),
            ("most_active", self.most_active.as_ref().err()),
            ("crypto", self.crypto.as_ref().err()),
            ("forex", self.forex.as_ref().err()),
            ("sectors", self.sectors.as_ref().err()),
            ("headlines", self.headlines.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(name, err)| err.map(|e| (name, e)))
        .collect()
    }

    /// True when every section loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}

/// A loaded chart: the resolved window and its annotated series.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartView {
    /// Charted symbol.
    pub symbol: Symbol,
    /// Window the bars were requested for.
    pub window: TimeframeWindow,
    /// Annotated points and summary.
    pub series: AnnotatedSeries,
}

impl ChartView {
    /// X-axis label for every point, formatted for the timeframe.
    #[must_use]
    pub fn axis_labels(&self) -> Vec<String> {
        self.series
            .points
            .iter()
            .map(|p| self.window.timeframe.axis_label(p.timestamp))
            .collect()
    }
}
