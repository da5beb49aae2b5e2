//! Records consumed read-only by the dashboard's cards and tables.
//!
//! Sources map their payloads onto these shapes; nothing here talks to the
//! network. Display helpers cover the few derived values the cards show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Symbol;

/// A stock in the gainers or losers list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoverQuote {
    /// Ticker.
    pub symbol: Symbol,
    /// Last price.
    pub price: f64,
    /// Absolute change on the day.
    pub change: f64,
    /// Percent change on the day.
    pub percent_change: f64,
}

/// Top gainers and losers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMovers {
    /// Biggest gainers, best first.
    pub gainers: Vec<MoverQuote>,
    /// Biggest losers, worst first.
    pub losers: Vec<MoverQuote>,
}

/// A stock from the most-active list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveStock {
    /// Ticker.
    pub symbol: Symbol,
    /// Shares traded.
    pub volume: f64,
    /// Last trade price, when the source reports one.
    pub price: Option<f64>,
}

/// Latest bid/ask for a crypto pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoQuote {
    /// Pair symbol such as `BTC/USD`.
    pub symbol: Symbol,
    /// Ask price.
    pub ask: f64,
    /// Bid price.
    pub bid: f64,
}

impl CryptoQuote {
    /// `ask - bid`.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// The base asset, e.g. `BTC` for `BTC/USD`.
    #[must_use]
    pub fn base(&self) -> &str {
        let s = self.symbol.as_str();
        s.strip_suffix("/USD").unwrap_or(s)
    }
}

/// Crypto pairs shown on the crypto card.
pub const CRYPTO_PAIRS: [&str; 5] = ["BTC/USD", "ETH/USD", "SOL/USD", "XRP/USD", "DOGE/USD"];

/// A currency pair such as EUR/USD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForexPair {
    /// Base currency code.
    pub from: &'static str,
    /// Quote currency code.
    pub to: &'static str,
}

impl ForexPair {
    /// Creates a pair.
    #[must_use]
    pub const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }

    /// `FROM/TO`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.from, self.to)
    }

    /// Yen pairs quote to two decimals, everything else to four.
    #[must_use]
    pub fn decimals(&self) -> usize {
        if self.from == "JPY" || self.to == "JPY" { 2 } else { 4 }
    }
}

/// Pairs shown on the forex card.
pub const MAJOR_PAIRS: [ForexPair; 5] = [
    ForexPair::new("EUR", "USD"),
    ForexPair::new("USD", "JPY"),
    ForexPair::new("GBP", "USD"),
    ForexPair::new("USD", "CHF"),
    ForexPair::new("AUD", "USD"),
];

/// Exchange rate for one pair. `rate` is `None` when the source had no usable value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForexRate {
    /// `FROM/TO` label.
    pub pair: String,
    /// Exchange rate.
    pub rate: Option<f64>,
    /// Decimal places used when rendering.
    pub decimals: usize,
}

impl ForexRate {
    /// Creates a rate for `pair`.
    #[must_use]
    pub fn new(pair: ForexPair, rate: Option<f64>) -> Self {
        Self {
            pair: pair.label(),
            rate,
            decimals: pair.decimals(),
        }
    }

    /// `EUR/USD: 1.0850` or `EUR/USD: N/A`.
    #[must_use]
    pub fn display(&self) -> String {
        match self.rate {
            Some(rate) => format!("{}: {:.*}", self.pair, self.decimals, rate),
            None => format!("{}: N/A", self.pair),
        }
    }
}

/// Sectors shown on the sector card.
pub const KEY_SECTORS: [&str; 7] = [
    "Technology",
    "Financial Services",
    "Healthcare",
    "Energy",
    "Consumer Cyclical",
    "Real Estate",
    "Utilities",
];

/// Daily performance of a market sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    /// Sector name.
    pub sector: String,
    /// Percent change on the day.
    pub change_percent: f64,
}

impl SectorPerformance {
    /// `+1.25%` or `-0.40%`.
    #[must_use]
    pub fn display_change(&self) -> String {
        let sign = if self.change_percent > 0.0 { "+" } else { "" };
        format!("{sign}{:.2}%", self.change_percent)
    }
}

/// A news headline from any source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline text.
    pub headline: String,
    /// Summary or description text.
    pub summary: String,
    /// Link to the article.
    pub url: String,
    /// Author, when known.
    pub author: Option<String>,
    /// Publication time, when known.
    pub published_at: Option<DateTime<Utc>>,
    /// Publisher, when known.
    pub source: Option<String>,
    /// Tickers the article is tagged with.
    pub symbols: Vec<Symbol>,
}

/// Company reference data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    /// Ticker.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Business description.
    pub description: Option<String>,
    /// Standard industrial classification description.
    pub sic_description: Option<String>,
    /// Company homepage.
    pub homepage_url: Option<String>,
    /// Market capitalization in USD.
    pub market_cap: Option<f64>,
    /// Market locale, e.g. `us`.
    pub locale: Option<String>,
}

impl CompanyOverview {
    /// Market cap as `$2.95T`, `$812.40B`, `$15.00M`, `$950000` or `N/A`.
    #[must_use]
    pub fn market_cap_display(&self) -> String {
        match self.market_cap {
            None => "N/A".to_string(),
            Some(cap) if cap >= 1e12 => format!("${:.2}T", cap / 1e12),
            Some(cap) if cap >= 1e9 => format!("${:.2}B", cap / 1e9),
            Some(cap) if cap >= 1e6 => format!("${:.2}M", cap / 1e6),
            Some(cap) => format!("${cap}"),
        }
    }

    /// Industry in sentence case, e.g. `Electronic Computers`.
    #[must_use]
    pub fn industry(&self) -> String {
        self.sic_description
            .as_deref()
            .map(crate::text::title_case)
            .unwrap_or_default()
    }

    /// Locale uppercased, e.g. `US`.
    #[must_use]
    pub fn locale_display(&self) -> String {
        self.locale.as_deref().unwrap_or_default().to_uppercase()
    }
}

/// A ticker returned by a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickerMatch {
    /// Ticker.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
}

/// Result of a ticker search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// The query named a ticker exactly; go straight to it.
    ExactMatch(Symbol),
    /// Candidate tickers, possibly empty.
    Matches(Vec<TickerMatch>),
}

impl SearchOutcome {
    /// Picks an exact (case-insensitive) ticker match for `query` out of `matches`.
    #[must_use]
    pub fn from_matches(query: &str, matches: Vec<TickerMatch>) -> Self {
        let wanted = Symbol::new(query);
        match matches.iter().find(|m| m.symbol == wanted) {
            Some(exact) => Self::ExactMatch(exact.symbol.clone()),
            None => Self::Matches(matches),
        }
    }
}
