#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Data layer for a market dashboard.
//!
//! This crate re-exports the core types and source implementations and
//! provides a [`Dashboard`] that resolves chart timeframes, annotates price
//! series and serves every market card through a shared response cache with
//! bounded requests and source fallback. [`ChartSession`] keeps the chart
//! panel consistent when selections overlap.
//!
//! # Features
//!
//! - `alpaca` - Alpaca bars, movers, most active, crypto quotes and symbol news
//! - `polygon` - Polygon company overview and ticker search
//! - `fmp` - Financial Modeling Prep sector performance and daily bars
//! - `alphavantage` - Alpha Vantage forex rates
//! - `nasdaq` - Nasdaq RSS market headlines
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tape::{ChartSession, Dashboard, DashboardConfig, Symbol, Timeframe};
//!
//! #[tokio::main]
//! async fn main() -> tape::Result<()> {
//!     let dashboard = Arc::new(Dashboard::from_config(&DashboardConfig::from_env()?)?);
//!
//!     let overview = dashboard.market_overview().await;
//!     for (section, error) in overview.failures() {
//!         eprintln!("{section}: {error}");
//!     }
//!
//!     let session = ChartSession::new(dashboard);
//!     session.select(&Symbol::new("AAPL"), Timeframe::YearToDate).await;
//!     println!("{:?}", session.current().await);
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use tape_core::*;

// Cache implementations
pub use tape_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "alpaca")]
pub use tape_alpaca::AlpacaProvider;
#[cfg(feature = "alphavantage")]
pub use tape_alphavantage::AlphaVantageProvider;
#[cfg(feature = "fmp")]
pub use tape_fmp::FmpProvider;
#[cfg(feature = "nasdaq")]
pub use tape_nasdaq::NasdaqProvider;
#[cfg(feature = "polygon")]
pub use tape_polygon::PolygonProvider;

mod config;
pub use config::{AlpacaCredentials, DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT, DashboardConfig};

mod dashboard;
pub use dashboard::{Dashboard, HEADLINE_LIMIT, SYMBOL_NEWS_LIMIT, TOP_MOVERS};

mod overview;
pub use overview::{ChartView, MarketOverview};

mod session;
pub use session::{ChartSession, ChartState, ChartUpdate};

#[cfg(test)]
mod testing;
