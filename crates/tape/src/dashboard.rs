//! Source registry with timeouts, caching and stale fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use tape_cache::InMemoryCache;
use tape_core::{
    ActiveStock, BarSource, CRYPTO_PAIRS, CacheKey, Clock, CompanyOverview, CryptoQuote,
    CryptoQuoteSource, DataCache, DataError, DataProvider, ForexRate, ForexSource,
    HeadlineSource, MarketMoverSource, MarketMovers, NewsItem, RawBar, ReferenceDataProvider,
    Result, SearchOutcome, SectorPerformance, SectorSource, SeriesAggregator, Symbol,
    SymbolNewsSource, SystemClock, Timeframe, TimeframeResolver, TimeframeWindow,
};

use crate::config::{DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT, DashboardConfig};
use crate::overview::{ChartView, MarketOverview};

/// Entries in the movers and most-active lists.
pub const TOP_MOVERS: usize = 5;

/// Market headlines shown on the news card.
pub const HEADLINE_LIMIT: usize = 10;

/// Articles shown for a single symbol.
pub const SYMBOL_NEWS_LIMIT: usize = 10;

/// Registry of market data sources behind a shared response cache.
///
/// Every outbound call is bounded by the request timeout. Responses are cached
/// per request; a fresh entry is served without touching the network, and a
/// stale entry stands in when a refresh fails with a transient error. Sources
/// of the same kind are tried in registration order until one succeeds.
///
/// # Example
///
/// ```rust,ignore
/// use tape::{Dashboard, Symbol, Timeframe};
///
/// let dashboard = Dashboard::new().with_alpaca("key_id", "secret_key");
/// let chart = dashboard.load_chart(&Symbol::new("AAPL"), Timeframe::OneMonth).await?;
/// println!("{}", chart.series.summary.percent_change);
/// ```
pub struct Dashboard {
    bar_sources: Vec<Arc<dyn BarSource>>,
    mover_sources: Vec<Arc<dyn MarketMoverSource>>,
    crypto_sources: Vec<Arc<dyn CryptoQuoteSource>>,
    forex_sources: Vec<Arc<dyn ForexSource>>,
    sector_sources: Vec<Arc<dyn SectorSource>>,
    headline_sources: Vec<Arc<dyn HeadlineSource>>,
    symbol_news_sources: Vec<Arc<dyn SymbolNewsSource>>,
    reference_sources: Vec<Arc<dyn ReferenceDataProvider>>,
    cache: Arc<dyn DataCache>,
    clock: Arc<dyn Clock>,
    resolver: TimeframeResolver,
    aggregator: SeriesAggregator,
    request_timeout: Duration,
    cache_ttl: Duration,
}

fn names<P: DataProvider + ?Sized>(sources: &[Arc<P>]) -> Vec<&str> {
    sources.iter().map(|p| p.name()).collect()
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("bar_sources", &names(&self.bar_sources))
            .field("mover_sources", &names(&self.mover_sources))
            .field("crypto_sources", &names(&self.crypto_sources))
            .field("forex_sources", &names(&self.forex_sources))
            .field("sector_sources", &names(&self.sector_sources))
            .field("headline_sources", &names(&self.headline_sources))
            .field("symbol_news_sources", &names(&self.symbol_news_sources))
            .field("reference_sources", &names(&self.reference_sources))
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    /// Create an empty dashboard on the system clock with an in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty dashboard reading time from `clock`.
    ///
    /// The resolver, the aggregator's market-open flag and the default
    /// in-memory cache all share this clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            bar_sources: Vec::new(),
            mover_sources: Vec::new(),
            crypto_sources: Vec::new(),
            forex_sources: Vec::new(),
            sector_sources: Vec::new(),
            headline_sources: Vec::new(),
            symbol_news_sources: Vec::new(),
            reference_sources: Vec::new(),
            cache: Arc::new(InMemoryCache::with_clock(clock.clone())),
            resolver: TimeframeResolver::new(clock.clone()),
            aggregator: SeriesAggregator::new(clock.clone()),
            clock,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Create a dashboard with every source whose credentials `config` holds.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;

        let dashboard = Self::new()
            .set_request_timeout(config.request_timeout())
            .set_cache_ttl(config.cache_ttl());

        #[cfg(feature = "alpaca")]
        let dashboard = match &config.alpaca {
            Some(alpaca) => dashboard.with_alpaca(&alpaca.api_key, &alpaca.secret_key),
            None => dashboard,
        };
        #[cfg(feature = "fmp")]
        let dashboard = match &config.fmp_api_key {
            Some(key) => dashboard.with_fmp(key),
            None => dashboard,
        };
        #[cfg(feature = "polygon")]
        let dashboard = match &config.polygon_api_key {
            Some(key) => dashboard.with_polygon(key),
            None => dashboard,
        };
        #[cfg(feature = "alphavantage")]
        let dashboard = match &config.alpha_vantage_api_key {
            Some(key) => dashboard.with_alphavantage(key),
            None => dashboard,
        };
        #[cfg(feature = "nasdaq")]
        let dashboard = if config.nasdaq_news {
            dashboard.with_nasdaq()
        } else {
            dashboard
        };

        debug!(dashboard = ?dashboard, "Dashboard configured");
        Ok(dashboard)
    }

    /// Replace the response cache.
    #[must_use]
    pub fn set_cache(mut self, cache: Arc<dyn DataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Set the bound on each outbound call.
    #[must_use]
    pub const fn set_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how long a cached response counts as fresh.
    #[must_use]
    pub const fn set_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Register a bar source. Earlier registrations are tried first.
    pub fn register_bars(&mut self, source: Arc<dyn BarSource>) {
        debug!(provider = source.name(), "Registering bar source");
        self.bar_sources.push(source);
    }

    /// Register a movers and most-active source.
    pub fn register_movers(&mut self, source: Arc<dyn MarketMoverSource>) {
        debug!(provider = source.name(), "Registering movers source");
        self.mover_sources.push(source);
    }

    /// Register a crypto quote source.
    pub fn register_crypto(&mut self, source: Arc<dyn CryptoQuoteSource>) {
        debug!(provider = source.name(), "Registering crypto source");
        self.crypto_sources.push(source);
    }

    /// Register a forex source.
    pub fn register_forex(&mut self, source: Arc<dyn ForexSource>) {
        debug!(provider = source.name(), "Registering forex source");
        self.forex_sources.push(source);
    }

    /// Register a sector performance source.
    pub fn register_sectors(&mut self, source: Arc<dyn SectorSource>) {
        debug!(provider = source.name(), "Registering sector source");
        self.sector_sources.push(source);
    }

    /// Register a market headline source.
    pub fn register_headlines(&mut self, source: Arc<dyn HeadlineSource>) {
        debug!(provider = source.name(), "Registering headline source");
        self.headline_sources.push(source);
    }

    /// Register a per-symbol news source.
    pub fn register_symbol_news(&mut self, source: Arc<dyn SymbolNewsSource>) {
        debug!(provider = source.name(), "Registering symbol news source");
        self.symbol_news_sources.push(source);
    }

    /// Register a reference data source.
    pub fn register_reference(&mut self, source: Arc<dyn ReferenceDataProvider>) {
        debug!(provider = source.name(), "Registering reference source");
        self.reference_sources.push(source);
    }

    /// The clock shared by every time-dependent component.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Resolves the window for `timeframe` at the current instant.
    #[must_use]
    pub fn resolve(&self, timeframe: Timeframe) -> TimeframeWindow {
        self.resolver.resolve(timeframe)
    }

    /// Loads and annotates the chart for `symbol` over `timeframe`.
    ///
    /// Fails with [`DataError::EmptySeries`] when the source returned no usable bar.
    pub async fn load_chart(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<ChartView> {
        let window = self.resolve(timeframe);
        let bars = self.fetch_bars(symbol, &window).await?;
        let series = self.aggregator.aggregate(&bars, &window)?;

        debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            points = series.len(),
            "Chart loaded"
        );
        Ok(ChartView {
            symbol: symbol.clone(),
            window,
            series,
        })
    }

    /// Raw bars for `symbol` over `window`, cached per symbol and timeframe.
    pub async fn fetch_bars(&self, symbol: &Symbol, window: &TimeframeWindow) -> Result<Vec<RawBar>> {
        let key = CacheKey::new("bars", format!("{symbol}:{}", window.timeframe));
        let window = *window;

        let sources: Vec<Arc<dyn BarSource>> = self
            .bar_sources
            .iter()
            .filter(|s| s.supports_window(&window))
            .cloned()
            .collect();
        if sources.is_empty() && !self.bar_sources.is_empty() {
            return Err(DataError::NotSupported(format!(
                "No bar source supports {} bars",
                window.interval
            )));
        }

        self.cached(
            key,
            self.first_success("bar", &sources, |source| async move {
                source.fetch_bars(symbol, &window).await
            }),
        )
        .await
    }

    /// Top gainers and losers.
    pub async fn market_movers(&self) -> Result<MarketMovers> {
        self.cached(
            CacheKey::new("movers", format!("top{TOP_MOVERS}")),
            self.first_success("movers", &self.mover_sources, |source| async move {
                source.fetch_movers(TOP_MOVERS).await
            }),
        )
        .await
    }

    /// Most active stocks by volume.
    pub async fn most_active(&self) -> Result<Vec<ActiveStock>> {
        self.cached(
            CacheKey::new("most_active", format!("top{TOP_MOVERS}")),
            self.first_success("most active", &self.mover_sources, |source| async move {
                source.fetch_most_active(TOP_MOVERS).await
            }),
        )
        .await
    }

    /// Latest quotes for the card's crypto pairs.
    pub async fn crypto_quotes(&self) -> Result<Vec<CryptoQuote>> {
        let pairs: Vec<Symbol> = CRYPTO_PAIRS.iter().map(Symbol::new).collect();
        let pairs = &pairs;
        self.cached(
            CacheKey::new("crypto", CRYPTO_PAIRS.join(",")),
            self.first_success("crypto", &self.crypto_sources, |source| async move {
                source.fetch_crypto_quotes(pairs).await
            }),
        )
        .await
    }

    /// Rates for the major forex pairs.
    pub async fn forex_rates(&self) -> Result<Vec<ForexRate>> {
        self.cached(
            CacheKey::new("forex", "majors"),
            self.first_success("forex", &self.forex_sources, |source| async move {
                source.fetch_forex_rates().await
            }),
        )
        .await
    }

    /// Today's performance of the key sectors.
    pub async fn sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        self.cached(
            CacheKey::new("sectors", "key"),
            self.first_success("sector", &self.sector_sources, |source| async move {
                source.fetch_sector_performance().await
            }),
        )
        .await
    }

    /// Latest market headlines.
    pub async fn headlines(&self) -> Result<Vec<NewsItem>> {
        self.cached(
            CacheKey::new("headlines", HEADLINE_LIMIT.to_string()),
            self.first_success("headline", &self.headline_sources, |source| async move {
                source.fetch_headlines(HEADLINE_LIMIT).await
            }),
        )
        .await
    }

    /// Latest news tagged with `symbol`.
    pub async fn symbol_news(&self, symbol: &Symbol) -> Result<Vec<NewsItem>> {
        self.cached(
            CacheKey::new("news", symbol.as_str()),
            self.first_success("symbol news", &self.symbol_news_sources, |source| async move {
                source.fetch_symbol_news(symbol, SYMBOL_NEWS_LIMIT).await
            }),
        )
        .await
    }

    /// Company reference data for `symbol`.
    pub async fn company_overview(&self, symbol: &Symbol) -> Result<CompanyOverview> {
        self.cached(
            CacheKey::new("overview", symbol.as_str()),
            self.first_success("reference", &self.reference_sources, |source| async move {
                source.company_overview(symbol).await
            }),
        )
        .await
    }

    /// Searches tickers; an exact ticker match short-circuits to that symbol.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DataError::InvalidParameter(
                "search query must not be empty".to_string(),
            ));
        }
        self.cached(
            CacheKey::new("search", query.to_uppercase()),
            self.first_success("reference", &self.reference_sources, |source| async move {
                source.search(query).await
            }),
        )
        .await
    }

    /// Loads every overview card concurrently.
    ///
    /// Each card has its own timeout, cache entry and result.
    pub async fn market_overview(&self) -> MarketOverview {
        let (movers, most_active, crypto, forex, sectors, headlines) = tokio::join!(
            self.market_movers(),
            self.most_active(),
            self.crypto_quotes(),
            self.forex_rates(),
            self.sector_performance(),
            self.headlines(),
        );

        let overview = MarketOverview {
            movers,
            most_active,
            crypto,
            forex,
            sectors,
            headlines,
        };
        for (section, error) in overview.failures() {
            warn!(section, error = %error, "Overview section failed");
        }
        overview
    }

    /// Drops cache entries older than the TTL, losing their stale fallback.
    pub async fn evict_stale(&self) -> Result<usize> {
        self.cache.invalidate_stale(self.cache_ttl).await
    }

    /// Serves `key` from the cache while fresh, otherwise runs `fetch`.
    ///
    /// A successful fetch is stored. A transient failure is answered with the
    /// stale entry when there is one.
    async fn cached<T, F>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        let entry = match self.cache.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        };

        if let Some(entry) = &entry {
            if !entry.is_stale(self.cache_ttl, self.clock.now()) {
                match serde_json::from_str(&entry.payload) {
                    Ok(value) => {
                        debug!(key = %key, "Serving cached response");
                        return Ok(value);
                    }
                    Err(e) => warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
                }
            }
        }

        match fetch.await {
            Ok(value) => {
                match serde_json::to_string(&value) {
                    Ok(payload) => {
                        if let Err(e) = self.cache.put(&key, payload).await {
                            warn!(key = %key, error = %e, "Failed to cache response");
                        }
                    }
                    Err(e) => warn!(key = %key, error = %e, "Failed to encode response"),
                }
                Ok(value)
            }
            Err(e) if e.is_transient() => {
                let stale = entry.and_then(|entry| {
                    serde_json::from_str(&entry.payload)
                        .ok()
                        .map(|value| (entry.age(self.clock.now()), value))
                });
                match stale {
                    Some((age, value)) => {
                        warn!(
                            key = %key,
                            error = %e,
                            age_secs = age.num_seconds(),
                            "Refresh failed, serving stale response"
                        );
                        Ok(value)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Calls `sources` in order until one succeeds, each under the timeout.
    async fn first_success<P, T, F, Fut>(&self, kind: &str, sources: &[Arc<P>], call: F) -> Result<T>
    where
        P: DataProvider + ?Sized,
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if sources.is_empty() {
            return Err(DataError::ProviderNotConfigured(format!(
                "No {kind} sources registered"
            )));
        }

        let mut last_error = None;
        for source in sources {
            debug!(provider = source.name(), kind, "Fetching");

            match self.bounded(source.name(), call(Arc::clone(source))).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        provider = source.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::Other("All providers failed with no error".to_string())))
    }

    async fn bounded<T>(&self, provider: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DataError::unavailable(
                provider,
                format!("timed out after {:?}", self.request_timeout),
            )),
        }
    }

    // Builder methods for easy setup with specific providers

    /// Add Alpaca for bars, movers, crypto quotes and symbol news.
    #[cfg(feature = "alpaca")]
    #[must_use]
    pub fn with_alpaca(mut self, api_key: &str, secret_key: &str) -> Self {
        let provider = Arc::new(tape_alpaca::AlpacaProvider::new(api_key, secret_key));
        self.register_bars(provider.clone());
        self.register_movers(provider.clone());
        self.register_crypto(provider.clone());
        self.register_symbol_news(provider);
        self
    }

    /// Add Financial Modeling Prep for sector performance and daily bars.
    #[cfg(feature = "fmp")]
    #[must_use]
    pub fn with_fmp(mut self, api_key: &str) -> Self {
        let provider = Arc::new(tape_fmp::FmpProvider::new(api_key));
        self.register_bars(provider.clone());
        self.register_sectors(provider);
        self
    }

    /// Add Polygon for company overviews and ticker search.
    #[cfg(feature = "polygon")]
    #[must_use]
    pub fn with_polygon(mut self, api_key: &str) -> Self {
        self.register_reference(Arc::new(tape_polygon::PolygonProvider::new(api_key)));
        self
    }

    /// Add Alpha Vantage for forex rates.
    #[cfg(feature = "alphavantage")]
    #[must_use]
    pub fn with_alphavantage(mut self, api_key: &str) -> Self {
        self.register_forex(Arc::new(tape_alphavantage::AlphaVantageProvider::new(
            api_key,
        )));
        self
    }

    /// Add the Nasdaq RSS feed for market headlines.
    #[cfg(feature = "nasdaq")]
    #[must_use]
    pub fn with_nasdaq(mut self) -> Self {
        self.register_headlines(Arc::new(tape_nasdaq::NasdaqProvider::new()));
        self
    }
}
