//! Chart selection where the most recent request wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use tape_core::{DataError, Symbol, Timeframe};

use crate::dashboard::Dashboard;
use crate::overview::ChartView;

/// What the chart panel shows after a load.
#[derive(Clone, Debug)]
pub enum ChartState {
    /// The series loaded.
    Ready(ChartView),
    /// The source answered with no usable bars.
    NoData {
        /// Requested symbol.
        symbol: Symbol,
        /// Requested timeframe.
        timeframe: Timeframe,
    },
    /// The load failed.
    Failed {
        /// Requested symbol.
        symbol: Symbol,
        /// Requested timeframe.
        timeframe: Timeframe,
        /// Why.
        error: Arc<DataError>,
    },
}

impl ChartState {
    /// Symbol the state belongs to.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Ready(view) => &view.symbol,
            Self::NoData { symbol, .. } | Self::Failed { symbol, .. } => symbol,
        }
    }

    /// Timeframe the state belongs to.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        match self {
            Self::Ready(view) => view.window.timeframe,
            Self::NoData { timeframe, .. } | Self::Failed { timeframe, .. } => *timeframe,
        }
    }
}

/// Outcome of [`ChartSession::select`].
#[derive(Clone, Debug)]
pub enum ChartUpdate {
    /// This request was the latest and its result is now current.
    Applied(ChartState),
    /// A newer selection was made while this one loaded; its result was dropped.
    Superseded {
        /// Sequence number of the dropped request.
        ticket: u64,
    },
}

/// The chart panel's state across overlapping selections.
///
/// Each selection takes a ticket. When a load completes, its result is
/// applied only if no later selection has started; otherwise it is dropped
/// so a slow earlier response never overwrites a newer one.
#[derive(Debug)]
pub struct ChartSession {
    dashboard: Arc<Dashboard>,
    latest: AtomicU64,
    state: RwLock<Option<ChartState>>,
}

impl ChartSession {
    /// Create a session with nothing selected.
    #[must_use]
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self {
            dashboard,
            latest: AtomicU64::new(0),
            state: RwLock::new(None),
        }
    }

    /// Loads `symbol` over `timeframe` and makes it current unless superseded.
    pub async fn select(&self, symbol: &Symbol, timeframe: Timeframe) -> ChartUpdate {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, symbol = %symbol, timeframe = %timeframe, "Chart selected");

        let next = match self.dashboard.load_chart(symbol, timeframe).await {
            Ok(view) => ChartState::Ready(view),
            Err(DataError::EmptySeries) => ChartState::NoData {
                symbol: symbol.clone(),
                timeframe,
            },
            Err(e) => ChartState::Failed {
                symbol: symbol.clone(),
                timeframe,
                error: Arc::new(e),
            },
        };

        // Compare under the write lock so a newer ticket cannot apply in between.
        let mut state = self.state.write().await;
        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(ticket, symbol = %symbol, "Dropping superseded chart");
            return ChartUpdate::Superseded { ticket };
        }
        *state = Some(next.clone());
        ChartUpdate::Applied(next)
    }

    /// The most recently applied state.
    pub async fn current(&self) -> Option<ChartState> {
        self.state.read().await.clone()
    }
}
