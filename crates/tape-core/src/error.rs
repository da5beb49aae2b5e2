//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers all error cases that can occur
//! when resolving timeframes, fetching from a source, aggregating a series, or
//! caching a response.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// A source could not be reached, timed out, or answered with a non-success status.
    #[error("{provider} unavailable: {reason}")]
    SourceUnavailable {
        /// The provider that failed.
        provider: String,
        /// What went wrong.
        reason: String,
    },

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No usable bars remained after filtering.
    #[error("No data available")]
    EmptySeries,

    /// A timeframe token outside `1D, 5D, 1M, 6M, YTD, 1Y, 5Y`.
    #[error("Invalid timeframe token: {0}")]
    InvalidTimeframe(String),

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Shorthand for [`DataError::SourceUnavailable`].
    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true when a cached value may stand in for the failed call.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::RateLimited { .. } | Self::Parse(_)
        )
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = DataError::unavailable("Alpaca", "HTTP 503");
        assert_eq!(err.to_string(), "Alpaca unavailable: HTTP 503");
        assert!(err.is_transient());
    }

    #[test]
    fn test_empty_series_is_not_transient() {
        assert!(!DataError::EmptySeries.is_transient());
        assert_eq!(DataError::EmptySeries.to_string(), "No data available");
    }
}
