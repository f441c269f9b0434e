//! Market-data provider trait and structured error types.
//!
//! The `MarketDataProvider` trait abstracts over data sources (Yahoo Finance,
//! a directory of CSV files, synthetic bars) so the batch runner can swap
//! implementations and mock them in tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::session::Session;
use crate::domain::{Exchange, Series, SeriesError};

/// Default history depth requested per symbol.
pub const DEFAULT_BAR_COUNT: usize = 1500;

/// Upper bound on `bar_count`, a few centuries of trading days.
pub const MAX_BAR_COUNT: usize = 100_000;

/// Bar interval. The engine only works on daily bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Daily,
}

/// One history request: the most recent `bar_count` bars of `symbol` on `exchange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub symbol: String,
    pub exchange: Exchange,
    pub interval: Interval,
    pub bar_count: usize,
}

impl HistoryRequest {
    pub fn daily(symbol: impl Into<String>, exchange: Exchange, bar_count: usize) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            interval: Interval::Daily,
            bar_count,
        }
    }

    pub fn check_bar_count(&self) -> Result<(), FetchError> {
        if self.bar_count > MAX_BAR_COUNT {
            return Err(FetchError::BarCountTooLarge {
                requested: self.bar_count,
                max: MAX_BAR_COUNT,
            });
        }
        Ok(())
    }
}

/// Structured error types for a single symbol fetch.
///
/// All of these are non-fatal to a batch: the runner records them against
/// the symbol and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider rejected the session: {0}")]
    Unauthorized(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    #[error("bar_count {requested} exceeds the maximum of {max}")]
    BarCountTooLarge { requested: usize, max: usize },

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvDirectory,
    Synthetic,
}

/// Trait for market-data providers.
///
/// `fetch` returns an empty series (not an error) when the provider has no
/// data for the symbol.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch the most recent bars described by `request`.
    fn fetch(&self, session: &Session, request: &HistoryRequest) -> Result<Series, FetchError>;
}
