//! Data source and price lookup traits, plus the shared last-close book.
//!
//! The simulation loop owns the `DataSource`. The portfolio and the execution
//! simulator only need the latest close per ticker, so they receive an
//! optional `PriceSource` handle instead of the whole source.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("ticker list is empty")]
    EmptyTickers,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv error: {0}")]
    CsvError(String),

    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("unsupported data file '{0}' (expected .parquet or .csv)")]
    UnsupportedFormat(String),
}

/// Latest known close per ticker.
pub trait PriceSource: Send + Sync {
    fn latest_close(&self, ticker: &str) -> Option<f64>;
}

/// Finite, chronologically ordered stream of bars.
pub trait DataSource {
    /// Next bar, or `None` at end of stream.
    fn next_bar(&mut self) -> Option<Bar>;

    /// Close of the most recently streamed bar for `ticker`.
    fn latest_close(&self, ticker: &str) -> Option<f64>;

    /// Timestamp of the first bar, when known up front.
    fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Shared price book kept current as bars are streamed.
    fn price_source(&self) -> Option<Arc<dyn PriceSource>> {
        None
    }
}

/// Cloneable last-close book. Every clone observes the same prices.
#[derive(Debug, Clone, Default)]
pub struct LatestPrices {
    closes: Arc<RwLock<HashMap<String, f64>>>,
}

impl LatestPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bar's close as the latest price for its ticker.
    pub fn record(&self, ticker: &str, close: f64) {
        self.closes.write().insert(ticker.to_string(), close);
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.closes.read().get(ticker).copied()
    }

    pub fn len(&self) -> usize {
        self.closes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.read().is_empty()
    }
}

impl PriceSource for LatestPrices {
    fn latest_close(&self, ticker: &str) -> Option<f64> {
        self.get(ticker)
    }
}
