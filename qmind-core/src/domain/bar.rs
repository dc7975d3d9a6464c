//! Bar: one OHLCV observation for one ticker at one timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::MarketEvent;

/// OHLCV bar as produced by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        ticker: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            ticker: ticker.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any price field is missing (NaN) or infinite.
    pub fn is_void(&self) -> bool {
        ![self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }

    /// Wrap this bar as a Market event.
    pub fn to_market_event(&self) -> MarketEvent {
        MarketEvent {
            timestamp: self.timestamp,
            ticker: self.ticker.clone(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

impl From<Bar> for MarketEvent {
    fn from(bar: Bar) -> Self {
        MarketEvent {
            timestamp: bar.timestamp,
            ticker: bar.ticker,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}
