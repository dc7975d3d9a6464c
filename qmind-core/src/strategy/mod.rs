//! Strategy interface: consumes Market and Fill events, emits Signals.
//!
//! A strategy receives a clone of the run's [`EventQueue`](crate::queue::EventQueue)
//! at construction and `put`s at most one Signal per ticker per bar. The
//! kernel never inspects strategy state. An `Err` from either hook aborts
//! the run.

pub mod buy_and_hold;
pub mod ma_crossover;

pub use buy_and_hold::BuyAndHold;
pub use ma_crossover::{MovingAverageCrossover, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW};

use thiserror::Error;

use crate::domain::{FillEvent, MarketEvent};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid strategy parameters: {0}")]
    InvalidParameters(String),

    #[error("strategy '{strategy}' failed: {reason}")]
    Failed { strategy: String, reason: String },
}

pub trait Strategy: Send {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// React to a completed bar.
    fn on_market_event(&mut self, event: &MarketEvent) -> Result<(), StrategyError>;

    /// React to a fill. Most strategies ignore fills.
    fn on_fill_event(&mut self, _event: &FillEvent) -> Result<(), StrategyError> {
        Ok(())
    }
}

pub(crate) fn require_tickers(tickers: &[String]) -> Result<(), StrategyError> {
    if tickers.is_empty() {
        return Err(StrategyError::InvalidParameters(
            "ticker list is empty".into(),
        ));
    }
    Ok(())
}
