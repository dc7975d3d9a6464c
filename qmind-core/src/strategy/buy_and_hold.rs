//! Buy-and-hold: one LONG per ticker on its first bar, then silence.

use std::collections::BTreeSet;

use super::{require_tickers, Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};
use crate::queue::EventQueue;

#[derive(Debug)]
pub struct BuyAndHold {
    queue: EventQueue,
    pending: BTreeSet<String>,
}

impl BuyAndHold {
    pub fn new(queue: EventQueue, tickers: &[String]) -> Result<Self, StrategyError> {
        require_tickers(tickers)?;
        Ok(Self {
            queue,
            pending: tickers.iter().cloned().collect(),
        })
    }

    /// True once every ticker has received its entry signal.
    pub fn is_fully_invested(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Result<(), StrategyError> {
        if self.pending.remove(&event.ticker) {
            self.queue.put(SignalEvent::new(
                event.timestamp,
                event.ticker.clone(),
                SignalKind::Long,
            ));
        }
        Ok(())
    }
}
