//! Moving average crossover: rolling short/long SMA comparison per ticker.
//!
//! Emits LONG when the short mean is above the long mean and SHORT when it is
//! below, each only on a change of stance. SHORT doubles as "exit long".

use std::collections::{HashMap, VecDeque};

use super::{require_tickers, Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};
use crate::queue::EventQueue;

pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LONG_WINDOW: usize = 30;

/// Last stance signalled for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stance {
    None,
    Long,
    Short,
}

/// Simple moving average crossover over closes.
///
/// Keeps the last `long_window` closes per ticker. Once the buffer is full,
/// compares the mean of the newest `short_window` closes with the mean of the
/// whole buffer.
#[derive(Debug)]
pub struct MovingAverageCrossover {
    queue: EventQueue,
    tickers: Vec<String>,
    short_window: usize,
    long_window: usize,
    closes: HashMap<String, VecDeque<f64>>,
    stance: HashMap<String, Stance>,
}

impl MovingAverageCrossover {
    pub fn new(
        queue: EventQueue,
        tickers: &[String],
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, StrategyError> {
        require_tickers(tickers)?;
        if short_window < 1 {
            return Err(StrategyError::InvalidParameters(
                "short_window must be >= 1".into(),
            ));
        }
        if long_window <= short_window {
            return Err(StrategyError::InvalidParameters(format!(
                "long_window ({long_window}) must be > short_window ({short_window})"
            )));
        }

        Ok(Self {
            queue,
            tickers: tickers.to_vec(),
            short_window,
            long_window,
            closes: tickers
                .iter()
                .map(|t| (t.clone(), VecDeque::with_capacity(long_window)))
                .collect(),
            stance: tickers.iter().map(|t| (t.clone(), Stance::None)).collect(),
        })
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    values.sum::<f64>() / n as f64
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Result<(), StrategyError> {
        let Some(window) = self.closes.get_mut(&event.ticker) else {
            return Ok(());
        };

        if window.len() == self.long_window {
            window.pop_front();
        }
        window.push_back(event.close);

        if window.len() < self.long_window {
            return Ok(());
        }

        let short_sma = mean(
            window.iter().skip(self.long_window - self.short_window).copied(),
            self.short_window,
        );
        let long_sma = mean(window.iter().copied(), self.long_window);

        let stance = self
            .stance
            .get_mut(&event.ticker)
            .ok_or_else(|| StrategyError::Failed {
                strategy: "ma_crossover".into(),
                reason: format!("no stance tracked for {}", event.ticker),
            })?;

        let signal = if short_sma > long_sma && *stance != Stance::Long {
            *stance = Stance::Long;
            Some(SignalKind::Long)
        } else if short_sma < long_sma && *stance != Stance::Short {
            *stance = Stance::Short;
            Some(SignalKind::Short)
        } else {
            None
        };

        if let Some(kind) = signal {
            self.queue
                .put(SignalEvent::new(event.timestamp, event.ticker.clone(), kind));
        }
        Ok(())
    }
}
