//! Portfolio: cash, holdings, the equity curve, and the drawdown guard.
//!
//! The portfolio consumes Market, Signal and Fill events and emits Orders into
//! the queue it was constructed with. It is mutated only by the loop's
//! dispatch step and read by reporting once the run ends.
//!
//! Cash may go negative (no solvency check before a BUY) and a SELL fill larger
//! than the holding leaves a negative quantity; neither is rejected here.

pub mod equity;
pub mod risk;

pub use equity::{equity_curve, EquityPoint, EquitySnapshot};
pub use risk::{drawdown, RiskCheck, RiskGuard, RiskState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::PriceSource;
use crate::domain::{FillEvent, MarketEvent, OrderEvent, OrderSide, SignalEvent, SignalKind};
use crate::queue::EventQueue;

#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("initial capital must be positive and finite, got {0}")]
    NonPositiveCapital(f64),

    #[error("max drawdown must be in (0, 1), got {0}")]
    InvalidDrawdown(f64),

    #[error("allocation per trade must be positive and finite, got {0}")]
    NonPositiveAllocation(f64),
}

/// Portfolio parameters fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub initial_capital: f64,
    /// Drawdown fraction that halts trading when strictly exceeded.
    pub max_drawdown_pct: f64,
    /// Dollar amount targeted by each LONG signal.
    pub allocation_per_trade: f64,
    /// Shares bought per LONG when no price source is attached.
    pub unpriced_order_quantity: u64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            max_drawdown_pct: 0.15,
            allocation_per_trade: 10_000.0,
            unpriced_order_quantity: 10,
        }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> Result<(), PortfolioError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(PortfolioError::NonPositiveCapital(self.initial_capital));
        }
        if !(self.max_drawdown_pct > 0.0 && self.max_drawdown_pct < 1.0) {
            return Err(PortfolioError::InvalidDrawdown(self.max_drawdown_pct));
        }
        if !self.allocation_per_trade.is_finite() || self.allocation_per_trade <= 0.0 {
            return Err(PortfolioError::NonPositiveAllocation(
                self.allocation_per_trade,
            ));
        }
        Ok(())
    }
}

pub struct Portfolio {
    config: PortfolioConfig,
    queue: EventQueue,
    prices: Option<Arc<dyn PriceSource>>,
    cash: f64,
    /// Signed share quantity per ticker. Ordered so liquidation is deterministic.
    holdings: BTreeMap<String, i64>,
    risk: RiskGuard,
    snapshots: Vec<EquitySnapshot>,
    halted_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portfolio")
            .field("cash", &self.cash)
            .field("holdings", &self.holdings)
            .field("risk", &self.risk)
            .field("snapshots", &self.snapshots.len())
            .field("has_prices", &self.prices.is_some())
            .finish()
    }
}

impl Portfolio {
    /// Create a portfolio emitting orders into `queue`.
    ///
    /// `prices` is the optional valuation source. Without one, market events
    /// record no snapshot and LONG signals size to `unpriced_order_quantity`.
    pub fn new(
        config: PortfolioConfig,
        queue: EventQueue,
        prices: Option<Arc<dyn PriceSource>>,
    ) -> Result<Self, PortfolioError> {
        config.validate()?;
        Ok(Self {
            cash: config.initial_capital,
            risk: RiskGuard::new(config.initial_capital, config.max_drawdown_pct),
            config,
            queue,
            prices,
            holdings: BTreeMap::new(),
            snapshots: Vec::new(),
            halted_at: None,
        })
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.config.initial_capital
    }

    /// Held quantity for `ticker` (0 if never traded).
    pub fn holding(&self, ticker: &str) -> i64 {
        self.holdings.get(ticker).copied().unwrap_or(0)
    }

    pub fn holdings(&self) -> &BTreeMap<String, i64> {
        &self.holdings
    }

    pub fn risk_state(&self) -> RiskState {
        self.risk.state()
    }

    pub fn is_halted(&self) -> bool {
        self.risk.is_halted()
    }

    /// Timestamp of the snapshot that tripped the drawdown guard.
    pub fn halted_at(&self) -> Option<DateTime<Utc>> {
        self.halted_at
    }

    pub fn high_water_mark(&self) -> f64 {
        self.risk.high_water_mark()
    }

    pub fn snapshots(&self) -> &[EquitySnapshot] {
        &self.snapshots
    }

    /// Equity curve with per-snapshot returns.
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        equity_curve(&self.snapshots)
    }

    /// Σ quantity × latest close over non-zero holdings with a known price.
    pub fn market_value(&self) -> f64 {
        let Some(prices) = self.prices.as_ref() else {
            return 0.0;
        };
        self.holdings
            .iter()
            .filter(|&(_, &qty)| qty != 0)
            .filter_map(|(ticker, &qty)| prices.latest_close(ticker).map(|p| p * qty as f64))
            .sum()
    }

    pub fn total_value(&self) -> f64 {
        self.cash + self.market_value()
    }

    /// Revalue at the bar's timestamp and evaluate the drawdown guard.
    pub fn on_market_event(&mut self, event: &MarketEvent) {
        self.record_snapshot(event.timestamp);
    }

    /// Append a valuation snapshot at `timestamp` and evaluate the guard.
    ///
    /// On the RUNNING -> HALTED transition, one SELL order per positive holding
    /// is put on the queue before this returns.
    pub fn record_snapshot(&mut self, timestamp: DateTime<Utc>) {
        if self.prices.is_none() {
            debug!("no price source attached; snapshot skipped");
            return;
        }

        let market_value = self.market_value();
        let total_value = self.cash + market_value;
        self.snapshots.push(EquitySnapshot {
            timestamp,
            cash: self.cash,
            market_value,
            total_value,
        });

        if let RiskCheck::Tripped { drawdown } = self.risk.observe(total_value) {
            warn!(
                drawdown,
                max_drawdown = self.risk.max_drawdown_pct(),
                high_water_mark = self.risk.high_water_mark(),
                total_value,
                %timestamp,
                "max drawdown exceeded; trading halted"
            );
            self.halted_at = Some(timestamp);
            self.liquidate_all(timestamp);
        }
    }

    fn liquidate_all(&mut self, timestamp: DateTime<Utc>) {
        let mut emitted = 0usize;
        for (ticker, &qty) in &self.holdings {
            if qty > 0 {
                warn!(%ticker, quantity = qty, "liquidating position");
                self.queue.put(OrderEvent::market(
                    timestamp,
                    ticker.clone(),
                    OrderSide::Sell,
                    qty as u64,
                ));
                emitted += 1;
            }
        }
        info!(orders = emitted, "liquidation orders emitted");
    }

    /// Translate a signal into at most one order. No-op once halted.
    pub fn on_signal(&mut self, event: &SignalEvent) {
        if self.is_halted() {
            debug!(ticker = %event.ticker, kind = ?event.kind, "trading halted; signal ignored");
            return;
        }

        match event.kind {
            SignalKind::Long => {
                let Some(quantity) = self.long_quantity(&event.ticker) else {
                    return;
                };
                if quantity == 0 {
                    debug!(ticker = %event.ticker, "allocation buys zero shares; signal ignored");
                    return;
                }
                self.queue.put(OrderEvent::market(
                    event.timestamp,
                    event.ticker.clone(),
                    OrderSide::Buy,
                    quantity,
                ));
            }
            SignalKind::Short => {
                // Exit long only; a flat or negative holding is left alone.
                let held = self.holding(&event.ticker);
                if held > 0 {
                    self.queue.put(OrderEvent::market(
                        event.timestamp,
                        event.ticker.clone(),
                        OrderSide::Sell,
                        held as u64,
                    ));
                } else {
                    debug!(ticker = %event.ticker, held, "no long holding; SHORT ignored");
                }
            }
        }
    }

    /// Whole shares a LONG signal buys, or `None` if no price is known yet.
    fn long_quantity(&self, ticker: &str) -> Option<u64> {
        let Some(prices) = self.prices.as_ref() else {
            return Some(self.config.unpriced_order_quantity);
        };
        match prices.latest_close(ticker) {
            Some(price) if price > 0.0 => {
                Some((self.config.allocation_per_trade / price).floor() as u64)
            }
            _ => {
                debug!(%ticker, "no usable price for sizing; LONG ignored");
                None
            }
        }
    }

    /// Apply a fill to cash and holdings. Risk state is not consulted.
    pub fn on_fill(&mut self, event: &FillEvent) {
        let cost = event.notional();
        let qty = event.quantity as i64;
        let held = self.holdings.entry(event.ticker.clone()).or_insert(0);
        match event.side {
            OrderSide::Buy => {
                self.cash -= cost + event.commission;
                *held += qty;
            }
            OrderSide::Sell => {
                self.cash += cost - event.commission;
                *held -= qty;
            }
        }
        debug!(ticker = %event.ticker, side = %event.side, quantity = event.quantity,
            price = event.fill_price, cash = self.cash, "fill applied");
    }
}
