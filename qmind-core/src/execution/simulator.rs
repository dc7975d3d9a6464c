//! Simulated execution: every order fills in full at the latest known close.
//!
//! No slippage, no partial fills, a flat commission per fill. An order for a
//! ticker with no known price is dropped and reported, never an error.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::PriceSource;
use crate::domain::{FillEvent, OrderEvent};

/// Flat fee charged on every simulated fill.
pub const DEFAULT_COMMISSION: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("commission must be finite and >= 0, got {0}")]
    InvalidCommission(f64),
}

/// Converts orders into fills against the last observed close.
pub struct ExecutionSimulator {
    prices: Option<Arc<dyn PriceSource>>,
    commission: f64,
}

impl fmt::Debug for ExecutionSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionSimulator")
            .field("has_prices", &self.prices.is_some())
            .field("commission", &self.commission)
            .finish()
    }
}

impl ExecutionSimulator {
    pub fn new(prices: Option<Arc<dyn PriceSource>>) -> Self {
        Self {
            prices,
            commission: DEFAULT_COMMISSION,
        }
    }

    pub fn with_commission(
        prices: Option<Arc<dyn PriceSource>>,
        commission: f64,
    ) -> Result<Self, ExecutionError> {
        if !commission.is_finite() || commission < 0.0 {
            return Err(ExecutionError::InvalidCommission(commission));
        }
        Ok(Self {
            prices,
            commission,
        })
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    /// Fill `order` at the latest close for its ticker.
    ///
    /// Returns `None` (order dropped) when no price is known. The order kind
    /// is not consulted: limit orders fill like market orders.
    pub fn on_order(&self, order: &OrderEvent) -> Option<FillEvent> {
        let Some(prices) = self.prices.as_ref() else {
            warn!(ticker = %order.ticker, side = %order.side, quantity = order.quantity,
                "no price source attached; order dropped");
            return None;
        };
        let Some(fill_price) = prices.latest_close(&order.ticker) else {
            warn!(ticker = %order.ticker, side = %order.side, quantity = order.quantity,
                "no price for ticker yet; order dropped");
            return None;
        };

        debug!(ticker = %order.ticker, side = %order.side, quantity = order.quantity,
            fill_price, "order filled");
        Some(FillEvent {
            timestamp: order.timestamp,
            ticker: order.ticker.clone(),
            side: order.side,
            quantity: order.quantity,
            fill_price,
            commission: self.commission,
        })
    }
}
