//! Execution venue boundary for live sessions.
//!
//! A venue accepts a market order and returns an opaque acknowledgment. Fill
//! confirmation from the venue is not modelled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{OrderEvent, OrderSide};

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("venue unreachable: {0}")]
    Unreachable(String),
}

/// Acknowledgment returned by a venue for a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub ticker: String,
    pub side: OrderSide,
    pub quantity: u64,
}

pub trait ExecutionVenue: Send {
    fn name(&self) -> &str;

    fn submit_market_order(&mut self, order: &OrderEvent) -> Result<OrderAck, VenueError>;
}

/// In-memory venue that acknowledges every order and keeps the acks.
#[derive(Debug, Default)]
pub struct PaperVenue {
    next_id: u64,
    acks: Vec<OrderAck>,
}

impl PaperVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acks(&self) -> &[OrderAck] {
        &self.acks
    }
}

impl ExecutionVenue for PaperVenue {
    fn name(&self) -> &str {
        "paper"
    }

    fn submit_market_order(&mut self, order: &OrderEvent) -> Result<OrderAck, VenueError> {
        if order.quantity == 0 {
            return Err(VenueError::Rejected("zero quantity".into()));
        }
        self.next_id += 1;
        let ack = OrderAck {
            order_id: format!("paper-{}", self.next_id),
            ticker: order.ticker.clone(),
            side: order.side,
            quantity: order.quantity,
        };
        self.acks.push(ack.clone());
        Ok(ack)
    }
}
