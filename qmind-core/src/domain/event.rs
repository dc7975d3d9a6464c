//! Event model: the closed set of records that flow through the kernel.
//!
//! Every variant carries a timestamp and a ticker. Events are never mutated in
//! flight: handlers consume them by reference and may emit new ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence attached to a signal when the strategy does not supply one.
pub const DEFAULT_SIGNAL_STRENGTH: f64 = 1.0;

/// Discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

/// Directional intent of a signal.
///
/// `Short` doubles as "exit long": the portfolio decides which one it means
/// from the current holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Long,
    Short,
}

/// Order type. Only `Market` is produced by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One completed trading bar for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Strategy intent for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub kind: SignalKind,
    /// Confidence in the signal. Carried but not consulted by the kernel.
    pub strength: f64,
}

impl SignalEvent {
    pub fn new(timestamp: DateTime<Utc>, ticker: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            timestamp,
            ticker: ticker.into(),
            kind,
            strength: DEFAULT_SIGNAL_STRENGTH,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

/// Request to trade a whole number of shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub kind: OrderKind,
    pub side: OrderSide,
    pub quantity: u64,
}

impl OrderEvent {
    pub fn market(
        timestamp: DateTime<Utc>,
        ticker: impl Into<String>,
        side: OrderSide,
        quantity: u64,
    ) -> Self {
        Self {
            timestamp,
            ticker: ticker.into(),
            kind: OrderKind::Market,
            side,
            quantity,
        }
    }
}

/// Simulated or broker-confirmed execution of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub fill_price: f64,
    pub commission: f64,
}

impl FillEvent {
    /// Gross traded value, excluding commission.
    pub fn notional(&self) -> f64 {
        self.fill_price * self.quantity as f64
    }
}

/// Tagged union of everything the queue can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market(_) => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Market(e) => e.timestamp,
            Event::Signal(e) => e.timestamp,
            Event::Order(e) => e.timestamp,
            Event::Fill(e) => e.timestamp,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Event::Market(e) => &e.ticker,
            Event::Signal(e) => &e.ticker,
            Event::Order(e) => &e.ticker,
            Event::Fill(e) => &e.ticker,
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(e: MarketEvent) -> Self {
        Event::Market(e)
    }
}

impl From<SignalEvent> for Event {
    fn from(e: SignalEvent) -> Self {
        Event::Signal(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<FillEvent> for Event {
    fn from(e: FillEvent) -> Self {
        Event::Fill(e)
    }
}
