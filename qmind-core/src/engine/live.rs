//! Live dispatch: a consumer loop blocking on the queue while a producer
//! thread feeds Market events.
//!
//! Market events go to the strategy only. The portfolio does not revalue in
//! this mode and orders are routed to an [`ExecutionVenue`] instead of the
//! simulator. The loop exits once the producer closes the queue and every
//! pending event has been handled.

use serde::Serialize;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use super::EngineError;
use crate::domain::{Bar, Event};
use crate::execution::ExecutionVenue;
use crate::portfolio::Portfolio;
use crate::queue::EventQueue;
use crate::strategy::Strategy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveSummary {
    pub events_processed: usize,
    pub orders_acknowledged: usize,
    pub orders_failed: usize,
    pub fills_applied: usize,
}

pub struct LiveEngine<V: ExecutionVenue> {
    queue: EventQueue,
    strategy: Box<dyn Strategy>,
    portfolio: Portfolio,
    venue: V,
    summary: LiveSummary,
}

impl<V: ExecutionVenue> LiveEngine<V> {
    pub fn new(
        queue: EventQueue,
        strategy: Box<dyn Strategy>,
        portfolio: Portfolio,
        venue: V,
    ) -> Self {
        Self {
            queue,
            strategy,
            portfolio,
            venue,
            summary: LiveSummary::default(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    /// Block on the queue until it is closed and drained.
    ///
    /// Venue failures are logged and the loop carries on. A strategy error
    /// aborts the loop.
    pub fn run(&mut self) -> Result<LiveSummary, EngineError> {
        info!(strategy = self.strategy.name(), venue = self.venue.name(), "live loop started");
        while let Some(event) = self.queue.get() {
            self.dispatch(event)?;
            self.summary.events_processed += 1;
        }
        info!(
            events = self.summary.events_processed,
            acknowledged = self.summary.orders_acknowledged,
            failed = self.summary.orders_failed,
            "live loop finished"
        );
        Ok(self.summary)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::Market(market) => self.strategy.on_market_event(&market)?,
            Event::Signal(signal) => self.portfolio.on_signal(&signal),
            Event::Order(order) => match self.venue.submit_market_order(&order) {
                Ok(ack) => {
                    debug!(order_id = %ack.order_id, ticker = %ack.ticker, "order acknowledged");
                    self.summary.orders_acknowledged += 1;
                }
                Err(e) => {
                    error!(ticker = %order.ticker, side = %order.side,
                        quantity = order.quantity, error = %e, "order submission failed");
                    self.summary.orders_failed += 1;
                }
            },
            Event::Fill(fill) => {
                self.portfolio.on_fill(&fill);
                self.summary.fills_applied += 1;
                self.strategy.on_fill_event(&fill)?;
            }
        }
        Ok(())
    }
}

/// Stream `bars` into `queue` as Market events from a new thread, then close
/// the queue.
pub fn spawn_replay_feed(queue: EventQueue, bars: Vec<Bar>) -> JoinHandle<()> {
    thread::spawn(move || {
        let count = bars.len();
        for bar in bars {
            queue.put(bar.to_market_event());
        }
        queue.close();
        debug!(bars = count, "replay feed closed");
    })
}
