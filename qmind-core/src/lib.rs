//! QMind Core: event-driven backtest kernel.
//!
//! - Closed event model (Market, Signal, Order, Fill) and a FIFO event queue
//! - Historical data sources with a shared last-close price book
//! - Execution simulator filling at the latest close
//! - Portfolio with a one-way drawdown halt and full liquidation
//! - Strategy interface plus reference strategies
//! - Deterministic simulation loop and a blocking live dispatch loop

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod portfolio;
pub mod queue;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the live producer/consumer boundary
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Event>();
        require_sync::<domain::Event>();
        require_send::<queue::EventQueue>();
        require_sync::<queue::EventQueue>();
        require_send::<data::LatestPrices>();
        require_sync::<data::LatestPrices>();
        require_send::<portfolio::Portfolio>();
        require_sync::<portfolio::Portfolio>();
        require_send::<execution::ExecutionSimulator>();
        require_sync::<execution::ExecutionSimulator>();
        require_send::<execution::PaperVenue>();
        require_send::<strategy::MovingAverageCrossover>();
        require_send::<strategy::BuyAndHold>();
        require_send::<engine::RunSummary>();
        require_sync::<engine::RunSummary>();
    }

    /// Compile-time check: strategy hooks take only the event; the trait has
    /// no portfolio access.
    #[allow(dead_code)]
    fn strategy_hooks_take_events_only(
        strategy: &mut dyn strategy::Strategy,
        market: &domain::MarketEvent,
        fill: &domain::FillEvent,
    ) -> Result<(), strategy::StrategyError> {
        strategy.on_market_event(market)?;
        strategy.on_fill_event(fill)
    }
}
