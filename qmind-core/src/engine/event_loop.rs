use tracing::{debug, info, warn};

use super::state::{ExitReason, LoopState, RunSummary};
use super::EngineError;
use crate::data::DataSource;
use crate::domain::{Event, OrderEvent};
use crate::execution::ExecutionSimulator;
use crate::portfolio::{Portfolio, PortfolioConfig};
use crate::queue::EventQueue;
use crate::strategy::Strategy;

/// Deterministic simulation loop.
///
/// Every event caused by a bar is resolved before the next bar is read, so
/// the queue is empty whenever the loop is back in `Streaming`.
pub struct Engine {
    queue: EventQueue,
    data: Box<dyn DataSource>,
    strategy: Box<dyn Strategy>,
    portfolio: Portfolio,
    execution: ExecutionSimulator,
    state: LoopState,
    order_log: Vec<OrderEvent>,
    bars_processed: usize,
    orders_dropped: usize,
    fills_applied: usize,
}

impl Engine {
    /// Wire pre-built components sharing `queue`.
    ///
    /// If the data source knows its first timestamp, an opening snapshot is
    /// recorded there before any bar is read.
    pub fn new(
        queue: EventQueue,
        data: Box<dyn DataSource>,
        strategy: Box<dyn Strategy>,
        mut portfolio: Portfolio,
        execution: ExecutionSimulator,
    ) -> Self {
        if let Some(start) = data.start_timestamp() {
            portfolio.record_snapshot(start);
        }
        Self {
            queue,
            data,
            strategy,
            portfolio,
            execution,
            state: LoopState::Streaming,
            order_log: Vec::new(),
            bars_processed: 0,
            orders_dropped: 0,
            fills_applied: 0,
        }
    }

    /// Build the portfolio and execution simulator against the data source's
    /// price book, then wire the engine.
    pub fn backtest(
        queue: EventQueue,
        data: Box<dyn DataSource>,
        strategy: Box<dyn Strategy>,
        portfolio_config: PortfolioConfig,
        commission: f64,
    ) -> Result<Self, EngineError> {
        let prices = data.price_source();
        let portfolio = Portfolio::new(portfolio_config, queue.clone(), prices.clone())?;
        let execution = ExecutionSimulator::with_commission(prices, commission)?;
        Ok(Self::new(queue, data, strategy, portfolio, execution))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Every order the loop processed, in processing order.
    pub fn order_log(&self) -> &[OrderEvent] {
        &self.order_log
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    /// Advance one outer iteration: read one bar and drain its consequences.
    ///
    /// Returns the state after the iteration. Once halted or exhausted,
    /// further calls are no-ops returning the same state.
    ///
    /// A dispatch error discards the events still queued for the current bar
    /// and moves the loop to `Failed`; every later call returns
    /// [`EngineError::Aborted`].
    pub fn step(&mut self) -> Result<LoopState, EngineError> {
        if self.state == LoopState::Failed {
            return Err(EngineError::Aborted);
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        if self.portfolio.is_halted() {
            self.state = LoopState::HaltedExit;
            return Ok(self.state);
        }

        let Some(bar) = self.data.next_bar() else {
            self.state = LoopState::Exhausted;
            return Ok(self.state);
        };
        self.bars_processed += 1;
        self.queue.put(bar.to_market_event());

        self.state = LoopState::Draining;
        while let Some(event) = self.queue.try_get() {
            if let Err(err) = self.dispatch(event) {
                let discarded = self.discard_pending();
                warn!(error = %err, discarded, "dispatch failed, simulation aborted");
                self.state = LoopState::Failed;
                return Err(err);
            }
        }
        self.state = LoopState::Streaming;
        Ok(self.state)
    }

    /// Run until the data is exhausted or trading halts.
    ///
    /// A strategy error aborts the run and is returned as-is.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        info!(strategy = self.strategy.name(), "simulation started");
        let exit_reason = loop {
            if let Some(reason) = self.step()?.exit_reason() {
                break reason;
            }
        };

        let summary = self.summary(exit_reason);
        info!(
            exit_reason = %summary.exit_reason,
            bars = summary.bars_processed,
            orders = summary.orders_submitted,
            fills = summary.fills_applied,
            dropped = summary.orders_dropped,
            cash = self.portfolio.cash(),
            "simulation finished"
        );
        Ok(summary)
    }

    fn summary(&self, exit_reason: ExitReason) -> RunSummary {
        RunSummary {
            exit_reason,
            bars_processed: self.bars_processed,
            orders_submitted: self.order_log.len(),
            fills_applied: self.fills_applied,
            orders_dropped: self.orders_dropped,
        }
    }

    fn discard_pending(&self) -> usize {
        std::iter::from_fn(|| self.queue.try_get()).count()
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        debug!(kind = ?event.kind(), ticker = event.ticker(), "dispatch");
        match event {
            Event::Market(market) => {
                // Strategy first: it reacts before the portfolio revalues.
                self.strategy.on_market_event(&market)?;
                self.portfolio.on_market_event(&market);
            }
            Event::Signal(signal) => self.portfolio.on_signal(&signal),
            Event::Order(order) => {
                let fill = self.execution.on_order(&order);
                self.order_log.push(order);
                match fill {
                    Some(fill) => self.queue.put(fill),
                    None => self.orders_dropped += 1,
                }
            }
            Event::Fill(fill) => {
                self.portfolio.on_fill(&fill);
                self.fills_applied += 1;
                self.strategy.on_fill_event(&fill)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoricalDataHandler;
    use crate::domain::{Bar, MarketEvent, SignalEvent, SignalKind};
    use crate::strategy::StrategyError;
    use chrono::{TimeZone, Utc};

    struct Silent;

    impl Strategy for Silent {
        fn name(&self) -> &str {
            "silent"
        }
        fn on_market_event(&mut self, _event: &MarketEvent) -> Result<(), StrategyError> {
            Ok(())
        }
    }

    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn on_market_event(&mut self, _event: &MarketEvent) -> Result<(), StrategyError> {
            Err(StrategyError::Failed {
                strategy: "failing".into(),
                reason: "boom".into(),
            })
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    Utc.with_ymd_and_hms(2025, 3, i as u32 + 1, 0, 0, 0).unwrap(),
                    "TEST",
                    c,
                    c,
                    c,
                    c,
                    100,
                )
            })
            .collect()
    }

    fn engine(strategy: Box<dyn Strategy>, closes: &[f64]) -> Engine {
        let queue = EventQueue::new();
        let data = HistoricalDataHandler::new(&["TEST".to_string()], bars(closes)).unwrap();
        Engine::backtest(
            queue,
            Box::new(data),
            strategy,
            PortfolioConfig::default(),
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn exhausts_after_last_bar() {
        let mut engine = engine(Box::new(Silent), &[10.0, 11.0, 12.0]);
        let summary = engine.run().unwrap();
        assert_eq!(summary.exit_reason, ExitReason::Exhausted);
        assert_eq!(summary.bars_processed, 3);
        assert_eq!(summary.orders_submitted, 0);
        // Opening snapshot plus one per bar.
        assert_eq!(engine.portfolio().snapshots().len(), 4);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn step_leaves_queue_empty() {
        let mut engine = engine(Box::new(Silent), &[10.0, 11.0]);
        assert_eq!(engine.step().unwrap(), LoopState::Streaming);
        assert!(engine.queue().is_empty());
        assert_eq!(engine.step().unwrap(), LoopState::Streaming);
        assert_eq!(engine.step().unwrap(), LoopState::Exhausted);
        assert_eq!(engine.step().unwrap(), LoopState::Exhausted);
        assert_eq!(engine.bars_processed(), 2);
    }

    #[test]
    fn strategy_error_aborts_run() {
        let mut engine = engine(Box::new(Failing), &[10.0, 11.0]);
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Strategy(_)));
        assert_eq!(engine.bars_processed(), 1);
        assert_eq!(engine.state(), LoopState::Failed);
    }

    /// Signals LONG on its first bar, then fails before the bar is drained.
    struct SignalThenFail {
        queue: EventQueue,
    }

    impl Strategy for SignalThenFail {
        fn name(&self) -> &str {
            "signal_then_fail"
        }
        fn on_market_event(&mut self, event: &MarketEvent) -> Result<(), StrategyError> {
            self.queue
                .put(SignalEvent::new(event.timestamp, &event.ticker, SignalKind::Long));
            Err(StrategyError::Failed {
                strategy: "signal_then_fail".into(),
                reason: "boom".into(),
            })
        }
    }

    #[test]
    fn failed_step_is_terminal_and_discards_pending_events() {
        let queue = EventQueue::new();
        let data =
            HistoricalDataHandler::new(&["TEST".to_string()], bars(&[100.0, 200.0])).unwrap();
        let strategy = Box::new(SignalThenFail {
            queue: queue.clone(),
        });
        let mut engine = Engine::backtest(
            queue,
            Box::new(data),
            strategy,
            PortfolioConfig::default(),
            1.0,
        )
        .unwrap();

        assert!(matches!(engine.step(), Err(EngineError::Strategy(_))));
        assert_eq!(engine.state(), LoopState::Failed);
        assert!(engine.queue().is_empty());

        assert!(matches!(engine.step(), Err(EngineError::Aborted)));
        assert!(matches!(engine.run(), Err(EngineError::Aborted)));
        assert_eq!(engine.bars_processed(), 1);
        assert!(engine.order_log().is_empty());
        assert_eq!(engine.portfolio().holding("TEST"), 0);
        assert_eq!(engine.portfolio().cash(), 100_000.0);
    }

    #[test]
    fn empty_data_exhausts_immediately() {
        let mut engine = engine(Box::new(Silent), &[]);
        let summary = engine.run().unwrap();
        assert_eq!(summary.exit_reason, ExitReason::Exhausted);
        assert_eq!(summary.bars_processed, 0);
        assert!(engine.portfolio().snapshots().is_empty());
    }

    #[test]
    fn invalid_portfolio_config_rejected() {
        let data = HistoricalDataHandler::new(&["TEST".to_string()], bars(&[1.0])).unwrap();
        let config = PortfolioConfig {
            initial_capital: 0.0,
            ..PortfolioConfig::default()
        };
        let result = Engine::backtest(
            EventQueue::new(),
            Box::new(data),
            Box::new(Silent),
            config,
            1.0,
        );
        assert!(matches!(result, Err(EngineError::Portfolio(_))));
    }
}
