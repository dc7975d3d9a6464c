//! Single-run orchestration: configuration in, [`BacktestResult`] out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use qmind_core::data::{DataError, HistoricalDataHandler};
use qmind_core::domain::{Bar, OrderEvent};
use qmind_core::engine::{Engine, EngineError, ExitReason, RunSummary};
use qmind_core::portfolio::EquityPoint;
use qmind_core::queue::EventQueue;
use qmind_core::strategy::StrategyError;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, LoadError};
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub tickers: Vec<String>,
    pub exit_reason: ExitReason,
    pub halted_at: Option<DateTime<Utc>>,
    pub summary: RunSummary,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub final_total_value: f64,
    pub final_holdings: BTreeMap<String, i64>,
    pub equity_curve: Vec<EquityPoint>,
    pub orders: Vec<OrderEvent>,
    pub metrics: PerformanceMetrics,
}

impl BacktestResult {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.equity_curve.first().map(|p| p.timestamp)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.equity_curve.last().map(|p| p.timestamp)
    }
}

/// Validate, load bars from disk and run.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = load_bars(&config.data, &config.backtest.tickers)?;
    run_backtest_from_bars(config, bars)
}

/// Run against pre-loaded bars. No I/O.
pub fn run_backtest_from_bars(
    config: &BacktestConfig,
    bars: Vec<Bar>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let tickers = config.backtest.tickers.clone();

    let queue = EventQueue::new();
    let data = HistoricalDataHandler::new(&tickers, bars)?;
    let strategy = config.build_strategy(queue.clone())?;
    let bar_count = data.len();

    let mut engine = Engine::backtest(
        queue,
        Box::new(data),
        strategy,
        config.portfolio_config(),
        config.backtest.commission,
    )?;
    let strategy_name = engine.strategy_name().to_string();
    info!(%run_id, strategy = %strategy_name, bars = bar_count, "backtest starting");
    let summary = engine.run()?;

    let portfolio = engine.portfolio();
    let equity_curve = portfolio.equity_curve();
    let totals: Vec<f64> = equity_curve.iter().map(|p| p.total_value).collect();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: strategy_name,
        tickers,
        exit_reason: summary.exit_reason,
        halted_at: portfolio.halted_at(),
        summary,
        initial_capital: portfolio.initial_capital(),
        final_cash: portfolio.cash(),
        final_total_value: portfolio.total_value(),
        final_holdings: portfolio.holdings().clone(),
        metrics: PerformanceMetrics::compute(&totals),
        equity_curve,
        orders: engine.order_log().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BacktestSection, DataSection, StrategySection};
    use chrono::TimeZone;

    fn config(strategy: StrategySection) -> BacktestConfig {
        BacktestConfig {
            backtest: BacktestSection {
                tickers: vec!["SPY".into()],
                initial_capital: 100_000.0,
                max_drawdown_pct: 0.15,
                allocation_per_trade: 10_000.0,
                commission: 1.0,
            },
            data: DataSection {
                path: "unused.csv".into(),
                start: None,
                end: None,
            },
            strategy,
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    Utc.with_ymd_and_hms(2024, 2, i as u32 + 1, 0, 0, 0).unwrap(),
                    "SPY",
                    c,
                    c,
                    c,
                    c,
                    1,
                )
            })
            .collect()
    }

    #[test]
    fn buy_and_hold_result_is_populated() {
        let result =
            run_backtest_from_bars(&config(StrategySection::BuyAndHold), bars(&[100.0, 110.0]))
                .unwrap();
        assert_eq!(result.exit_reason, ExitReason::Exhausted);
        assert_eq!(result.strategy, "buy_and_hold");
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.final_holdings.get("SPY"), Some(&100));
        assert_eq!(result.final_cash, 100_000.0 - 10_000.0 - 1.0);
        assert_eq!(result.final_total_value, 89_999.0 + 11_000.0);
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(result.metrics.bar_count, 3);
        assert!(result.metrics.total_return > 0.0);
        assert_eq!(result.run_id.len(), 64);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut cfg = config(StrategySection::BuyAndHold);
        cfg.backtest.tickers.clear();
        let err = run_backtest_from_bars(&cfg, bars(&[1.0])).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn result_serializes_to_json() {
        let result = run_backtest_from_bars(
            &config(StrategySection::MaCrossover {
                short_window: 2,
                long_window: 4,
            }),
            bars(&[100.0, 101.0, 102.0, 110.0]),
        )
        .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.orders, result.orders);
        assert_eq!(back.exit_reason, ExitReason::Exhausted);
    }
}
