//! QMind Runner: backtest orchestration on top of `qmind-core`.
//!
//! - TOML run configuration with validation and a content-hash run id
//! - Bar loading from Parquet or CSV with ticker and date filtering
//! - Single-run wiring of the simulation loop
//! - Equity-curve performance metrics
//! - CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataSection, RunId, StrategySection};
pub use data_loader::{load_bars, DataFormat, LoadError};
pub use export::{load_result, write_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_backtest_from_bars, BacktestResult, RunError, SCHEMA_VERSION};
