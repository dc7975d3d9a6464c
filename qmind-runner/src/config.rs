//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! tickers = ["AAPL", "MSFT"]
//! initial_capital = 100000.0
//! max_drawdown_pct = 0.15
//! allocation_per_trade = 10000.0
//! commission = 1.0
//!
//! [data]
//! path = "data/bars.parquet"
//! start = "2020-01-01"
//! end = "2023-12-31"
//!
//! [strategy]
//! type = "MA_CROSSOVER"
//! short_window = 10
//! long_window = 30
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use qmind_core::execution::DEFAULT_COMMISSION;
use qmind_core::portfolio::PortfolioConfig;
use qmind_core::queue::EventQueue;
use qmind_core::strategy::{
    BuyAndHold, MovingAverageCrossover, Strategy, StrategyError, DEFAULT_LONG_WINDOW,
    DEFAULT_SHORT_WINDOW,
};

/// Content hash identifying a configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    pub strategy: StrategySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub tickers: Vec<String>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_max_drawdown_pct")]
    pub max_drawdown_pct: f64,
    #[serde(default = "default_allocation_per_trade")]
    pub allocation_per_trade: f64,
    #[serde(default = "default_commission")]
    pub commission: f64,
}

/// Where bars come from. Dates are inclusive and optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub path: PathBuf,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategySection {
    MaCrossover {
        #[serde(default = "default_short_window")]
        short_window: usize,
        #[serde(default = "default_long_window")]
        long_window: usize,
    },
    BuyAndHold,
}

fn default_initial_capital() -> f64 {
    PortfolioConfig::default().initial_capital
}

fn default_max_drawdown_pct() -> f64 {
    PortfolioConfig::default().max_drawdown_pct
}

fn default_allocation_per_trade() -> f64 {
    PortfolioConfig::default().allocation_per_trade
}

fn default_commission() -> f64 {
    DEFAULT_COMMISSION
}

fn default_short_window() -> usize {
    DEFAULT_SHORT_WINDOW
}

fn default_long_window() -> usize {
    DEFAULT_LONG_WINDOW
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject configurations that cannot start a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.backtest;
        if b.tickers.is_empty() {
            return Err(ConfigError::Invalid("backtest.tickers is empty".into()));
        }
        if let Some(blank) = b.tickers.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "backtest.tickers[{blank}] is blank"
            )));
        }
        self.portfolio_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !b.commission.is_finite() || b.commission < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.commission must be finite and >= 0, got {}",
                b.commission
            )));
        }

        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "data.start {start} is after data.end {end}"
                )));
            }
        }

        if let StrategySection::MaCrossover {
            short_window,
            long_window,
        } = self.strategy
        {
            if short_window < 1 || short_window >= long_window {
                return Err(ConfigError::Invalid(format!(
                    "strategy windows need 1 <= short_window < long_window, got {short_window}/{long_window}"
                )));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn portfolio_config(&self) -> PortfolioConfig {
        PortfolioConfig {
            initial_capital: self.backtest.initial_capital,
            max_drawdown_pct: self.backtest.max_drawdown_pct,
            allocation_per_trade: self.backtest.allocation_per_trade,
            ..PortfolioConfig::default()
        }
    }

    /// Instantiate the configured strategy emitting into `queue`.
    pub fn build_strategy(&self, queue: EventQueue) -> Result<Box<dyn Strategy>, StrategyError> {
        let tickers = &self.backtest.tickers;
        Ok(match self.strategy {
            StrategySection::MaCrossover {
                short_window,
                long_window,
            } => Box::new(MovingAverageCrossover::new(
                queue,
                tickers,
                short_window,
                long_window,
            )?),
            StrategySection::BuyAndHold => Box::new(BuyAndHold::new(queue, tickers)?),
        })
    }
}
