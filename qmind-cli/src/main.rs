//! QMind CLI: run and validate backtests.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config and save artifacts
//! - `validate`: check a config and print its run id

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qmind_core::engine::ExitReason;
use qmind_runner::{run_backtest, write_artifacts, BacktestConfig, BacktestResult, StrategySection};

#[derive(Parser)]
#[command(name = "qmind", about = "QMind: event-driven backtesting kernel")]
struct Cli {
    /// Log filter (e.g. info, debug, qmind_core=trace). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a TOML config file without running it.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            json,
        } => run_cmd(&config, &output_dir, json),
        Commands::Validate { config } => validate_cmd(&config),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    let config = BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("config {} is invalid", path.display()))?;
    Ok(config)
}

fn run_cmd(config_path: &Path, output_dir: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let result = run_backtest(&config).context("backtest failed")?;
    let run_dir = write_artifacts(&result, output_dir)?;
    info!(run_dir = %run_dir.display(), "artifacts written");

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let strategy = match &config.strategy {
        StrategySection::MaCrossover {
            short_window,
            long_window,
        } => format!("ma_crossover ({short_window}/{long_window})"),
        StrategySection::BuyAndHold => "buy_and_hold".to_string(),
    };
    println!("Config OK");
    println!("Run ID:         {}", config.run_id()?);
    println!("Tickers:        {}", config.backtest.tickers.join(", "));
    println!("Strategy:       {strategy}");
    println!("Data:           {}", config.data.path.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let fmt_ts = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string())
    };

    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Strategy:       {}", result.strategy);
    println!("Tickers:        {}", result.tickers.join(", "));
    println!("Period:         {} to {}", fmt_ts(result.start()), fmt_ts(result.end()));
    println!("Exit:           {}", result.exit_reason);
    println!("Bars:           {}", result.summary.bars_processed);
    println!(
        "Orders:         {} ({} dropped)",
        result.summary.orders_submitted, result.summary.orders_dropped
    );
    println!("Fills:          {}", result.summary.fills_applied);
    println!();
    println!("--- Portfolio ---");
    println!("Initial:        {:.2}", result.initial_capital);
    println!("Final Cash:     {:.2}", result.final_cash);
    println!("Final Value:    {:.2}", result.final_total_value);
    for (ticker, qty) in result.final_holdings.iter().filter(|&(_, &q)| q != 0) {
        println!("  {ticker:<12} {qty}");
    }
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", result.metrics.total_return * 100.0);
    println!("CAGR:           {:.2}%", result.metrics.cagr * 100.0);
    println!("Sharpe:         {:.3}", result.metrics.sharpe);
    println!("Sortino:        {:.3}", result.metrics.sortino);
    println!("Calmar:         {:.3}", result.metrics.calmar);
    println!("Max Drawdown:   {:.2}%", result.metrics.max_drawdown * 100.0);
    println!("Volatility:     {:.2}%", result.metrics.annualized_volatility * 100.0);
    if result.exit_reason == ExitReason::Halted {
        println!();
        println!(
            "WARNING: trading halted on max drawdown at {}",
            fmt_ts(result.halted_at)
        );
    }
}
