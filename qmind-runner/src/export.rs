//! Artifact export: equity curve and order log as CSV, full result as JSON.
//!
//! Layout: `<output_dir>/<run_id>/{equity.csv, orders.csv, result.json}`.
//! Persisted JSON carries a `schema_version`; newer versions are rejected on
//! load.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use qmind_core::domain::OrderEvent;
use qmind_core::portfolio::EquityPoint;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

pub const EQUITY_FILE: &str = "equity.csv";
pub const ORDERS_FILE: &str = "orders.csv";
pub const RESULT_FILE: &str = "result.json";

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: timestamp, cash, market_value, total_value, returns
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "cash", "market_value", "total_value", "returns"])?;
    for p in curve {
        wtr.write_record([
            p.timestamp.to_rfc3339(),
            format!("{:.6}", p.cash),
            format!("{:.6}", p.market_value),
            format!("{:.6}", p.total_value),
            format!("{:.10}", p.returns),
        ])?;
    }
    finish(wtr)
}

/// Columns: timestamp, ticker, side, kind, quantity
pub fn export_orders_csv(orders: &[OrderEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "ticker", "side", "kind", "quantity"])?;
    for o in orders {
        wtr.write_record([
            o.timestamp.to_rfc3339(),
            o.ticker.clone(),
            o.side.to_string(),
            format!("{:?}", o.kind).to_uppercase(),
            o.quantity.to_string(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write all artifacts for `result` and return the run directory.
pub fn write_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.run_id);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create {}", run_dir.display()))?;

    write_file(&run_dir.join(EQUITY_FILE), &export_equity_csv(&result.equity_curve)?)?;
    write_file(&run_dir.join(ORDERS_FILE), &export_orders_csv(&result.orders)?)?;
    write_file(&run_dir.join(RESULT_FILE), &export_json(result)?)?;
    Ok(run_dir)
}

pub fn load_result(run_dir: &Path) -> Result<BacktestResult> {
    let path = run_dir.join(RESULT_FILE);
    let json =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
