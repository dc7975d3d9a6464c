//! Columnar bar archive: long-format Parquet, one row per (date, ticker).
//!
//! Columns: `date, ticker, open, high, low, close, volume`.
//! Dates are stored as Parquet `Date` and replayed at midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use polars::prelude::*;
use std::fs;
use std::path::Path;

use super::source::DataError;
use crate::domain::Bar;

const EXPECTED_COLUMNS: [&str; 7] = ["date", "ticker", "open", "high", "low", "close", "volume"];

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Write bars to a Parquet archive.
///
/// Writes are atomic: write to .tmp then rename.
pub fn write_bar_archive(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::ValidationError("no bars to archive".into()));
    }

    let mut df = bars_to_dataframe(bars)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("atomic rename failed: {e}"))
    })?;
    Ok(())
}

/// Read every bar in a Parquet archive, in file order.
pub fn read_bar_archive(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    for col_name in &EXPECTED_COLUMNS {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df)
}

fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.timestamp.date_naive() - epoch()).num_days() as i32)
        .collect();
    let tickers: Vec<String> = bars.iter().map(|b| b.ticker.clone()).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("ticker".into(), tickers),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn column_as(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Column, DataError> {
    df.column(name)
        .and_then(|c| c.cast(dtype))
        .map_err(|e| DataError::ParquetError(format!("{name} column: {e}")))
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let type_err = |name: &str, e: PolarsError| {
        DataError::ParquetError(format!("{name} column type: {e}"))
    };

    // Casts accept archives written with Datetime dates, i64 volumes or f32 prices.
    let dates = column_as(df, "date", &DataType::Date)?;
    let tickers = column_as(df, "ticker", &DataType::String)?;
    let opens = column_as(df, "open", &DataType::Float64)?;
    let highs = column_as(df, "high", &DataType::Float64)?;
    let lows = column_as(df, "low", &DataType::Float64)?;
    let closes = column_as(df, "close", &DataType::Float64)?;
    let volumes = column_as(df, "volume", &DataType::UInt64)?;

    let date_ca = dates.date().map_err(|e| type_err("date", e))?;
    let ticker_ca = tickers.str().map_err(|e| type_err("ticker", e))?;
    let open_ca = opens.f64().map_err(|e| type_err("open", e))?;
    let high_ca = highs.f64().map_err(|e| type_err("high", e))?;
    let low_ca = lows.f64().map_err(|e| type_err("low", e))?;
    let close_ca = closes.f64().map_err(|e| type_err("close", e))?;
    let vol_ca = volumes.u64().map_err(|e| type_err("volume", e))?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        let ticker = ticker_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null ticker at row {i}")))?;
        let date = epoch() + chrono::Duration::days(date_days as i64);

        bars.push(Bar {
            timestamp: midnight_utc(date),
            ticker: ticker.to_string(),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }

    Ok(bars)
}

pub(crate) fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
