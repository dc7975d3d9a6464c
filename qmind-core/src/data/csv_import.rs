//! CSV bar import: same long format as the Parquet archive.
//!
//! Header: `date,ticker,open,high,low,close,volume`. The `date` column accepts
//! `YYYY-MM-DD` (replayed at midnight UTC) or an RFC 3339 timestamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::archive::midnight_utc;
use super::source::DataError;
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct BarRecord {
    date: String,
    ticker: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Parse a bar timestamp from either a plain date or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DataError::BadTimestamp(raw.to_string()))
}

/// Read every bar from a CSV file, in file order.
pub fn read_bar_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = File::open(path)
        .map_err(|e| DataError::CsvError(format!("open {}: {e}", path.display())))?;
    read_bar_csv_from(file)
}

/// Read bars from any CSV byte stream with a header row.
pub fn read_bar_csv_from<R: Read>(input: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_reader(input);
    let mut bars = Vec::new();
    for (row, record) in reader.deserialize::<BarRecord>().enumerate() {
        let record = record.map_err(|e| DataError::CsvError(format!("row {}: {e}", row + 1)))?;
        bars.push(Bar {
            timestamp: parse_timestamp(&record.date)?,
            ticker: record.ticker,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(bars)
}
