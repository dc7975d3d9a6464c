//! Bar loading for the runner.
//!
//! Picks the reader from the file extension (`.parquet` or `.csv`), keeps the
//! configured tickers and applies the inclusive date window. A window that
//! leaves no bars is an error: a run over nothing is almost always a typo.

use std::path::Path;
use thiserror::Error;
use tracing::info;

use qmind_core::data::{read_bar_archive, read_bar_csv, DataError};
use qmind_core::domain::Bar;

use crate::config::DataSection;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("no bars for {tickers:?} in {path}")]
    NoBars { path: String, tickers: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Parquet,
    Csv,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("parquet") | Some("pq") => Ok(DataFormat::Parquet),
            Some("csv") => Ok(DataFormat::Csv),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Load, filter and window the bars named by `data`.
///
/// Ordering is left to the data handler.
pub fn load_bars(data: &DataSection, tickers: &[String]) -> Result<Vec<Bar>, LoadError> {
    let bars = match DataFormat::from_path(&data.path)? {
        DataFormat::Parquet => read_bar_archive(&data.path)?,
        DataFormat::Csv => read_bar_csv(&data.path)?,
    };
    let total = bars.len();

    let bars: Vec<Bar> = bars
        .into_iter()
        .filter(|b| tickers.iter().any(|t| *t == b.ticker))
        .filter(|b| {
            let date = b.timestamp.date_naive();
            data.start.map_or(true, |s| date >= s) && data.end.map_or(true, |e| date <= e)
        })
        .collect();

    if bars.is_empty() {
        return Err(LoadError::NoBars {
            path: data.path.display().to_string(),
            tickers: tickers.to_vec(),
        });
    }
    info!(path = %data.path.display(), read = total, kept = bars.len(), "bars loaded");
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("bars.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,ticker,open,high,low,close,volume").unwrap();
        for (d, t, c) in [
            ("2024-01-02", "SPY", 100.0),
            ("2024-01-02", "QQQ", 200.0),
            ("2024-01-03", "SPY", 101.0),
            ("2024-01-04", "SPY", 102.0),
        ] {
            writeln!(f, "{d},{t},{c},{c},{c},{c},10").unwrap();
        }
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DataFormat::from_path(Path::new("a.parquet")).unwrap(), DataFormat::Parquet);
        assert_eq!(DataFormat::from_path(Path::new("a.CSV")).unwrap(), DataFormat::Csv);
        assert!(DataFormat::from_path(Path::new("a.json")).is_err());
    }

    #[test]
    fn filters_tickers_and_dates() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataSection {
            path: write_csv(dir.path()),
            start: NaiveDate::from_ymd_opt(2024, 1, 3),
            end: NaiveDate::from_ymd_opt(2024, 1, 3),
        };
        let bars = load_bars(&data, &["SPY".to_string()]).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 101.0);
    }

    #[test]
    fn empty_window_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataSection {
            path: write_csv(dir.path()),
            start: NaiveDate::from_ymd_opt(2030, 1, 1),
            end: None,
        };
        let err = load_bars(&data, &["SPY".to_string()]).unwrap_err();
        assert!(matches!(err, LoadError::NoBars { .. }));
    }
}
