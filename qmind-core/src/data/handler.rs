//! Historical data handler: replays a bar table as a stream of bars.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::archive::read_bar_archive;
use super::csv_import::read_bar_csv;
use super::source::{DataError, DataSource, LatestPrices, PriceSource};
use crate::domain::Bar;

/// Replays bars for a fixed ticker list in `(timestamp, ticker)` order.
///
/// Bars for tickers outside the list, and void bars (a missing or
/// non-finite price), are discarded at construction. The
/// close of every bar handed out by [`next_bar`](DataSource::next_bar) is
/// recorded in the shared [`LatestPrices`] book before it is returned.
#[derive(Debug)]
pub struct HistoricalDataHandler {
    tickers: Vec<String>,
    bars: Vec<Bar>,
    cursor: usize,
    prices: LatestPrices,
}

impl HistoricalDataHandler {
    /// Build from an in-memory bar table.
    pub fn new(tickers: &[String], bars: Vec<Bar>) -> Result<Self, DataError> {
        if tickers.is_empty() {
            return Err(DataError::EmptyTickers);
        }

        let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();
        let mut bars: Vec<Bar> = bars
            .into_iter()
            .filter(|b| wanted.contains(b.ticker.as_str()))
            .filter(|b| {
                if b.is_void() {
                    warn!(
                        ticker = %b.ticker,
                        timestamp = %b.timestamp,
                        "skipping bar with missing prices"
                    );
                }
                !b.is_void()
            })
            .collect();
        // Stable: bars sharing a (timestamp, ticker) key keep their source order.
        bars.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });

        Ok(Self {
            tickers: tickers.to_vec(),
            bars,
            cursor: 0,
            prices: LatestPrices::new(),
        })
    }

    /// Load a long-format Parquet bar archive.
    pub fn from_parquet(path: &Path, tickers: &[String]) -> Result<Self, DataError> {
        Self::new(tickers, read_bar_archive(path)?)
    }

    /// Load a long-format CSV bar file.
    pub fn from_csv(path: &Path, tickers: &[String]) -> Result<Self, DataError> {
        Self::new(tickers, read_bar_csv(path)?)
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Total bars in the replay (after ticker filtering).
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars not yet streamed.
    pub fn remaining(&self) -> usize {
        self.bars.len() - self.cursor
    }

    /// Handle onto the last-close book this handler keeps current.
    pub fn prices(&self) -> LatestPrices {
        self.prices.clone()
    }
}

impl DataSource for HistoricalDataHandler {
    fn next_bar(&mut self) -> Option<Bar> {
        let bar = self.bars.get(self.cursor)?.clone();
        self.cursor += 1;
        self.prices.record(&bar.ticker, bar.close);
        Some(bar)
    }

    fn latest_close(&self, ticker: &str) -> Option<f64> {
        self.prices.get(ticker)
    }

    fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    fn price_source(&self) -> Option<Arc<dyn PriceSource>> {
        Some(Arc::new(self.prices.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, ticker: &str, close: f64) -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            ticker,
            close,
            close,
            close,
            close,
            1_000,
        )
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_ticker_list_is_rejected() {
        let err = HistoricalDataHandler::new(&[], vec![bar(1, "AAPL", 1.0)]).unwrap_err();
        assert!(matches!(err, DataError::EmptyTickers));
    }

    #[test]
    fn streams_in_date_then_ticker_order() {
        let bars = vec![
            bar(2, "GOOG", 20.0),
            bar(1, "GOOG", 10.0),
            bar(2, "AAPL", 2.0),
            bar(1, "AAPL", 1.0),
        ];
        let mut handler = HistoricalDataHandler::new(&tickers(&["AAPL", "GOOG"]), bars).unwrap();

        let order: Vec<(u32, String)> = std::iter::from_fn(|| handler.next_bar())
            .map(|b| (chrono::Datelike::day(&b.timestamp), b.ticker))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "AAPL".to_string()),
                (1, "GOOG".to_string()),
                (2, "AAPL".to_string()),
                (2, "GOOG".to_string()),
            ]
        );
    }

    #[test]
    fn filters_unlisted_tickers() {
        let bars = vec![bar(1, "AAPL", 1.0), bar(1, "MSFT", 5.0)];
        let handler = HistoricalDataHandler::new(&tickers(&["AAPL"]), bars).unwrap();
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn latest_close_unknown_until_streamed() {
        let bars = vec![bar(1, "AAPL", 101.0), bar(2, "AAPL", 102.0)];
        let mut handler = HistoricalDataHandler::new(&tickers(&["AAPL"]), bars).unwrap();
        let shared = handler.price_source().unwrap();

        assert!(handler.latest_close("AAPL").is_none());
        handler.next_bar();
        assert_eq!(handler.latest_close("AAPL"), Some(101.0));
        assert_eq!(shared.latest_close("AAPL"), Some(101.0));
        handler.next_bar();
        assert_eq!(shared.latest_close("AAPL"), Some(102.0));
        assert!(handler.next_bar().is_none());
        assert_eq!(handler.remaining(), 0);
    }

    #[test]
    fn void_bars_are_skipped() {
        let bars = vec![
            bar(1, "AAPL", 100.0),
            bar(2, "AAPL", f64::NAN),
            bar(3, "AAPL", 50.0),
        ];
        let mut handler = HistoricalDataHandler::new(&tickers(&["AAPL"]), bars).unwrap();
        assert_eq!(handler.len(), 2);

        let closes: Vec<f64> = std::iter::from_fn(|| handler.next_bar())
            .map(|b| b.close)
            .collect();
        assert_eq!(closes, vec![100.0, 50.0]);
        assert_eq!(handler.latest_close("AAPL"), Some(50.0));
    }

    #[test]
    fn start_timestamp_is_first_bar() {
        let bars = vec![bar(3, "AAPL", 1.0), bar(2, "AAPL", 1.0)];
        let handler = HistoricalDataHandler::new(&tickers(&["AAPL"]), bars).unwrap();
        assert_eq!(
            handler.start_timestamp(),
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn loads_from_csv_and_parquet_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("bars.csv");
        std::fs::write(
            &csv_path,
            "date,ticker,open,high,low,close,volume\n\
             2025-01-02,AAPL,1,1,1,1.5,10\n\
             2025-01-02,MSFT,2,2,2,2.5,10\n\
             2025-01-01,AAPL,1,1,1,1.0,10\n",
        )
        .unwrap();

        let mut from_csv = HistoricalDataHandler::from_csv(&csv_path, &tickers(&["AAPL"])).unwrap();
        assert_eq!(from_csv.len(), 2);
        assert_eq!(from_csv.next_bar().map(|b| b.close), Some(1.0));

        let pq_path = dir.path().join("bars.parquet");
        super::super::archive::write_bar_archive(&pq_path, &[bar(1, "AAPL", 7.0)]).unwrap();
        let mut from_pq =
            HistoricalDataHandler::from_parquet(&pq_path, &tickers(&["AAPL"])).unwrap();
        assert_eq!(from_pq.next_bar().map(|b| b.close), Some(7.0));
    }
}
