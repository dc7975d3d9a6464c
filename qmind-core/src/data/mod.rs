//! Market data: the data source contract, last-close lookup, and bar loaders.

pub mod archive;
pub mod csv_import;
pub mod handler;
pub mod source;

pub use archive::{read_bar_archive, write_bar_archive};
pub use csv_import::{parse_timestamp, read_bar_csv, read_bar_csv_from};
pub use handler::HistoricalDataHandler;
pub use source::{DataError, DataSource, LatestPrices, PriceSource};
