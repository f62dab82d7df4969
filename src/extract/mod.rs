//! Extraction of raw row records from loaded views
//!
//! Two source strategies feed the normalizer with the same raw-record shape:
//! - Live-table scraping of an HTML view already rendered in the session
//! - Bulk export: a triggered file download parsed as delimited text
//!
//! Either way, an extraction is a finite, non-restartable sequence of rows in
//! render/export order, and an empty result is a valid outcome, not an error.

mod columns;
mod export;
mod raw;
mod table;

pub use columns::{ColumnMap, ARRIVAL_COLUMNS, MOVEMENT_COLUMNS, TRANSFER_COLUMNS};
pub use export::{
    await_download, clear_download_dir, parse_export, EXPORT_DELIMITER, MOVEMENTS_EXPORT_NAME,
};
pub use raw::RawRow;
pub use table::{extract_flight_rows, RawFlightRow, CHILD_ROW_SELECTOR, PARENT_ROW_SELECTOR};

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid column map {map}: {message}")]
    InvalidColumnMap { map: &'static str, message: String },

    #[error("Invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("Export file {path} did not appear within {timeout:?}")]
    DownloadTimeout { path: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
