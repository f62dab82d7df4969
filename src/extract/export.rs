//! Bulk-export extraction strategy
//!
//! The movements view offers no scrapeable table at useful volume; instead
//! an Export control produces a delimited file. This module waits for the
//! file to land, then maps its lines into raw rows positionally.

use crate::extract::raw::RawRow;
use crate::extract::ExtractError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Field delimiter of the export file
pub const EXPORT_DELIMITER: char = ',';

/// File name the portal gives the movements export
pub const MOVEMENTS_EXPORT_NAME: &str = "MovementProgressExport.csv";

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Removes leftover files from a previous cycle's download directory
///
/// The download wait keys on a fixed file name, so a stale file from a
/// failed cycle would be mistaken for a fresh export.
pub fn clear_download_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed stale download {}", path.display());
        }
    }
    Ok(())
}

/// Blocks until the expected file appears under `dir` or the timeout elapses
///
/// Polls once a second. Exceeding the timeout is an error for the cycle;
/// downloads of a large export can legitimately take minutes.
pub async fn await_download(
    dir: &Path,
    file_name: &str,
    timeout: Duration,
) -> Result<PathBuf, ExtractError> {
    let path = dir.join(file_name);
    let deadline = Instant::now() + timeout;

    loop {
        if path.is_file() {
            return Ok(path);
        }
        if Instant::now() >= deadline {
            return Err(ExtractError::DownloadTimeout {
                path: path.display().to_string(),
                timeout,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Parses export file contents into raw rows
///
/// The first line is a header and is discarded; blank lines are skipped.
/// Each remaining line is split on the fixed delimiter and mapped
/// positionally; a line with fewer columns than expected yields absent
/// trailing fields rather than failing, since [`RawRow::cell`] treats a
/// missing index as None.
pub fn parse_export(contents: &str) -> Vec<RawRow> {
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            RawRow::new(
                line.split(EXPORT_DELIMITER)
                    .map(|field| field.trim().to_string())
                    .collect(),
            )
        })
        .collect()
}
