//! CSV dataset loading.
//!
//! Reads the three MarketPulse datasets from disk. The sales and
//! competitor files deserialize into typed records; the survey file is
//! carried through untouched as headers plus string rows. Loading is
//! strict: a missing file, a malformed row, or an unparseable month
//! fails the whole run.

use crate::models::{CompetitorRecord, RawTable, SalesRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading an input dataset.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row did not match the expected column layout or types.
    #[error("malformed record in {}: {source}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A sales row carried a month that is not "YYYY-MM".
    #[error("invalid month {value:?} in {}: expected YYYY-MM", .path.display())]
    Month { path: PathBuf, value: String },
}

/// Loads the sales dataset, validating every month value eagerly.
pub fn load_sales(path: &Path) -> Result<Vec<SalesRecord>, LoaderError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for result in reader.deserialize::<SalesRecord>() {
        let record = result.map_err(|source| LoaderError::Record {
            path: path.to_path_buf(),
            source,
        })?;
        if record.month_date().is_none() {
            return Err(LoaderError::Month {
                path: path.to_path_buf(),
                value: record.month,
            });
        }
        records.push(record);
    }

    debug!("Loaded {} sales rows from {}", records.len(), path.display());
    Ok(records)
}

/// Loads the competitor observations dataset.
pub fn load_competitors(path: &Path) -> Result<Vec<CompetitorRecord>, LoaderError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CompetitorRecord>() {
        let record = result.map_err(|source| LoaderError::Record {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }

    debug!(
        "Loaded {} competitor rows from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Loads the survey dataset as an untyped passthrough table.
pub fn load_survey(path: &Path) -> Result<RawTable, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| LoaderError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| LoaderError::Record {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| LoaderError::Record {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(record.iter().map(String::from).collect());
    }

    debug!("Loaded {} survey rows from {}", rows.len(), path.display());
    Ok(RawTable { headers, rows })
}
