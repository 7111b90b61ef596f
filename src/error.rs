use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn the source file into a table. Always terminal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("line {line}: invalid {column} value {value:?}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("{} contains no data rows", .path.display())]
    Empty { path: PathBuf },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("end date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("unknown WHO region: {0}")]
    UnknownRegion(String),
}
