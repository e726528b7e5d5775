//! Error types for the dashboard library.
//!
//! Library code returns these `thiserror` enums; the binaries propagate
//! them through `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the session table. All of them are fatal.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read data source {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required column '{0}' is missing from the data source")]
    MissingColumn(String),

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by the aggregator
#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("cannot apply '{function}' to text column '{column}'")]
    NonNumericMetric {
        column: &'static str,
        function: &'static str,
    },
}

/// Errors raised when parsing user-supplied names
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown aggregation function '{0}' (expected count, size, sum, mean, min or max)")]
    UnknownAggregation(String),

    #[error("unknown page '{0}' (expected Handsets or Applications)")]
    UnknownPage(String),
}

/// Errors raised by an ad hoc aggregate query
#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
