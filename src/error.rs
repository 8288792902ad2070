//src/error.rs

use thiserror::Error;

/// Failure while reading the Kraken report. Always fatal.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read report: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse report: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected 6 tab-separated columns, found {found}")]
    ColumnCount { line: u64, found: usize },

    #[error("line {line}: {field} is not a valid number: {value:?}")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Failure while looking up lineages in the taxonomy database. Always fatal.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot read taxonomy database: {0}")]
    Io(#[from] std::io::Error),

    #[error("taxonomy database query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("taxonomy database line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Top-level error of one pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("cannot write output: {0}")]
    OutputCsv(#[from] csv::Error),

    #[error("cannot write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("configuration error: {0}")]
    Config(String),
}
