//! Error types for dataset loading and forecast runs

use thiserror::Error;

use crate::account::Vintage;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Row {row}: malformed value '{value}' in column '{column}'")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: unknown product type '{code}'")]
    UnknownProductType { row: usize, code: String },

    #[error("Vintage {vintage}: account {account} has no value for '{column}'")]
    MissingCohortValue {
        vintage: Vintage,
        account: String,
        column: String,
    },

    #[error("Vintage {vintage}: months in collection differ between accounts ({expected} vs {found} on account {account})")]
    InconsistentCohort {
        vintage: Vintage,
        account: String,
        expected: u32,
        found: u32,
    },

    #[error("Forecast horizon of {horizon} months needs {needed} predicted columns, dataset provides {available}")]
    HorizonOutOfRange {
        horizon: u32,
        needed: usize,
        available: usize,
    },

    #[error("Invalid vintage '{0}' (expected YYYY-MM)")]
    InvalidVintage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;
