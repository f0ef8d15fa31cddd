use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read collection file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse collection file '{0}'")]
    Decode(PathBuf, #[source] serde_json::Error),

    #[error("Missing required column '{column}' in the {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("Failed to create output directory for '{0}'")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing CSV file '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
