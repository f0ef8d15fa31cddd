use crate::tables::error::TableError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to create chart output directory for '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read chart data")]
    Table(#[from] TableError),

    #[error("Failed to build chart frame: {0}")]
    Polars(#[from] PolarsError),
}
