use crate::charts::error::ChartError;
use crate::config::error::ConfigError;
use crate::fetch::error::FetchError;
use crate::lookups::error::CacheError;
use crate::tables::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Chart(#[from] ChartError),
}
