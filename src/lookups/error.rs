use crate::fetch::error::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache file '{0}'")]
    Decode(PathBuf, #[source] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
