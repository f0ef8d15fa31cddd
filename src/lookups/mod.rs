//! Cached single-request endpoints: monitoring locations and the parameter-code
//! and statistic-code lookup tables.
//!
//! A cache file is reused as long as it exists; staleness is the caller's call
//! through the `refresh` flag.

pub mod error;

use crate::config::Endpoint;
use crate::fetch::{query_params, FeatureSource};
use crate::types::feature_collection::FeatureCollection;
use crate::utils::write_json_pretty;
use error::CacheError;
use log::{info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Returns the cache path for `endpoint`, fetching it first when the file is
/// missing or `refresh` is set.
pub fn get_or_fetch(
    endpoint: &Endpoint,
    refresh: bool,
    source: &dyn FeatureSource,
) -> Result<PathBuf, CacheError> {
    let path = &endpoint.output_file;

    if !refresh && path.is_file() {
        info!("Cache hit for {} at {:?}", endpoint.base_url, path);
        return Ok(path.clone());
    }

    if refresh {
        info!("Refreshing {} into {:?}", endpoint.base_url, path);
    } else {
        warn!(
            "Cache miss for {}. Downloading into {:?}",
            endpoint.base_url, path
        );
    }

    let document = source.get_json(&endpoint.base_url, &query_params(&endpoint.query))?;
    write_json_pretty(path, &document).map_err(|e| CacheError::Write(path.clone(), e))?;
    Ok(path.clone())
}

/// Reads a cached collection from disk.
pub fn read_collection(path: &Path) -> Result<FeatureCollection, CacheError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| CacheError::Read(path.to_path_buf(), e))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| CacheError::Decode(path.to_path_buf(), e))?;
    Ok(FeatureCollection::from_value(value))
}

/// Monitoring locations, parsed, together with their cache path.
pub fn get_locations(
    endpoint: &Endpoint,
    refresh: bool,
    source: &dyn FeatureSource,
) -> Result<(FeatureCollection, PathBuf), CacheError> {
    let path = get_or_fetch(endpoint, refresh, source)?;
    let locations = read_collection(&path)?;
    info!("Loaded {} monitoring locations", locations.len());
    Ok((locations, path))
}

/// Parameter-code lookup table (what was measured).
pub fn get_parameter_codes(
    endpoint: &Endpoint,
    refresh: bool,
    source: &dyn FeatureSource,
) -> Result<PathBuf, CacheError> {
    get_or_fetch(endpoint, refresh, source)
}

/// Statistic-code lookup table (how a daily value was derived).
pub fn get_statistic_codes(
    endpoint: &Endpoint,
    refresh: bool,
    source: &dyn FeatureSource,
) -> Result<PathBuf, CacheError> {
    get_or_fetch(endpoint, refresh, source)
}
