//! Batched fetching of daily values for every monitoring location.

pub mod aggregator;
pub mod batcher;
pub mod extractor;

use crate::config::DailyValuesSettings;
use crate::fetch::error::FetchError;
use crate::fetch::{query_params, FeatureSource};
use crate::lookups::error::CacheError;
use crate::types::feature_collection::FeatureCollection;
use crate::types::time_range::TimeRange;
use crate::utils::write_json_pretty;
use aggregator::BatchAggregator;
use batcher::chunk;
use extractor::extract_location_ids;
use log::info;
use std::path::{Path, PathBuf};

const LOCATION_ID_PARAM: &str = "monitoring_location_id";
const TIME_PARAM: &str = "time";

/// Fetches daily values in sequential batches of location IDs.
pub struct DailyValuesFetcher<'a> {
    source: &'a dyn FeatureSource,
    settings: &'a DailyValuesSettings,
}

impl<'a> DailyValuesFetcher<'a> {
    pub fn new(source: &'a dyn FeatureSource, settings: &'a DailyValuesSettings) -> Self {
        Self { source, settings }
    }

    /// Fetches the last `time_range_days` days for every location in `locations`.
    pub fn fetch(&self, locations: &FeatureCollection) -> Result<FeatureCollection, FetchError> {
        self.fetch_in_range(
            locations,
            TimeRange::last_days(self.settings.time_range_days),
        )
    }

    /// Same as [`Self::fetch`] with an explicit window.
    ///
    /// Any failing batch aborts the whole fetch; there is no partial result.
    pub fn fetch_in_range(
        &self,
        locations: &FeatureCollection,
        time_range: TimeRange,
    ) -> Result<FeatureCollection, FetchError> {
        let ids = extract_location_ids(locations);
        if ids.is_empty() {
            return Err(FetchError::NoLocationIds);
        }

        let batch_size = self.settings.batch_size;
        let batches = chunk(&ids, batch_size);
        let time_range_text = time_range.to_string();
        info!(
            "Daily values: {} location IDs in {} batches (batch size {}), time range {}",
            ids.len(),
            batches.len(),
            batch_size,
            time_range_text
        );

        let endpoint = &self.settings.endpoint;
        let base_params = query_params(&endpoint.query);
        let mut aggregator = BatchAggregator::new();

        for (idx, batch) in batches.iter().enumerate() {
            let mut params: Vec<(String, String)> = base_params
                .iter()
                .filter(|(key, _)| key != LOCATION_ID_PARAM && key != TIME_PARAM)
                .cloned()
                .collect();
            params.push((LOCATION_ID_PARAM.to_string(), batch.join(",")));
            params.push((TIME_PARAM.to_string(), time_range_text.clone()));

            let response = self.source.get_json(&endpoint.base_url, &params)?;
            let contributed = aggregator.push(response);
            info!(
                "[{}/{}] {} IDs -> {} features",
                idx + 1,
                batches.len(),
                batch.len(),
                contributed
            );
        }

        Ok(aggregator.finish(batch_size, &time_range))
    }
}

/// Writes the combined daily-values collection to `path`.
pub fn save_daily_values(
    collection: &FeatureCollection,
    path: &Path,
) -> Result<PathBuf, CacheError> {
    write_json_pretty(path, collection)
        .map_err(|e| CacheError::Write(path.to_path_buf(), e))?;
    info!(
        "Saved {} daily values to {}",
        collection.len(),
        path.display()
    );
    Ok(path.to_path_buf())
}
