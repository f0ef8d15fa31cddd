mod analysis;
mod charts;
mod config;
mod daily_values;
mod error;
mod fetch;
mod lookups;
mod pipeline;
mod tables;
mod types;
mod utils;

pub use error::PipelineError;
pub use pipeline::*;

pub use config::error::ConfigError;
pub use config::{ChartSettings, DailyValuesSettings, Endpoint, PipelineConfig, TableOutputs};

pub use fetch::error::FetchError;
pub use fetch::{query_params, FeatureSource, HttpSource, QueryParams};

pub use daily_values::aggregator::BatchAggregator;
pub use daily_values::batcher::chunk;
pub use daily_values::extractor::extract_location_ids;
pub use daily_values::{save_daily_values, DailyValuesFetcher};

pub use lookups::error::CacheError;
pub use lookups::{
    get_locations, get_or_fetch, get_parameter_codes, get_statistic_codes, read_collection,
};

pub use tables::cleaner::{clean_and_transform, parse_timestamp, FINAL_COLUMNS};
pub use tables::error::TableError;
pub use tables::export::save_dataframe;
pub use tables::joiner::{join_daily_values_with_locations, LOCATION_COLUMNS};
pub use tables::loader::{
    collection_to_frame, features_to_frame, load_daily_values_and_locations, load_lookup_tables,
};

pub use analysis::summary::{
    observations, print_summary, render_summary, summarize_by_site, summarize_observations,
    Observation, SiteSummary,
};

pub use charts::error::ChartError;
pub use charts::{render_charts, sites_with_both_parameters};

pub use types::feature_collection::FeatureCollection;
pub use types::time_range::TimeRange;
