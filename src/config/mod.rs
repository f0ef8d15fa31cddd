//! Run configuration, read once from the environment (and an optional `.env`
//! file) and validated up front.
//!
//! Every problem found is collected into a single [`ConfigError`] so a broken
//! setup is reported in one go instead of failing on the first bad key.

pub mod error;

use crate::utils::default_cache_dir;
use bon::Builder;
use error::ConfigError;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// One upstream endpoint: where to fetch, the shared query template, and the
/// file its JSON response is cached in.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Endpoint {
    #[builder(into)]
    pub base_url: String,
    #[builder(default)]
    pub query: Map<String, Value>,
    #[builder(into)]
    pub output_file: PathBuf,
}

/// Settings specific to the batched daily-values fetch.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct DailyValuesSettings {
    pub endpoint: Endpoint,
    pub time_range_days: u32,
    pub batch_size: usize,
}

/// CSV destinations for the intermediate and final tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutputs {
    pub daily_values: PathBuf,
    pub locations: PathBuf,
    pub joined: PathBuf,
    pub cleaned: PathBuf,
}

/// Which two parameters to chart against each other, and where the charts go.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ChartSettings {
    /// `(primary, secondary)` parameter names. Charts are skipped when unset.
    pub parameters: Option<(String, String)>,
    #[builder(into)]
    pub dual_axis_path: PathBuf,
    #[builder(into)]
    pub scatter_path: PathBuf,
    #[builder(default)]
    pub open_in_browser: bool,
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub locations: Endpoint,
    pub refresh_locations: bool,
    pub parameter_codes: Endpoint,
    pub refresh_parameter_codes: bool,
    pub statistic_codes: Endpoint,
    pub refresh_statistic_codes: bool,
    pub daily_values: DailyValuesSettings,
    pub timeout: Duration,
    pub outputs: TableOutputs,
    pub charts: ChartSettings,
}

impl PipelineConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut reader = SettingsReader::new(lookup);

        let locations = reader.endpoint(
            "USGS_LOCATIONS_BASE_URL",
            "QUERY_PARAMS",
            "OUTPUT_FILE",
            "locations.json",
        );
        let refresh_locations = reader.flag("REFRESH_LOCATIONS");

        let parameter_codes = reader.endpoint(
            "USGS_PARAMETER_CODES_BASE_URL",
            "PARAM_CODES_QUERY_PARAMS",
            "PARAM_CODES_OUTPUT_FILE",
            "parameter_codes.json",
        );
        let refresh_parameter_codes = reader.flag("REFRESH_PARAMETER_CODES");

        let statistic_codes = reader.endpoint(
            "USGS_STATISTIC_CODES_BASE_URL",
            "STAT_CODES_QUERY_PARAMS",
            "STAT_CODES_OUTPUT_FILE",
            "statistic_codes.json",
        );
        let refresh_statistic_codes = reader.flag("REFRESH_STATISTIC_CODES");

        let daily_values_endpoint = reader.endpoint(
            "USGS_DV_BASE_URL",
            "DV_QUERY_PARAMS",
            "DV_OUTPUT_FILE",
            "daily_values.json",
        );
        let time_range_days = reader.positive::<u32>("DV_TIME_RANGE_DAYS");
        let batch_size = reader.positive::<usize>("DV_BATCH_SIZE");
        let timeout_seconds = reader.positive::<u64>("API_TIMEOUT_SECONDS");

        let outputs = TableOutputs {
            daily_values: reader.path_or("OUTPUT_DV_DATAFRAME", "outputs/daily_values.csv"),
            locations: reader.path_or("OUTPUT_LOCATIONS_DATAFRAME", "outputs/locations.csv"),
            joined: reader.path_or("OUTPUT_JOINED_DATAFRAME", "outputs/joined.csv"),
            cleaned: reader.path_or("OUTPUT_CLEANED_DATAFRAME", "outputs/cleaned.csv"),
        };

        let parameters = match (
            reader.optional("PLOT_PARAMETER_1"),
            reader.optional("PLOT_PARAMETER_2"),
        ) {
            (Some(first), Some(second)) => Some((first, second)),
            (None, None) => None,
            _ => {
                reader.problem("PLOT_PARAMETER_1 and PLOT_PARAMETER_2 must be set together");
                None
            }
        };
        let charts = ChartSettings {
            parameters,
            dual_axis_path: reader.path_or("OUTPUT_DUAL_AXIS_PLOT", "outputs/dual_axis.html"),
            scatter_path: reader.path_or("OUTPUT_SCATTER_PLOT", "outputs/scatter.html"),
            open_in_browser: reader.flag("OPEN_CHARTS"),
        };

        reader.finish()?;

        // `finish` only succeeds when every required value was read, so the
        // placeholders below are never observed.
        Ok(Self {
            locations: locations.unwrap_or_else(placeholder_endpoint),
            refresh_locations,
            parameter_codes: parameter_codes.unwrap_or_else(placeholder_endpoint),
            refresh_parameter_codes,
            statistic_codes: statistic_codes.unwrap_or_else(placeholder_endpoint),
            refresh_statistic_codes,
            daily_values: DailyValuesSettings {
                endpoint: daily_values_endpoint.unwrap_or_else(placeholder_endpoint),
                time_range_days: time_range_days.unwrap_or_default(),
                batch_size: batch_size.unwrap_or_default(),
            },
            timeout: Duration::from_secs(timeout_seconds.unwrap_or_default()),
            outputs,
            charts,
        })
    }
}

fn placeholder_endpoint() -> Endpoint {
    Endpoint {
        base_url: String::new(),
        query: Map::new(),
        output_file: PathBuf::new(),
    }
}

/// Reads settings through a lookup, recording problems instead of stopping.
struct SettingsReader<F> {
    lookup: F,
    problems: Vec<String>,
}

impl<F> SettingsReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            problems: Vec::new(),
        }
    }

    fn problem(&mut self, message: impl Into<String>) {
        self.problems.push(message.into());
    }

    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.problem(format!("Missing {key}"));
        }
        value
    }

    fn json_object(&mut self, key: &str) -> Option<Map<String, Value>> {
        let raw = self.optional(key);
        let Some(raw) = raw else {
            self.problem(format!("Missing {key} (must be a JSON object)"));
            return None;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                self.problem(format!("{key} must be a JSON object"));
                None
            }
            Err(e) => {
                self.problem(format!("{key} is not valid JSON: {e}"));
                None
            }
        }
    }

    fn positive<T>(&mut self, key: &str) -> Option<T>
    where
        T: FromStr + Default + PartialOrd,
    {
        let raw = self.required(key)?;
        match raw.parse::<T>() {
            Ok(value) if value > T::default() => Some(value),
            Ok(_) => {
                self.problem(format!("{key} must be greater than zero, got '{raw}'"));
                None
            }
            Err(_) => {
                self.problem(format!("{key} must be a positive integer, got '{raw}'"));
                None
            }
        }
    }

    fn flag(&mut self, key: &str) -> bool {
        let Some(raw) = self.optional(key) else {
            return false;
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                self.problem(format!("{key} must be true or false, got '{raw}'"));
                false
            }
        }
    }

    fn path_or(&self, key: &str, default: &str) -> PathBuf {
        self.optional(key)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    }

    /// Cache files default to the system cache directory.
    fn cache_path(&mut self, key: &str, file_name: &str) -> Option<PathBuf> {
        if let Some(path) = self.optional(key) {
            return Some(PathBuf::from(path));
        }
        match default_cache_dir() {
            Some(dir) => Some(dir.join(file_name)),
            None => {
                self.problem(format!(
                    "{key} is not set and the system cache directory could not be determined"
                ));
                None
            }
        }
    }

    fn endpoint(
        &mut self,
        url_key: &str,
        query_key: &str,
        output_key: &str,
        default_file_name: &str,
    ) -> Option<Endpoint> {
        let base_url = self.required(url_key);
        let query = self.json_object(query_key);
        let output_file = self.cache_path(output_key, default_file_name);
        Some(Endpoint {
            base_url: base_url?,
            query: query?,
            output_file: output_file?,
        })
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError {
                problems: self.problems,
            })
        }
    }
}
