//! The end-to-end run: fetch, cache, tabulate, clean, summarize and chart.

use crate::analysis::summary::{print_summary, summarize_by_site, SiteSummary};
use crate::charts::render_charts;
use crate::config::PipelineConfig;
use crate::daily_values::{save_daily_values, DailyValuesFetcher};
use crate::error::PipelineError;
use crate::fetch::{FeatureSource, HttpSource};
use crate::lookups::{get_locations, get_parameter_codes, get_statistic_codes};
use crate::tables::cleaner::clean_and_transform;
use crate::tables::export::save_dataframe;
use crate::tables::joiner::join_daily_values_with_locations;
use crate::tables::loader::{load_daily_values_and_locations, load_lookup_tables};
use log::info;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub daily_values_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub cleaned_rows: usize,
    pub summaries: Vec<SiteSummary>,
    pub charts: Vec<PathBuf>,
}

/// Runs the whole pipeline against `source`.
pub fn run(config: &PipelineConfig, source: &dyn FeatureSource) -> Result<RunReport, PipelineError> {
    let (locations, locations_path) =
        get_locations(&config.locations, config.refresh_locations, source)?;
    let parameter_codes_path = get_parameter_codes(
        &config.parameter_codes,
        config.refresh_parameter_codes,
        source,
    )?;
    let statistic_codes_path = get_statistic_codes(
        &config.statistic_codes,
        config.refresh_statistic_codes,
        source,
    )?;

    let daily_values = DailyValuesFetcher::new(source, &config.daily_values).fetch(&locations)?;
    let daily_values_path =
        save_daily_values(&daily_values, &config.daily_values.endpoint.output_file)?;

    let (mut daily_values_df, mut locations_df) =
        load_daily_values_and_locations(&daily_values_path, &locations_path)?;
    let (parameter_codes_df, statistic_codes_df) =
        load_lookup_tables(&parameter_codes_path, &statistic_codes_path)?;
    info!(
        "Loaded tables: daily values {:?}, locations {:?}, parameter codes {:?}, statistic codes {:?}",
        daily_values_df.shape(),
        locations_df.shape(),
        parameter_codes_df.shape(),
        statistic_codes_df.shape()
    );

    let outputs = &config.outputs;
    save_dataframe(&mut daily_values_df, &outputs.daily_values)?;
    save_dataframe(&mut locations_df, &outputs.locations)?;

    let mut joined = join_daily_values_with_locations(&daily_values_df, &locations_df)?;
    save_dataframe(&mut joined, &outputs.joined)?;

    let mut cleaned = clean_and_transform(&joined, &parameter_codes_df, &statistic_codes_df)?;
    save_dataframe(&mut cleaned, &outputs.cleaned)?;

    let summaries = summarize_by_site(&cleaned)?;
    print_summary(&summaries);

    let charts = render_charts(&cleaned, &config.charts)?;

    Ok(RunReport {
        daily_values_path,
        cleaned_path: outputs.cleaned.clone(),
        cleaned_rows: cleaned.height(),
        summaries,
        charts,
    })
}

/// [`run`] over HTTP with the configured timeout.
pub fn run_with_http(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    let source = HttpSource::new(config.timeout)?;
    run(config, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::complete_settings;
    use crate::fetch::error::FetchError;
    use crate::fetch::testing::RecordingSource;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn config(dir: &TempDir, charted: bool) -> PipelineConfig {
        let mut settings = complete_settings();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        settings.insert("OUTPUT_FILE", path("cache/locations.json"));
        settings.insert("PARAM_CODES_OUTPUT_FILE", path("cache/parameter_codes.json"));
        settings.insert("STAT_CODES_OUTPUT_FILE", path("cache/statistic_codes.json"));
        settings.insert("DV_OUTPUT_FILE", path("cache/daily_values.json"));
        settings.insert("DV_BATCH_SIZE", "2".to_string());
        settings.insert("OUTPUT_DV_DATAFRAME", path("outputs/daily_values.csv"));
        settings.insert("OUTPUT_LOCATIONS_DATAFRAME", path("outputs/locations.csv"));
        settings.insert("OUTPUT_JOINED_DATAFRAME", path("outputs/joined.csv"));
        settings.insert("OUTPUT_CLEANED_DATAFRAME", path("outputs/cleaned.csv"));
        settings.insert("OUTPUT_DUAL_AXIS_PLOT", path("outputs/dual_axis.html"));
        settings.insert("OUTPUT_SCATTER_PLOT", path("outputs/scatter.html"));
        if charted {
            settings.insert("PLOT_PARAMETER_1", "Discharge".to_string());
            settings.insert("PLOT_PARAMETER_2", "Temperature, water".to_string());
        }
        PipelineConfig::from_lookup(|key| settings.get(key).cloned()).unwrap()
    }

    fn locations() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"id": "USGS-1", "properties": {"id": "USGS-1", "monitoring_location_name": "RIO GRANDE", "state_name": "New Mexico"}},
                {"id": "USGS-2", "properties": {"id": "USGS-2", "monitoring_location_name": "RIO CHAMA", "state_name": "New Mexico"}},
                {"id": "USGS-3", "properties": {"id": "USGS-3", "monitoring_location_name": "PECOS RIVER", "state_name": "New Mexico"}},
            ],
        })
    }

    fn parameter_codes() -> Value {
        json!({"features": [
            {"properties": {"id": "00060", "parameter_name": "Discharge"}},
            {"properties": {"id": "00010", "parameter_name": "Temperature, water"}},
        ]})
    }

    fn statistic_codes() -> Value {
        json!({"features": [{"properties": {"id": "00003", "statistic_description": "Mean"}}]})
    }

    fn daily_value(id: &str, site: &str, code: &str, day: u32, value: &str) -> Value {
        json!({"type": "Feature", "properties": {
            "id": id,
            "monitoring_location_id": site,
            "parameter_code": code,
            "statistic_id": "00003",
            "time": format!("2025-06-{day:02}"),
            "value": value,
            "unit_of_measure": if code == "00060" { "ft^3/s" } else { "degC" },
            "approval_status": "Provisional",
            "qualifier": null,
            "last_modified": "2025-06-10T12:00:00+00:00",
        }})
    }

    fn first_batch() -> Value {
        json!({
            "type": "FeatureCollection",
            "numberReturned": 4,
            "features": [
                daily_value("dv-1", "USGS-1", "00060", 1, "100"),
                daily_value("dv-2", "USGS-1", "00010", 1, "18.5"),
                daily_value("dv-3", "USGS-1", "00060", 2, "120"),
                daily_value("dv-4", "USGS-2", "00060", 1, "not_a_number"),
            ],
        })
    }

    fn second_batch() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [daily_value("dv-5", "USGS-3", "00060", 1, "7.5")],
        })
    }

    #[test]
    fn runs_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, true);
        let source = RecordingSource::with_responses([
            locations(),
            parameter_codes(),
            statistic_codes(),
            first_batch(),
            second_batch(),
        ]);

        let report = run(&config, &source).unwrap();

        let calls = source.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3].0, "https://api.example/daily");
        assert_eq!(RecordingSource::param(&calls[3].1, "monitoring_location_id"), Some("USGS-1,USGS-2"));
        assert_eq!(RecordingSource::param(&calls[4].1, "monitoring_location_id"), Some("USGS-3"));

        assert_eq!(report.cleaned_rows, 4);
        assert_eq!(report.cleaned_path, config.outputs.cleaned);
        for csv in [
            &config.outputs.daily_values,
            &config.outputs.locations,
            &config.outputs.joined,
            &config.outputs.cleaned,
        ] {
            assert!(csv.is_file(), "{csv:?} was not written");
        }

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(&report.daily_values_path).unwrap())
                .unwrap();
        assert_eq!(saved["total_features"], 5);
        assert_eq!(saved["batches"], 2);
        assert_eq!(saved["numberReturned"], 5);

        let rio_grande_flow = report
            .summaries
            .iter()
            .find(|s| s.site == "RIO GRANDE" && s.parameter == "Discharge")
            .unwrap();
        assert_eq!(rio_grande_flow.observations, 2);
        assert_eq!(rio_grande_flow.most_recent_value, 120.0);
        assert_eq!(report.summaries.len(), 3);

        assert_eq!(report.charts.len(), 2);
    }

    #[test]
    fn second_run_reuses_cached_lookups() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let first = RecordingSource::with_responses([
            locations(),
            parameter_codes(),
            statistic_codes(),
            first_batch(),
            second_batch(),
        ]);
        run(&config, &first).unwrap();

        let second = RecordingSource::with_responses([first_batch(), second_batch()]);
        let report = run(&config, &second).unwrap();

        let urls: Vec<String> = second.calls().into_iter().map(|(url, _)| url).collect();
        assert_eq!(urls, ["https://api.example/daily", "https://api.example/daily"]);
        assert!(report.charts.is_empty());
    }

    #[test]
    fn failing_batch_aborts_before_any_table_is_written() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let source = RecordingSource::with_responses([
            locations(),
            parameter_codes(),
            statistic_codes(),
            first_batch(),
        ]);
        source.push_error(FetchError::NoLocationIds);

        let err = run(&config, &source).unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(_)));
        assert!(!config.outputs.daily_values.exists());
        assert!(!config.daily_values.endpoint.output_file.exists());
    }
}
