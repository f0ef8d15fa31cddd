use crate::tables::cleaner::timestamp_column;
use crate::tables::error::TableError;
use crate::tables::require_column;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tabled::settings::Style;
use tabled::{Table, Tabled};

const BANNER_WIDTH: usize = 130;

/// One cleaned daily value, pulled out of the frame for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub site: String,
    pub parameter: String,
    pub time: Option<NaiveDateTime>,
    pub value: f64,
    pub unit: Option<String>,
}

/// Statistics for one (site, parameter) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub site: String,
    pub parameter: String,
    pub observations: usize,
    pub min: f64,
    pub max: f64,
    /// Rounded to two decimals.
    pub mean: f64,
    pub most_recent_time: Option<NaiveDateTime>,
    pub most_recent_value: f64,
    pub unit: Option<String>,
}

/// Reads the rows of a cleaned frame that have a site, a parameter and a value.
pub fn observations(df: &DataFrame) -> Result<Vec<Observation>, TableError> {
    for column in ["monitoring_location_name", "parameter_name", "value", "time"] {
        require_column(df, "cleaned", column)?;
    }

    let sites = df.column("monitoring_location_name")?.cast(&DataType::String)?;
    let parameters = df.column("parameter_name")?.cast(&DataType::String)?;
    let values = df.column("value")?.cast(&DataType::Float64)?;
    let times = timestamp_column(df.column("time")?, None)?.cast(&DataType::Int64)?;
    let units = match df.column("unit_of_measure") {
        Ok(units) => units.cast(&DataType::String)?,
        Err(_) => Column::full_null("unit_of_measure".into(), df.height(), &DataType::String),
    };

    let rows = sites
        .str()?
        .into_iter()
        .zip(parameters.str()?)
        .zip(values.f64()?)
        .zip(times.i64()?)
        .zip(units.str()?);

    Ok(rows
        .filter_map(|((((site, parameter), value), time), unit)| {
            Some(Observation {
                site: site?.to_string(),
                parameter: parameter?.to_string(),
                value: value?,
                time: time
                    .and_then(DateTime::from_timestamp_millis)
                    .map(|t| t.naive_utc()),
                unit: unit.map(str::to_string),
            })
        })
        .collect())
}

/// Groups observations by site and parameter, sorted by both.
///
/// The most recent value is the last row when rows are ordered by time with
/// undated rows first; ties keep input order.
pub fn summarize_observations(observations: &[Observation]) -> Vec<SiteSummary> {
    let mut groups: BTreeMap<(&str, &str), Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.site.as_str(), obs.parameter.as_str()))
            .or_default()
            .push(obs);
    }

    groups
        .into_iter()
        .filter_map(|((site, parameter), rows)| {
            let mut latest = *rows.first()?;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut sum = 0.0;
            for &obs in &rows {
                min = min.min(obs.value);
                max = max.max(obs.value);
                sum += obs.value;
                if obs.time >= latest.time {
                    latest = obs;
                }
            }
            Some(SiteSummary {
                site: site.to_string(),
                parameter: parameter.to_string(),
                observations: rows.len(),
                min,
                max,
                mean: round2(sum / rows.len() as f64),
                most_recent_time: latest.time,
                most_recent_value: latest.value,
                unit: latest.unit.clone(),
            })
        })
        .collect()
}

pub fn summarize_by_site(df: &DataFrame) -> Result<Vec<SiteSummary>, TableError> {
    Ok(summarize_observations(&observations(df)?))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Parameter")]
    parameter: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Obs")]
    observations: usize,
    #[tabled(rename = "Min")]
    min: f64,
    #[tabled(rename = "Max")]
    max: f64,
    #[tabled(rename = "Avg")]
    mean: f64,
    #[tabled(rename = "Recent")]
    recent: f64,
    #[tabled(rename = "Recent Date")]
    recent_date: String,
}

impl From<&SiteSummary> for SummaryRow {
    fn from(summary: &SiteSummary) -> Self {
        Self {
            site: short_site_name(&summary.site).to_string(),
            parameter: summary.parameter.clone(),
            unit: summary.unit.clone().unwrap_or_default(),
            observations: summary.observations,
            min: round2(summary.min),
            max: round2(summary.max),
            mean: summary.mean,
            recent: round2(summary.most_recent_value),
            recent_date: summary
                .most_recent_time
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Drops a trailing two-letter state code (`"RIO GRANDE AT OTOWI BRIDGE, NM"`)
/// for display.
fn short_site_name(site: &str) -> &str {
    match site.rsplit_once(", ") {
        Some((name, state))
            if !name.is_empty()
                && state.len() == 2
                && state.bytes().all(|b| b.is_ascii_uppercase()) =>
        {
            name
        }
        _ => site,
    }
}

/// Renders the summary table framed by banners and followed by totals.
pub fn render_summary(summaries: &[SiteSummary]) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let rows: Vec<SummaryRow> = summaries.iter().map(SummaryRow::from).collect();
    let table = if rows.is_empty() {
        "(no rows)".to_string()
    } else {
        Table::new(rows).with(Style::markdown()).to_string()
    };

    let sites: BTreeSet<&str> = summaries.iter().map(|s| s.site.as_str()).collect();
    let parameters: BTreeSet<&str> = summaries.iter().map(|s| s.parameter.as_str()).collect();
    let total: usize = summaries.iter().map(|s| s.observations).sum();

    format!(
        "\n{banner}\n{title:^width$}\n{banner}\n\n{table}\n\n{banner}\n\
         Total Sites: {sites} | Total Parameters: {parameters} | Total Observations: {total}\n\
         {banner}\n",
        title = "SUMMARY BY SITE AND PARAMETER",
        width = BANNER_WIDTH,
        sites = sites.len(),
        parameters = parameters.len(),
    )
}

pub fn print_summary(summaries: &[SiteSummary]) {
    println!("{}", render_summary(summaries));
}
