//! Interactive HTML charts comparing two parameters at one site.

pub mod error;

use crate::analysis::summary::{observations, Observation};
use crate::config::ChartSettings;
use crate::utils::ensure_parent_dir;
use chrono::NaiveDateTime;
use error::ChartError;
use log::{info, warn};
use plotlars::{Axis, AxisSide, Legend, Line, Plot, Rgb, ScatterPlot, Shape, Text, TimeSeriesPlot};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const PRIMARY_COLOR: Rgb = Rgb(70, 130, 180);
const SECONDARY_COLOR: Rgb = Rgb(255, 165, 0);

/// Site names, sorted, that have at least one row for each parameter.
pub fn sites_with_both_parameters(
    df: &DataFrame,
    primary: &str,
    secondary: &str,
) -> Result<Vec<String>, ChartError> {
    Ok(sites_having_both(&observations(df)?, primary, secondary))
}

fn sites_having_both(observations: &[Observation], primary: &str, secondary: &str) -> Vec<String> {
    let sites_with = |parameter: &str| -> BTreeSet<&str> {
        observations
            .iter()
            .filter(|o| o.parameter == parameter)
            .map(|o| o.site.as_str())
            .collect()
    };
    sites_with(primary)
        .intersection(&sites_with(secondary))
        .map(|s| s.to_string())
        .collect()
}

/// Renders the dual-axis time series and the scatter chart for the first site
/// that measures both configured parameters. Returns the files written.
///
/// Missing parameters, no qualifying site or no shared timestamps are logged
/// and skipped rather than treated as errors.
pub fn render_charts(df: &DataFrame, settings: &ChartSettings) -> Result<Vec<PathBuf>, ChartError> {
    let Some((primary, secondary)) = &settings.parameters else {
        info!("No chart parameters configured, skipping charts");
        return Ok(Vec::new());
    };
    if primary == secondary {
        warn!("Chart parameters are both '{primary}', skipping charts");
        return Ok(Vec::new());
    }

    let all = observations(df)?;
    let Some(site) = sites_having_both(&all, primary, secondary).into_iter().next() else {
        warn!("No site has data for both '{primary}' and '{secondary}', skipping charts");
        return Ok(Vec::new());
    };
    let site_rows: Vec<&Observation> = all.iter().filter(|o| o.site == site).collect();
    info!("Charting '{primary}' against '{secondary}' for {site}");

    let mut written = Vec::new();

    let daily = dual_axis_frame(&site_rows, primary, secondary)?;
    let dual_axis = TimeSeriesPlot::builder()
        .data(&daily)
        .x("date")
        .y(primary.as_str())
        .additional_series(vec![secondary.as_str()])
        .size(6)
        .colors(vec![PRIMARY_COLOR, SECONDARY_COLOR])
        .lines(vec![Line::Solid, Line::Solid])
        .with_shape(true)
        .shapes(vec![Shape::Circle, Shape::Circle])
        .plot_title(Text::from(format!("{primary} and {secondary} over time - {site}").as_str()).size(18))
        .legend(&Legend::new().x(0.05).y(1.1))
        .x_title("Date")
        .y_title(Text::from(axis_label(&site_rows, primary).as_str()).color(PRIMARY_COLOR))
        .y_title2(Text::from(axis_label(&site_rows, secondary).as_str()).color(SECONDARY_COLOR))
        .y_axis(&Axis::new().value_color(PRIMARY_COLOR))
        .y_axis2(
            &Axis::new()
                .axis_side(AxisSide::Right)
                .value_color(SECONDARY_COLOR)
                .show_grid(false),
        )
        .build();
    write_chart(&dual_axis, &settings.dual_axis_path, settings.open_in_browser)?;
    written.push(settings.dual_axis_path.clone());

    let pairs = scatter_frame(&site_rows, primary, secondary)?;
    if pairs.height() == 0 {
        warn!("'{primary}' and '{secondary}' share no timestamps at {site}, skipping scatter chart");
        return Ok(written);
    }
    let scatter = ScatterPlot::builder()
        .data(&pairs)
        .x(secondary.as_str())
        .y(primary.as_str())
        .size(10)
        .colors(vec![PRIMARY_COLOR])
        .plot_title(Text::from(format!("Relationship between {secondary} and {primary} - {site}").as_str()).size(18))
        .x_title(axis_label(&site_rows, secondary).as_str())
        .y_title(axis_label(&site_rows, primary).as_str())
        .build();
    write_chart(&scatter, &settings.scatter_path, settings.open_in_browser)?;
    written.push(settings.scatter_path.clone());

    Ok(written)
}

fn write_chart(chart: &impl Plot, path: &Path, open_in_browser: bool) -> Result<(), ChartError> {
    ensure_parent_dir(path).map_err(|e| ChartError::DirCreation(path.to_path_buf(), e))?;
    chart.write_html(path.to_string_lossy().into_owned());
    info!("Saved chart to {:?}", path);
    if open_in_browser {
        chart.plot();
    }
    Ok(())
}

fn axis_label(rows: &[&Observation], parameter: &str) -> String {
    let unit = rows
        .iter()
        .find(|o| o.parameter == parameter)
        .and_then(|o| o.unit.as_deref());
    match unit {
        Some(unit) => format!("{parameter} ({unit})"),
        None => parameter.to_string(),
    }
}

/// One row per day with a column for each parameter. A later value on the
/// same day replaces an earlier one; undated rows are left out.
fn dual_axis_frame(
    rows: &[&Observation],
    primary: &str,
    secondary: &str,
) -> Result<DataFrame, ChartError> {
    let mut days: BTreeMap<String, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for obs in rows {
        let Some(time) = obs.time else { continue };
        let day = days.entry(time.format("%Y-%m-%d").to_string()).or_default();
        if obs.parameter == primary {
            day.0 = Some(obs.value);
        } else if obs.parameter == secondary {
            day.1 = Some(obs.value);
        }
    }

    let dates: Vec<&str> = days.keys().map(String::as_str).collect();
    let first: Vec<Option<f64>> = days.values().map(|v| v.0).collect();
    let second: Vec<Option<f64>> = days.values().map(|v| v.1).collect();
    Ok(DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new(primary.into(), first),
        Column::new(secondary.into(), second),
    ])?)
}

/// Every (primary, secondary) pair of values recorded at the same timestamp,
/// ordered by time.
fn scatter_frame(
    rows: &[&Observation],
    primary: &str,
    secondary: &str,
) -> Result<DataFrame, ChartError> {
    let mut by_time: BTreeMap<NaiveDateTime, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for obs in rows {
        let Some(time) = obs.time else { continue };
        let slot = by_time.entry(time).or_default();
        if obs.parameter == primary {
            slot.0.push(obs.value);
        } else if obs.parameter == secondary {
            slot.1.push(obs.value);
        }
    }

    let mut ys = Vec::new();
    let mut xs = Vec::new();
    for (first, second) in by_time.values() {
        for y in first {
            for x in second {
                ys.push(*y);
                xs.push(*x);
            }
        }
    }
    Ok(DataFrame::new(vec![
        Column::new(secondary.into(), xs),
        Column::new(primary.into(), ys),
    ])?)
}
