use crate::tables::error::TableError;
use crate::tables::{drop_if_present, require_column, with_null_columns, ROW_INDEX};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use polars::prelude::*;

/// Columns of the cleaned dataset, in output order.
pub const FINAL_COLUMNS: [&str; 16] = [
    "id",
    "monitoring_location_id",
    "monitoring_location_name",
    "site_type",
    "time",
    "last_modified",
    "parameter_code",
    "parameter_name",
    "value",
    "unit_of_measure",
    "statistic_id",
    "statistic_description",
    "approval_status",
    "agency_name",
    "state_name",
    "county_name",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the timestamp shapes the water-data API and our own CSV exports produce.
///
/// Offset-bearing input is converted to UTC, naive input is taken as UTC.
/// Returns `None` for anything else.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Prepares the joined table for analysis.
///
/// Parses timestamps, coerces `value` to floats and drops rows without one,
/// removes `qualifier`, resolves parameter and statistic codes to readable
/// names and projects to [`FINAL_COLUMNS`]. Running it on its own output
/// yields the same rows and values.
pub fn clean_and_transform(
    joined: &DataFrame,
    parameter_codes: &DataFrame,
    statistic_codes: &DataFrame,
) -> Result<DataFrame, TableError> {
    let mut df = with_null_columns(
        joined,
        &["time", "last_modified", "value", "parameter_code", "statistic_id"],
    )?;
    let rows_in = df.height();

    let time = timestamp_column(df.column("time")?, None)?;
    df.with_column(time)?;
    let last_modified = timestamp_column(df.column("last_modified")?, Some("UTC"))?;
    df.with_column(last_modified)?;
    let value = value_column(df.column("value")?)?;
    df.with_column(value)?;

    let df = drop_if_present(
        df,
        &["qualifier", "parameter_name", "statistic_description"],
    )?;

    let lazy = df
        .lazy()
        .filter(col("value").is_not_null())
        .with_row_index(ROW_INDEX, None);
    let lazy = attach_lookup(
        lazy,
        parameter_codes,
        "parameter codes",
        "parameter_code",
        "parameter_name",
    )?;
    let lazy = attach_lookup(
        lazy,
        statistic_codes,
        "statistic codes",
        "statistic_id",
        "statistic_description",
    )?;
    let enriched = lazy
        .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
        .collect()?;

    let complete = with_null_columns(&enriched, &FINAL_COLUMNS)?;
    let cleaned = complete.select(FINAL_COLUMNS)?;

    info!(
        "Cleaned dataset: {} of {} rows kept",
        cleaned.height(),
        rows_in
    );
    Ok(cleaned)
}

/// Re-reads a timestamp column of any shape as `Datetime(ms, tz)`.
pub(crate) fn timestamp_column(column: &Column, time_zone: Option<&str>) -> Result<Column, TableError> {
    let millis: Vec<Option<i64>> = match column.dtype() {
        DataType::Datetime(unit, _) => {
            let per_milli = match unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            let raw = column.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .map(|v| v.map(|v| v.div_euclid(per_milli)))
                .collect()
        }
        _ => {
            let text = column.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp).map(|ts| ts.timestamp_millis()))
                .collect()
        }
    };

    let target = DataType::Datetime(TimeUnit::Milliseconds, TimeZone::opt_try_new(time_zone)?);
    Ok(Column::new(column.name().clone(), millis).cast(&target)?)
}

fn value_column(column: &Column) -> Result<Column, TableError> {
    let values: Vec<Option<f64>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        _ => column.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
    };
    let values: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(Column::new(column.name().clone(), values))
}

/// Left-joins `label` from a code lookup table, keyed by its `id`.
fn attach_lookup(
    frame: LazyFrame,
    lookup: &DataFrame,
    table: &'static str,
    code_column: &str,
    label: &str,
) -> Result<LazyFrame, TableError> {
    require_column(lookup, table, "id")?;
    require_column(lookup, table, label)?;
    let key = format!("__{label}_code");

    let labels = lookup
        .clone()
        .lazy()
        .select([
            col("id").cast(DataType::String).alias(key.as_str()),
            col(label),
        ])
        .group_by_stable([col(key.as_str())])
        .agg([col(label).first()]);

    Ok(frame
        .with_column(col(code_column).cast(DataType::String))
        .join(
            labels,
            [col(code_column)],
            [col(key.as_str())],
            JoinArgs::new(JoinType::Left),
        ))
}
