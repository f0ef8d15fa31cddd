//! Tabular half of the pipeline: loading cached collections into polars frames,
//! joining them, cleaning them and exporting them as CSV.

pub mod cleaner;
pub mod error;
pub mod export;
pub mod joiner;
pub mod loader;

use error::TableError;
use polars::prelude::*;

/// Temporary column used to restore input row order after joins.
pub(crate) const ROW_INDEX: &str = "__row_index";

pub(crate) fn require_column(
    df: &DataFrame,
    table: &'static str,
    column: &str,
) -> Result<(), TableError> {
    if df.get_column_index(column).is_some() {
        Ok(())
    } else {
        Err(TableError::MissingColumn {
            table,
            column: column.to_string(),
        })
    }
}

/// Adds every column in `names` that `df` lacks as an all-null string column.
pub(crate) fn with_null_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame, TableError> {
    let mut df = df.clone();
    for name in names {
        if df.get_column_index(name).is_none() {
            let nulls = Series::full_null((*name).into(), df.height(), &DataType::String);
            df.with_column(nulls)?;
        }
    }
    Ok(df)
}

/// Drops helper columns that may or may not have survived a join.
pub(crate) fn drop_if_present(mut df: DataFrame, names: &[&str]) -> Result<DataFrame, TableError> {
    for name in names {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
        }
    }
    Ok(df)
}
