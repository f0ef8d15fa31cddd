use crate::tables::error::TableError;
use crate::utils::ensure_parent_dir;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Writes `df` as a headed CSV, creating the parent directory when needed.
pub fn save_dataframe(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    ensure_parent_dir(path).map_err(|e| TableError::OutputDir(path.to_path_buf(), e))?;
    let mut file = File::create(path).map_err(|e| TableError::CsvWriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| TableError::CsvWritePolars(path.to_path_buf(), e))?;
    info!("Saved {} rows to {:?}", df.height(), path);
    Ok(())
}
