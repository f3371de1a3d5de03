//! Parquet writing for imported record sets
//!
//! Converts a [`RecordSet`] into a polars [`DataFrame`] and writes it to a
//! Parquet file. Timestamps are stored as UTC instants in milliseconds,
//! tagged with the column's display zone.

use crate::config::CompressionAlgorithm;
use crate::error::{RdbError, Result};
use crate::models::{ColumnValues, RecordSet};

use polars::prelude::{
    Column as PolarsColumn, DataFrame, DataType, IntoColumn, NamedFrom,
    ParquetWriter as PolarsParquetWriter, Series, TimeUnit, TimeZone,
};
use std::path::Path;
use tracing::debug;

/// Build a DataFrame with one polars column per record set column
pub fn to_dataframe(records: &RecordSet) -> Result<DataFrame> {
    let mut columns: Vec<PolarsColumn> = Vec::with_capacity(records.width());

    for column in records.table().columns() {
        let name = column.name();
        let converted = match column.values() {
            ColumnValues::Text(values) => PolarsColumn::new(name.into(), values.as_slice()),
            ColumnValues::Numeric(values) => PolarsColumn::new(name.into(), values.as_slice()),
            ColumnValues::Timestamp { values, tz } => {
                let millis: Vec<Option<i64>> = values
                    .iter()
                    .map(|v| v.map(|instant| instant.timestamp_millis()))
                    .collect();
                let zone = TimeZone::opt_try_new(Some(tz.name()))?;
                Series::new(name.into(), millis)
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, zone))?
                    .into_column()
            }
        };
        columns.push(converted);
    }

    Ok(DataFrame::new(columns)?)
}

/// Write a record set to `path`, returning the number of rows written
pub fn write_parquet(
    records: &RecordSet,
    path: &Path,
    compression: CompressionAlgorithm,
) -> Result<usize> {
    let mut df = to_dataframe(records)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    PolarsParquetWriter::new(file)
        .with_compression(compression.to_polars_compression())
        .finish(&mut df)
        .map_err(|e| RdbError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to write parquet: {}", e),
        })?;

    debug!(
        "Wrote {} rows x {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df.height())
}
