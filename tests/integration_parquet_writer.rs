//! Integration tests for Parquet output
//!
//! These tests import realistic RDB1 documents, write them with the Parquet
//! writer and read the files back with polars to check types and values.

use polars::prelude::{DataType, ParquetReader, SerReader, TimeUnit, TimeZone};
use rdb_processor::{CompressionAlgorithm, ParseConfig, import_rdb1, write_parquet};
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

const DV_DOC: &str = "# Daily values
agency_cd\tsite_no\tdatetime\ttz_cd\tflow_va\tflow_cd
5s\t15s\t20d\t6s\t14n\t10s
USGS\t01646500\t2020-01-01 00:00\tEST\t12.5\tA
USGS\t01646500\t2020-01-01 00:15\tEST\t13.1\tA
USGS\t01646500\t2020-01-01 00:30\tEST\t\tP
";

fn read_back(path: &Path) -> polars::prelude::DataFrame {
    ParquetReader::new(File::open(path).unwrap()).finish().unwrap()
}

#[test]
fn test_write_and_read_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("01646500.parquet");

    let records = import_rdb1(DV_DOC, &ParseConfig::default()).unwrap();
    let rows = write_parquet(&records, &path, CompressionAlgorithm::Snappy).unwrap();
    assert_eq!(rows, 3);

    let df = read_back(&path);
    assert_eq!(df.height(), 3);
    assert_eq!(
        df.get_column_names_str(),
        vec!["agency_cd", "site_no", "datetime", "tz_cd_reported", "tz_cd", "flow_va", "flow_cd"]
    );
    assert_eq!(df.column("flow_va").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("flow_va").unwrap().null_count(), 1);
    assert_eq!(
        df.column("datetime").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Milliseconds, Some(TimeZone::UTC))
    );

    // 00:00 EST is 05:00 UTC
    let millis = df
        .column("datetime")
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap();
    let first = millis.i64().unwrap().get(0);
    assert_eq!(first, Some(1_577_854_800_000));
}

#[test]
fn test_raw_records_are_all_strings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.parquet");

    let records = import_rdb1(DV_DOC, &ParseConfig::raw()).unwrap();
    write_parquet(&records, &path, CompressionAlgorithm::Uncompressed).unwrap();

    let df = read_back(&path);
    for column in df.get_columns() {
        assert_eq!(column.dtype(), &DataType::String);
    }
}

#[test]
fn test_each_compression_writes() {
    let temp_dir = TempDir::new().unwrap();
    let records = import_rdb1(DV_DOC, &ParseConfig::default()).unwrap();

    for (name, compression) in [
        ("snappy", CompressionAlgorithm::Snappy),
        ("zstd", CompressionAlgorithm::Zstd),
        ("lz4", CompressionAlgorithm::Lz4),
        ("none", CompressionAlgorithm::Uncompressed),
    ] {
        let path = temp_dir.path().join(format!("{name}.parquet"));
        write_parquet(&records, &path, compression).unwrap();
        assert_eq!(read_back(&path).height(), 3);
    }
}

#[test]
fn test_output_zone_survives_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("eastern.parquet");

    let config = ParseConfig::default().with_tz("America/New_York");
    let records = import_rdb1(DV_DOC, &config).unwrap();
    write_parquet(&records, &path, CompressionAlgorithm::Snappy).unwrap();

    let df = read_back(&path);
    let expected = TimeZone::opt_try_new(Some("America/New_York")).unwrap();
    assert_eq!(
        df.column("datetime").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Milliseconds, expected)
    );

    // Instants are unchanged by the display zone
    let millis = df.column("datetime").unwrap().cast(&DataType::Int64).unwrap();
    assert_eq!(millis.i64().unwrap().get(0), Some(1_577_854_800_000));
}
