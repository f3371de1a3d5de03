//! Integration tests for RDB1 import
//!
//! These tests run complete documents through the public importer API and
//! check the typed tables, timezone handling and diagnostics that come back.

use chrono::{TimeZone, Utc};
use rdb_processor::{
    ColumnKind, Diagnostic, DocumentSource, FetchedDocument, ParseConfig, Rdb1Importer,
    RDB1_CONVENTIONS, RdbError, Result, TimezoneNormalizer, import_rdb1,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Instantaneous values for one site, reported in Eastern time
const IV_DOC: &str = "# ---------------------------------- WARNING ----------------------------------------
# Some of the data that you have obtained from this U.S. Geological Survey database
# may not have received Director's approval.
#
agency_cd\tsite_no\tdatetime\ttz_cd\t69928_00060\t69928_00060_cd
5s\t15s\t20d\t6s\t14n\t10s
USGS\t01491000\t2012-09-01 08:00\tEST\t29.4\tA
USGS\t01491000\t2012-09-01 08:15\tEST\t29.0\tA
USGS\t01491000\t2012-09-01 08:30\tEDT\t\tEqp
";

/// Water-quality samples with start/end pairs sharing one datum column
const QW_DOC: &str = "# Water-quality results
agency_cd\tsite_no\tsample_dt\tsample_tm\tsample_end_dt\tsample_end_tm\tsample_start_time_datum_cd\tparm_cd\tresult_va
5s\t15s\t10d\t5d\t10d\t5d\t3s\t5s\t12s
USGS\t01491000\t2013-05-14\t10:30\t2013-05-14\t11:00\tEDT\t00665\t0.05
USGS\t01491000\t2013-06-11\t09:15\t\t\tEDT\t00665\t<0.01
";

/// Peak flow layout with a per-pair timezone code
const PEAK_DOC: &str = "# peaks
agency_cd\tsite_no\tpeak_dt\tpeak_tm\tpeak_tz_cd\tpeak_va
5s\t15s\t10d\t6s\t6s\t8s
USGS\t01594440\t2011-03-11\t06:45\tEST\t12500
USGS\t01594440\t2011-04-17\t\tEST\t9020
";

/// Legacy daily layout
const LEGACY_DOC: &str = "# legacy
DATE\tTIME\tTZCD\tVALUE
8d\t6s\t3s\t12n
20170101\t083000\tEST\t1.5
20170102\t090000\tEST\t2.5
";

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn test_row_count_matches_data_lines() {
    for doc in [IV_DOC, QW_DOC, PEAK_DOC, LEGACY_DOC] {
        let data_lines = doc
            .lines()
            .filter(|line| !line.starts_with('#'))
            .count()
            - 2;
        let records = import_rdb1(doc, &ParseConfig::default()).unwrap();
        assert_eq!(records.height(), data_lines);
        assert!(
            !records
                .diagnostics()
                .iter()
                .any(|d| matches!(d, Diagnostic::RowCountMismatch { .. }))
        );
    }
}

#[test]
fn test_raw_mode_round_trip() {
    let records = import_rdb1(QW_DOC, &ParseConfig::raw()).unwrap();
    let data_lines: Vec<&str> = QW_DOC.lines().skip(3).collect();

    assert!(
        records
            .table()
            .columns()
            .iter()
            .all(|c| c.kind() == ColumnKind::Text)
    );
    for (row, line) in data_lines.iter().enumerate() {
        let cells: Vec<String> = records
            .table()
            .row_cells(row)
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        assert_eq!(cells.join("\t"), *line);
    }
}

#[test]
fn test_est_timestamps_normalized_to_utc() {
    let records = import_rdb1(IV_DOC, &ParseConfig::default()).unwrap();

    let stamps = records.column("datetime").unwrap().as_timestamps().unwrap();
    assert_eq!(stamps[0], Some(utc(2012, 9, 1, 13, 0)));
    assert_eq!(stamps[2], Some(utc(2012, 9, 1, 12, 30)));

    let codes = records.column("tz_cd").unwrap().as_text().unwrap();
    assert!(codes.iter().all(|c| c.as_deref() == Some("UTC")));
    let reported = records.column("tz_cd_reported").unwrap().as_text().unwrap();
    assert_eq!(reported[2].as_deref(), Some("EDT"));

    let names = records.column_names();
    let reported_at = names.iter().position(|n| *n == "tz_cd_reported").unwrap();
    assert_eq!(names[reported_at + 1], "tz_cd");
}

#[test]
fn test_output_timezone_labels() {
    let config = ParseConfig::default().with_tz("America/New_York");
    let records = import_rdb1(IV_DOC, &config).unwrap();

    let column = records.column("datetime").unwrap();
    assert_eq!(column.timezone(), Some(chrono_tz::America::New_York));
    assert_eq!(column.cell_text(0).as_deref(), Some("2012-09-01 09:00:00"));
    assert_eq!(
        records.column("tz_cd").unwrap().as_text().unwrap()[0].as_deref(),
        Some("America/New_York")
    );
    assert_eq!(records.metadata().output_tz, chrono_tz::America::New_York);
}

#[test]
fn test_normalization_is_idempotent() {
    let config = ParseConfig::default().with_tz("America/Chicago");
    let (mut table, _) = import_rdb1(IV_DOC, &config).unwrap().into_parts();
    let before = table.clone();

    let normalizer = TimezoneNormalizer::new(chrono_tz::America::Chicago, RDB1_CONVENTIONS);
    let mut diagnostics = Vec::new();
    normalizer
        .normalize(
            &mut table,
            "tz_cd",
            &["datetime".to_string()],
            false,
            &mut diagnostics,
        )
        .unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(
        table.column("datetime").unwrap().as_timestamps(),
        before.column("datetime").unwrap().as_timestamps()
    );
    assert_eq!(
        table.column("tz_cd_reported").unwrap().as_text(),
        before.column("tz_cd_reported").unwrap().as_text()
    );
}

#[test]
fn test_names_normalized_and_values_typed() {
    let records = import_rdb1(IV_DOC, &ParseConfig::default()).unwrap();

    assert!(records.column("X69928_00060").is_some());
    let flow = records.column("X69928_00060").unwrap().as_numeric().unwrap();
    assert_eq!(flow, &[Some(29.4), Some(29.0), None]);
    assert_eq!(records.metadata().comment.len(), 4);
}

#[test]
fn test_qualified_results_stay_text() {
    let records = import_rdb1(QW_DOC, &ParseConfig::default()).unwrap();

    let result = records.column("result_va").unwrap();
    assert_eq!(result.kind(), ColumnKind::Text);
    assert_eq!(result.as_text().unwrap()[1].as_deref(), Some("<0.01"));
    assert!(records.diagnostics().iter().any(|d| matches!(
        d,
        Diagnostic::NumericCoercionFailure { column, failed: 1, .. } if column == "result_va"
    )));
}

#[test]
fn test_sample_start_and_end() {
    let records = import_rdb1(QW_DOC, &ParseConfig::default()).unwrap();

    assert_eq!(
        records.column_names(),
        vec![
            "agency_cd",
            "site_no",
            "sample_dt",
            "sample_tm",
            "sample_end_dt",
            "sample_end_tm",
            "sample_start_time_datum_cd",
            "parm_cd",
            "result_va",
            "startDateTime",
            "sample_start_time_datum_cd_reported",
            "sample_end_dateTime",
            "sample_end_time_datum_cd_reported",
        ]
    );

    let start = records.column("startDateTime").unwrap().as_timestamps().unwrap();
    assert_eq!(start[0], Some(utc(2013, 5, 14, 14, 30)));
    assert_eq!(start[1], Some(utc(2013, 6, 11, 13, 15)));

    let end = records.column("sample_end_dateTime").unwrap().as_timestamps().unwrap();
    assert_eq!(end[0], Some(utc(2013, 5, 14, 15, 0)));
    assert_eq!(end[1], None);

    let codes = records.column("sample_start_time_datum_cd").unwrap().as_text().unwrap();
    assert_eq!(codes[0].as_deref(), Some("UTC"));
    assert_eq!(codes[1].as_deref(), Some("UTC"));
    for reported in ["sample_start_time_datum_cd_reported", "sample_end_time_datum_cd_reported"] {
        let codes = records.column(reported).unwrap().as_text().unwrap();
        assert_eq!(codes[0].as_deref(), Some("EDT"));
        assert_eq!(codes[1].as_deref(), Some("EDT"));
    }
}

#[test]
fn test_per_pair_code_and_missing_time() {
    let records = import_rdb1(PEAK_DOC, &ParseConfig::default()).unwrap();

    let peaks = records.column("peak_dateTime").unwrap().as_timestamps().unwrap();
    assert_eq!(peaks[0], Some(utc(2011, 3, 11, 11, 45)));
    assert_eq!(peaks[1], None);
    assert_eq!(
        records.column("peak_va").unwrap().as_numeric().unwrap(),
        &[Some(12500.0), Some(9020.0)]
    );
    assert_eq!(
        records.column_names(),
        vec![
            "agency_cd",
            "site_no",
            "peak_dt",
            "peak_tm",
            "peak_tz_cd",
            "peak_va",
            "peak_dateTime",
            "peak_tz_cd_reported",
        ]
    );

    // Code cells only change where the pair produced a timestamp
    let codes = records.column("peak_tz_cd").unwrap().as_text().unwrap();
    assert_eq!(codes[0].as_deref(), Some("UTC"));
    assert_eq!(codes[1].as_deref(), Some("EST"));
}

#[test]
fn test_legacy_date_ignores_output_zone() {
    let config = ParseConfig::default().with_tz("America/New_York");
    let records = import_rdb1("DATE\tVALUE\n8d\t12n\n20200101\t1.5\n", &config).unwrap();

    let date = records.column("DATE").unwrap();
    assert_eq!(date.kind(), ColumnKind::Timestamp);
    assert_eq!(date.cell_text(0).as_deref(), Some("2020-01-01 00:00:00"));
}

#[test]
fn test_pair_with_no_times_creates_nothing() {
    let doc = "foo_dt\tfoo_tm\n10d\t5s\n2020-01-01\t\n2020-01-02\t\n";
    let records = import_rdb1(doc, &ParseConfig::default()).unwrap();

    assert!(records.column("foo_dateTime").is_none());
    assert_eq!(records.column_names(), vec!["foo_dt", "foo_tm"]);
}

#[test]
fn test_legacy_layout() {
    let records = import_rdb1(LEGACY_DOC, &ParseConfig::default()).unwrap();

    let merged = records.column("DATETIME").unwrap().as_timestamps().unwrap();
    assert_eq!(merged[0], Some(utc(2017, 1, 1, 13, 30)));
    assert_eq!(
        records.column("DATE").unwrap().as_timestamps().unwrap()[0],
        Some(utc(2017, 1, 1, 0, 0))
    );

    let names = records.column_names();
    assert_eq!(
        names,
        vec!["DATE", "TIME", "TZCD_reported", "VALUE", "DATETIME", "TZCD"]
    );
}

#[test]
fn test_no_datetime_option() {
    let config = ParseConfig::default().with_as_date_time(false);
    let records = import_rdb1(PEAK_DOC, &config).unwrap();

    assert!(records.column("peak_dateTime").is_none());
    assert_eq!(records.column("peak_dt").unwrap().kind(), ColumnKind::Text);
    assert_eq!(records.column("peak_va").unwrap().kind(), ColumnKind::Numeric);
}

#[test]
fn test_unknown_timezone_code_passes_through() {
    let doc = "datetime\ttz_cd\n20d\t6s\n2020-01-01 00:00\tXST\n";
    let records = import_rdb1(doc, &ParseConfig::default()).unwrap();

    assert_eq!(
        records.column("datetime").unwrap().as_timestamps().unwrap()[0],
        Some(utc(2020, 1, 1, 0, 0))
    );
    assert!(records.diagnostics().contains(&Diagnostic::UnknownTimezoneCode {
        column: "tz_cd".to_string(),
        codes: vec!["XST".to_string()],
    }));
}

#[test]
fn test_stray_quote_recovered_by_relaxed_parse() {
    let doc = "site_no\tstation_nm\n15s\t50s\n01\t\"Big Creek\n02\tLittle Creek\n";
    let records = import_rdb1(doc, &ParseConfig::default()).unwrap();

    assert_eq!(records.height(), 2);
    assert_eq!(
        records.column("station_nm").unwrap().as_text().unwrap()[0].as_deref(),
        Some("\"Big Creek")
    );
}

#[test]
fn test_header_only_document() {
    let records = import_rdb1("# nothing\nagency_cd\tsite_no\n5s\t15s\n", &ParseConfig::default())
        .unwrap();
    assert_eq!(records.height(), 0);
    assert_eq!(records.column_names(), vec!["agency_cd", "site_no"]);
}

#[test]
fn test_malformed_header_is_fatal() {
    match import_rdb1("a\tb\tc\n5s\t5s\n", &ParseConfig::default()) {
        Err(RdbError::MalformedHeader { reason }) => {
            assert!(reason.contains("3 column names but 2 type tokens"))
        }
        other => panic!("Expected MalformedHeader error, got {other:?}"),
    }
}

#[test]
fn test_import_path_and_latin1() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"# Caf\xe9 Creek\nsite_no\tstation_nm\n15s\t50s\n01\tCaf\xe9\n")
        .unwrap();

    let importer = Rdb1Importer::new(ParseConfig::default()).unwrap();
    let records = importer.import(file.path().to_str().unwrap()).unwrap();

    assert_eq!(
        records.column("station_nm").unwrap().as_text().unwrap()[0].as_deref(),
        Some("Caf\u{e9}")
    );
    assert!(records.diagnostics().contains(&Diagnostic::NonUtf8Input));
    assert!(records.metadata().source_identifier.is_none());
}

struct StaticSource(&'static str);

impl DocumentSource for StaticSource {
    fn fetch(&self, _location: &str) -> Result<FetchedDocument> {
        Ok(FetchedDocument::new(self.0).with_header("x-request-id", "abc123"))
    }
}

#[test]
fn test_remote_fetch_through_source() {
    let importer = Rdb1Importer::new(ParseConfig::default())
        .unwrap()
        .with_source(StaticSource(PEAK_DOC));

    let records = importer
        .import("https://nwis.waterdata.example/peak?site_no=01594440")
        .unwrap();

    assert_eq!(records.height(), 2);
    let metadata = records.metadata();
    assert_eq!(
        metadata.source_identifier.as_deref(),
        Some("https://nwis.waterdata.example/peak?site_no=01594440")
    );
    assert_eq!(
        metadata.header_info.as_ref().unwrap().get("x-request-id").map(String::as_str),
        Some("abc123")
    );
}
