//! Timestamp reconstruction from split date and time columns.
//!
//! RDB1 tables carry dates and times in separate text columns (`<base>_dt`,
//! `<base>_tm`) or in the legacy `DATE`/`TIME`/`TZCD` layout. This module
//! merges them into timestamp columns and hands them to the
//! [`TimezoneNormalizer`] along with the matching timezone code column.
//!
//! Steps run in a fixed order:
//! 1. date/time pairs, normalized by their own code column (the sample
//!    start and end pairs share `sample_start_time_datum_cd`);
//! 2. the shared `tz_cd` column, for timestamps not yet normalized;
//! 3. the legacy `DATE` column on its own;
//! 4. the legacy `DATE` + `TIME` + `TZCD` merge;
//! 5. renaming the sample start timestamp.

use crate::constants::{LEGACY_DATE_FORMATS, LEGACY_TIME_FORMATS};
use crate::conventions::NamingConventions;
use crate::error::Result;
use crate::models::{Column, ColumnKind, ColumnValues, Diagnostic, Table};
use crate::reader::parse_datetime;
use crate::timezone::TimezoneNormalizer;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Merge date/time columns into timestamps and normalize their timezones
pub fn reconstruct(
    table: &mut Table,
    conventions: &NamingConventions,
    normalizer: &TimezoneNormalizer,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    let names: Vec<String> = table.column_names().into_iter().map(String::from).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let bases: Vec<String> = conventions
        .pair_candidates(&name_refs)
        .into_iter()
        .map(String::from)
        .collect();

    let sample = conventions.sample;
    let sample_codes = shared_sample_codes(table, conventions, &bases);

    let mut normalized: HashSet<String> = HashSet::new();
    for base in &bases {
        let Some(merged) = merge_pair(table, conventions, base, diagnostics)? else {
            continue;
        };

        let mut scratch = None;
        let tz_column = match &sample_codes {
            Some(_) if base == sample.start_base => Some(sample.shared_tz_column.to_string()),
            Some(codes) if base == sample.end_base && !table.contains(sample.end_tz_column) => {
                table.push_column(Column::text(sample.end_tz_column, codes.clone()))?;
                scratch = Some(sample.end_tz_column);
                Some(sample.end_tz_column.to_string())
            }
            _ => conventions
                .pair_tz_columns(base)
                .into_iter()
                .find(|name| table.contains(name)),
        };

        if let Some(tz_column) = tz_column {
            let kept =
                normalizer.normalize(table, &tz_column, &[merged.clone()], false, diagnostics)?;
            normalized.extend(kept);
            // A pair normalized away to nothing still counts as handled
            normalized.insert(merged);
        }
        if let Some(scratch) = scratch {
            table.remove_column(scratch);
        }
    }

    let shared = conventions.shared_tz_column;
    if table.contains(shared) {
        let targets: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.kind() == ColumnKind::Timestamp && !normalized.contains(c.name()))
            .map(|c| c.name().to_string())
            .collect();
        normalizer.normalize(table, shared, &targets, false, diagnostics)?;
    }

    let legacy = conventions.legacy;
    let raw_dates = table
        .column(legacy.date)
        .map(|c| (0..table.height()).map(|row| c.cell_text(row)).collect::<Vec<_>>());

    if let Some(raw_dates) = &raw_dates {
        convert_legacy_date(table, legacy.date, raw_dates, diagnostics)?;

        if table.contains(legacy.time) && table.contains(legacy.tz) {
            if merge_legacy(table, conventions, raw_dates, diagnostics)? {
                let merged = legacy.merged.to_string();
                normalizer.normalize(table, legacy.tz, &[merged], true, diagnostics)?;
            }
        }
    }

    let sample_merged = conventions.datetime_column(sample.start_base);
    if table.rename_column(&sample_merged, sample.start_rename) {
        debug!("Renamed '{}' to '{}'", sample_merged, sample.start_rename);
    }

    relabel_timestamps(table, normalizer.output_tz(), &[legacy.date]);
    Ok(())
}

/// Raw codes of the datum column shared by the sample start and end pairs,
/// captured before the start pair rewrites them.
fn shared_sample_codes(
    table: &Table,
    conventions: &NamingConventions,
    bases: &[String],
) -> Option<Vec<Option<String>>> {
    let sample = conventions.sample;
    let has_pairs = bases.iter().any(|b| b == sample.start_base)
        && bases.iter().any(|b| b == sample.end_base);
    if !has_pairs {
        return None;
    }
    let shared = table.column(sample.shared_tz_column)?;
    debug!("Sample pairs share '{}'", sample.shared_tz_column);
    Some((0..table.height()).map(|row| shared.cell_text(row)).collect())
}

/// Append `<base>_dateTime` built from the pasted date and time text.
///
/// Returns the new column name, or `None` when no row could be parsed.
fn merge_pair(
    table: &mut Table,
    conventions: &NamingConventions,
    base: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<String>> {
    let (Some(dates), Some(times)) = (
        table.column(&conventions.date_column(base)),
        table.column(&conventions.time_column(base)),
    ) else {
        return Ok(None);
    };

    let values: Vec<Option<DateTime<Utc>>> = (0..table.height())
        .map(|row| match (dates.cell_text(row), times.cell_text(row)) {
            (Some(date), Some(time)) => parse_datetime(&format!("{} {}", date.trim(), time.trim())),
            _ => None,
        })
        .collect();

    if values.iter().all(Option::is_none) {
        warn!("No parseable timestamps for pair '{}', column not created", base);
        diagnostics.push(Diagnostic::UnparseableTimestampPair {
            base: base.to_string(),
        });
        return Ok(None);
    }

    let name = conventions.datetime_column(base);
    if let Some(existing) = table.remove_column(&name) {
        debug!("Replacing existing column '{}'", existing.name());
    }
    table.push_column(Column::timestamp(name.clone(), values, Tz::UTC))?;
    debug!("Created '{}'", name);
    Ok(Some(name))
}

/// Replace the legacy date column with midnight-UTC timestamps; the column
/// keeps the UTC zone so its calendar day never moves
fn convert_legacy_date(
    table: &mut Table,
    name: &str,
    raw_dates: &[Option<String>],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    if raw_dates.iter().all(Option::is_none) {
        return Ok(());
    }

    let values: Vec<Option<DateTime<Utc>>> = raw_dates
        .iter()
        .map(|cell| {
            cell.as_deref()
                .and_then(parse_legacy_date)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })
        .collect();

    if values.iter().all(Option::is_none) {
        warn!("Column '{}' holds no recognisable dates, kept as text", name);
        diagnostics.push(Diagnostic::UnparseableTimestampPair {
            base: name.to_string(),
        });
        return Ok(());
    }

    replace_column(table, Column::timestamp(name, values, Tz::UTC))
}

/// Append the merged legacy timestamp; false when nothing parsed
fn merge_legacy(
    table: &mut Table,
    conventions: &NamingConventions,
    raw_dates: &[Option<String>],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<bool> {
    let legacy = conventions.legacy;
    let Some(times) = table.column(legacy.time) else {
        return Ok(false);
    };

    let values: Vec<Option<DateTime<Utc>>> = raw_dates
        .iter()
        .enumerate()
        .map(|(row, date)| {
            let date = date.as_deref().and_then(parse_legacy_date)?;
            let time = times.cell_text(row).as_deref().and_then(parse_legacy_time)?;
            Some(NaiveDateTime::new(date, time).and_utc())
        })
        .collect();

    if values.iter().all(Option::is_none) {
        warn!(
            "No parseable '{}' + '{}' combinations, '{}' not created",
            legacy.date, legacy.time, legacy.merged
        );
        diagnostics.push(Diagnostic::UnparseableTimestampPair {
            base: legacy.merged.to_string(),
        });
        return Ok(false);
    }

    table.remove_column(legacy.merged);
    table.push_column(Column::timestamp(legacy.merged, values, Tz::UTC))?;
    Ok(true)
}

fn parse_legacy_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    LEGACY_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
}

fn parse_legacy_time(cell: &str) -> Option<NaiveTime> {
    let cell = cell.trim();
    LEGACY_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(cell, format).ok())
}

/// Swap a column for one of the same name, keeping its position
fn replace_column(table: &mut Table, column: Column) -> Result<()> {
    match table.position(column.name()) {
        Some(index) => {
            let name = column.name().to_string();
            table.remove_column(&name);
            table.insert_column(index, column)
        }
        None => table.push_column(column),
    }
}

/// Timestamps without a code column are taken as UTC and displayed in the
/// requested zone. Date-only columns in `keep_utc` are left alone.
fn relabel_timestamps(table: &mut Table, output_tz: Tz, keep_utc: &[&str]) {
    for column in table.columns_mut() {
        if keep_utc.contains(&column.name()) {
            continue;
        }
        if let ColumnValues::Timestamp { tz, .. } = column.values_mut() {
            *tz = output_tz;
        }
    }
}
