//! Timezone code translation and timestamp normalization.
//!
//! RDB1 documents report local times next to a short code such as `EST` or
//! `PDT`. The static offset table translates those codes to hours behind UTC;
//! [`TimezoneNormalizer`] uses it to shift naive timestamps to UTC and then
//! labels them with the zone the caller asked for.

use crate::conventions::NamingConventions;
use crate::error::Result;
use crate::models::{Column, ColumnValues, Diagnostic, Table};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// One row of the offset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneOffsetEntry {
    pub code: &'static str,
    /// Hours to add to a local time to obtain UTC
    pub hours: i64,
}

const fn entry(code: &'static str, hours: i64) -> TimezoneOffsetEntry {
    TimezoneOffsetEntry { code, hours }
}

/// Legacy US timezone abbreviations used by the hydrologic services
pub const TIMEZONE_OFFSETS: &[TimezoneOffsetEntry] = &[
    entry("EST", 5),
    entry("EDT", 4),
    entry("CST", 6),
    entry("CDT", 5),
    entry("MST", 7),
    entry("MDT", 6),
    entry("PST", 8),
    entry("PDT", 7),
    entry("AKST", 9),
    entry("AKDT", 8),
    entry("HAST", 10),
    entry("HST", 10),
    entry("AST", 4),
    entry("ADT", 3),
    entry("UTC", 0),
    entry("GMT", 0),
    entry("", 0),
];

/// Look up the UTC offset for a code. Missing codes count as zero offset;
/// unrecognised codes return `None`.
pub fn offset_hours(code: Option<&str>) -> Option<i64> {
    let Some(code) = code else {
        return Some(0);
    };
    let code = code.trim();
    TIMEZONE_OFFSETS
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.hours)
}

/// Validate a requested output timezone; an empty name means UTC
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    name.parse::<Tz>()
        .map_err(|_| crate::error::RdbError::InvalidTimezone {
            name: name.to_string(),
        })
}

/// Shifts timestamp columns by a timezone-code column and re-labels them in
/// the caller's output zone.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneNormalizer {
    output_tz: Tz,
    conventions: NamingConventions,
}

impl TimezoneNormalizer {
    pub fn new(output_tz: Tz, conventions: NamingConventions) -> Self {
        Self {
            output_tz,
            conventions,
        }
    }

    pub fn output_tz(&self) -> Tz {
        self.output_tz
    }

    /// Normalize `targets` using the codes in `tz_column`.
    ///
    /// Returns the names of target columns still present afterwards; targets
    /// whose values are all missing are dropped. With `flip` the code column
    /// and its `_reported` copy exchange positions.
    pub fn normalize(
        &self,
        table: &mut Table,
        tz_column: &str,
        targets: &[String],
        flip: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<String>> {
        let Some(code_column) = table.column(tz_column) else {
            return Ok(targets.to_vec());
        };

        let codes: Vec<Option<String>> = (0..table.height())
            .map(|row| code_column.cell_text(row))
            .collect();

        let mut unknown: Vec<String> = Vec::new();
        let label = self.output_tz.name();
        let offsets: Vec<i64> = codes
            .iter()
            .map(|code| match offset_hours(code.as_deref()) {
                Some(hours) => hours,
                // Already expressed in the output zone
                None if code.as_deref().map(str::trim) == Some(label) => 0,
                None => {
                    let code = code.clone().unwrap_or_default();
                    if !unknown.contains(&code) {
                        unknown.push(code);
                    }
                    0
                }
            })
            .collect();

        if !unknown.is_empty() {
            warn!(
                "Unknown timezone codes in '{}' treated as zero offset: {:?}",
                tz_column, unknown
            );
            diagnostics.push(Diagnostic::UnknownTimezoneCode {
                column: tz_column.to_string(),
                codes: unknown,
            });
        }

        let reported = self.conventions.reported_column(tz_column);
        if !table.contains(&reported) {
            table.push_column(Column::text(reported.clone(), codes.clone()))?;
        }

        let mut present = vec![false; table.height()];
        for name in targets {
            let Some(column) = table.column_mut(name) else {
                continue;
            };
            if let ColumnValues::Timestamp { values, tz } = column.values_mut() {
                shift_values(values, &offsets);
                *tz = self.output_tz;
                for (row, value) in values.iter().enumerate() {
                    present[row] |= value.is_some();
                }
            }
        }

        let label = self.output_tz.name().to_string();
        let updated: Vec<Option<String>> = codes
            .into_iter()
            .zip(&present)
            .map(|(code, has_value)| if *has_value { Some(label.clone()) } else { code })
            .collect();
        if let Some(index) = table.position(tz_column) {
            table.remove_column(tz_column);
            table.insert_column(index, Column::text(tz_column, updated))?;
        }

        if flip {
            if let (Some(a), Some(b)) = (table.position(tz_column), table.position(&reported)) {
                table.swap_columns(a, b);
            }
        }

        let mut kept = Vec::with_capacity(targets.len());
        for name in targets {
            let all_missing = table
                .column(name)
                .map(|c| c.values().all_missing() && table.height() > 0);
            match all_missing {
                Some(true) => {
                    debug!("Dropping '{}': no timestamps left after normalization", name);
                    table.remove_column(name);
                }
                Some(false) => kept.push(name.clone()),
                None => {}
            }
        }

        debug!(
            "Normalized {:?} by '{}' into {}",
            kept,
            tz_column,
            self.output_tz.name()
        );
        Ok(kept)
    }
}

fn shift_values(values: &mut [Option<DateTime<Utc>>], offsets: &[i64]) {
    for (value, hours) in values.iter_mut().zip(offsets) {
        if let Some(instant) = value {
            *instant = *instant + Duration::hours(*hours);
        }
    }
}
