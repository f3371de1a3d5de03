//! Tab-delimited data section reader.
//!
//! Turns the data lines of a [`SplitDocument`] into a [`Table`]. Typed reads
//! use a two-attempt strategy: a strict attempt that honours quoting and, if
//! that loses rows, a relaxed attempt that treats quote characters as plain
//! text. The acceptance rule is fixed by [`QuoteStrategy::accept`].

use crate::constants::{FIELD_DELIMITER, PAIR_DATETIME_FORMATS, QUOTE_CHAR, STRING_TYPE_SUFFIX};
use crate::conventions::NamingConventions;
use crate::error::Result;
use crate::header::{ColumnSpec, SplitDocument};
use crate::models::{Column, Diagnostic, Table};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

/// How cells are turned into columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Every column kept as text, quotes literal
    Raw,
    /// Numeric and date-time inference per column
    Typed,
}

/// Quote handling of one parse attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteHandling {
    Strict,
    Relaxed,
}

/// Cells produced by one parse attempt
#[derive(Debug, Clone)]
pub struct ParseAttempt {
    pub quoting: QuoteHandling,
    pub rows: Vec<Vec<Option<String>>>,
    pub ragged: usize,
}

impl ParseAttempt {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Strict-then-relaxed parse with a deterministic acceptance rule
#[derive(Debug, Clone, Copy)]
pub struct QuoteStrategy {
    expected_rows: usize,
}

impl QuoteStrategy {
    pub fn new(expected_rows: usize) -> Self {
        Self { expected_rows }
    }

    /// Keep the strict attempt when it has the expected row count; otherwise
    /// keep the relaxed attempt, even when it is still short.
    pub fn accept(
        &self,
        strict: ParseAttempt,
        relaxed: impl FnOnce() -> Result<ParseAttempt>,
    ) -> Result<(ParseAttempt, Option<Diagnostic>)> {
        if strict.row_count() == self.expected_rows {
            return Ok((strict, None));
        }

        let relaxed = relaxed()?;
        warn!(
            "Strict parse returned {} of {} rows; relaxed parse returned {}",
            strict.row_count(),
            self.expected_rows,
            relaxed.row_count()
        );
        let diagnostic = Diagnostic::RowCountMismatch {
            expected: self.expected_rows,
            strict: strict.row_count(),
            relaxed: relaxed.row_count(),
        };
        Ok((relaxed, Some(diagnostic)))
    }
}

/// Parse the data section of a document into a table
pub fn read_table(
    doc: &SplitDocument<'_>,
    mode: ReadMode,
    conventions: &NamingConventions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Table> {
    let width = doc.columns.len();
    let data = doc.data_lines.join("\n");

    let attempt = match mode {
        ReadMode::Raw => parse_cells(&data, width, QuoteHandling::Relaxed)?,
        ReadMode::Typed => {
            let strategy = QuoteStrategy::new(doc.expected_rows());
            let strict = parse_cells(&data, width, QuoteHandling::Strict)?;
            let (attempt, diagnostic) =
                strategy.accept(strict, || parse_cells(&data, width, QuoteHandling::Relaxed))?;
            diagnostics.extend(diagnostic);
            attempt
        }
    };

    if attempt.ragged > 0 {
        warn!("{} data rows did not match the header width of {}", attempt.ragged, width);
        diagnostics.push(Diagnostic::RaggedRows {
            count: attempt.ragged,
        });
    }

    debug!(
        "Read {} rows x {} columns ({:?} quoting, {:?} mode)",
        attempt.row_count(),
        width,
        attempt.quoting,
        mode
    );

    let height = attempt.row_count();
    let mut cells_by_column: Vec<Vec<Option<String>>> =
        (0..width).map(|_| Vec::with_capacity(height)).collect();
    for row in attempt.rows {
        for (column, cell) in cells_by_column.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    let mut table = Table::new(height);
    for (spec, cells) in doc.columns.iter().zip(cells_by_column) {
        let column = match mode {
            ReadMode::Raw => Column::text(spec.name.clone(), cells),
            ReadMode::Typed => infer_column(spec, cells, conventions),
        };
        table.push_column(column)?;
    }

    Ok(table)
}

/// Split tab-delimited data into padded rows of exactly `width` cells
fn parse_cells(data: &str, width: usize, quoting: QuoteHandling) -> Result<ParseAttempt> {
    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .quote(QUOTE_CHAR)
        .quoting(quoting == QuoteHandling::Strict)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    let mut ragged = 0;
    for record in reader.records() {
        let record = record?;
        // Trailing empty cells past the header are trailing-tab artifacts
        let filled = record
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .last()
            .map_or(0, |(last, _)| last + 1);
        if record.len() < width || filled > width {
            ragged += 1;
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .take(width)
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        row.resize(width, None);
        rows.push(row);
    }

    Ok(ParseAttempt {
        quoting,
        rows,
        ragged,
    })
}

/// Decide the kind of a typed-mode column from all of its cells
fn infer_column(spec: &ColumnSpec, cells: Vec<Option<String>>, conventions: &NamingConventions) -> Column {
    let pinned_text = spec.type_token.ends_with(STRING_TYPE_SUFFIX)
        || conventions.is_temporal_part(&spec.name);
    let present: Vec<&str> = cells.iter().flatten().map(String::as_str).collect();

    if pinned_text || present.is_empty() {
        return Column::text(spec.name.clone(), cells);
    }

    if present.iter().all(|cell| parse_number(cell).is_some()) {
        let values = cells
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_number))
            .collect();
        return Column::numeric(spec.name.clone(), values);
    }

    if present.iter().all(|cell| parse_datetime(cell).is_some()) {
        let values = cells
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_datetime))
            .collect();
        return Column::timestamp(spec.name.clone(), values, Tz::UTC);
    }

    Column::text(spec.name.clone(), cells)
}

pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Parse a naive "date time" string, interpreting it as UTC
pub(crate) fn parse_datetime(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    PAIR_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(cell, format).ok())
        .map(|naive| naive.and_utc())
}
