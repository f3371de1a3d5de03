//! Core data structures for RDB1 import.
//!
//! Defines the typed column model, the table that holds columns of equal
//! length, the diagnostics attached to a result, and the assembled
//! [`RecordSet`] returned to callers.

use crate::constants::DISPLAY_DATETIME_FORMAT;
use crate::error::{RdbError, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Diagnostic headers returned by the retrieval collaborator
pub type HeaderInfo = BTreeMap<String, String>;

/// Semantic kind of a column, decided once during reading or coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Numeric,
    Timestamp,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Text => "text",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Timestamp => "timestamp",
        };
        f.write_str(label)
    }
}

/// Values of one column, tagged by kind. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
    /// UTC instants plus the zone they are displayed in
    Timestamp {
        values: Vec<Option<DateTime<Utc>>>,
        tz: Tz,
    },
}

impl ColumnValues {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Text(_) => ColumnKind::Text,
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
            ColumnValues::Timestamp { .. } => ColumnKind::Timestamp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(values) => values.len(),
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Timestamp { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnValues::Text(values) => values.get(row).is_none_or(Option::is_none),
            ColumnValues::Numeric(values) => values.get(row).is_none_or(Option::is_none),
            ColumnValues::Timestamp { values, .. } => values.get(row).is_none_or(Option::is_none),
        }
    }

    /// True when every cell is missing (vacuously true for zero rows)
    pub fn all_missing(&self) -> bool {
        (0..self.len()).all(|row| self.is_missing(row))
    }
}

/// A named column of a [`Table`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnValues::Text(values))
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Numeric(values))
    }

    pub fn timestamp(name: impl Into<String>, values: Vec<Option<DateTime<Utc>>>, tz: Tz) -> Self {
        Self::new(name, ColumnValues::Timestamp { values, tz })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.values.kind()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut ColumnValues {
        &mut self.values
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Text(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[Option<DateTime<Utc>>]> {
        match &self.values {
            ColumnValues::Timestamp { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Display zone of a timestamp column
    pub fn timezone(&self) -> Option<Tz> {
        match &self.values {
            ColumnValues::Timestamp { tz, .. } => Some(*tz),
            _ => None,
        }
    }

    /// Render one cell as text; timestamps are shown in the column's zone
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match &self.values {
            ColumnValues::Text(values) => values.get(row).cloned().flatten(),
            ColumnValues::Numeric(values) => values.get(row).copied().flatten().map(|v| v.to_string()),
            ColumnValues::Timestamp { values, tz } => values
                .get(row)
                .copied()
                .flatten()
                .map(|dt| dt.with_timezone(tz).format(DISPLAY_DATETIME_FORMAT).to_string()),
        }
    }
}

/// Ordered columns sharing one row count.
///
/// Every column holds exactly `height` values; insertion of a column with a
/// different length is rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new(height: usize) -> Self {
        Self {
            columns: Vec::new(),
            height,
        }
    }

    /// Build a table from columns, checking that their lengths agree
    pub fn from_columns(height: usize, columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new(height);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        let index = self.columns.len();
        self.insert_column(index, column)
    }

    pub fn insert_column(&mut self, index: usize, column: Column) -> Result<()> {
        let found = column.len();
        if found != self.height {
            return Err(RdbError::ColumnLength {
                column: column.name,
                expected: self.height,
                found,
            });
        }
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let index = self.position(name)?;
        Some(self.columns.remove(index))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_mut(from) {
            Some(column) => {
                column.set_name(to);
                true
            }
            None => false,
        }
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a < self.columns.len() && b < self.columns.len() {
            self.columns.swap(a, b);
        }
    }

    /// Move `name` so it sits immediately before `anchor`
    pub fn move_column_before(&mut self, name: &str, anchor: &str) -> bool {
        if name == anchor || !self.contains(anchor) {
            return false;
        }
        let Some(column) = self.remove_column(name) else {
            return false;
        };
        let index = self.position(anchor).unwrap_or(self.columns.len());
        self.columns.insert(index, column);
        true
    }

    /// Cells of one row rendered as text, in column order
    pub fn row_cells(&self, row: usize) -> Vec<Option<String>> {
        self.columns.iter().map(|c| c.cell_text(row)).collect()
    }
}

/// Recoverable conditions recorded while importing a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The strict quoted parse returned fewer rows than the document holds
    RowCountMismatch {
        expected: usize,
        strict: usize,
        relaxed: usize,
    },
    /// A value column held non-numeric cells and was kept as text
    NumericCoercionFailure {
        column: String,
        failed: usize,
        example: String,
    },
    /// No row of a date/time candidate could be parsed
    UnparseableTimestampPair { base: String },
    /// Codes missing from the offset table; treated as zero offset
    UnknownTimezoneCode { column: String, codes: Vec<String> },
    /// The retrieval collaborator reported a service-level warning
    UpstreamWarning { message: String },
    /// Data lines whose field count differed from the header
    RaggedRows { count: usize },
    /// Input was not valid UTF-8 and was decoded as ISO-8859-1
    NonUtf8Input,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RowCountMismatch {
                expected,
                strict,
                relaxed,
            } => write!(
                f,
                "row count mismatch: expected {expected}, strict parse {strict}, relaxed parse {relaxed}"
            ),
            Diagnostic::NumericCoercionFailure {
                column,
                failed,
                example,
            } => write!(
                f,
                "column '{column}' kept as text: {failed} non-numeric cell(s), e.g. '{example}'"
            ),
            Diagnostic::UnparseableTimestampPair { base } => {
                write!(f, "no parseable timestamps for '{base}'")
            }
            Diagnostic::UnknownTimezoneCode { column, codes } => write!(
                f,
                "unknown timezone code(s) in '{column}' treated as UTC: {}",
                codes.join(", ")
            ),
            Diagnostic::UpstreamWarning { message } => write!(f, "upstream warning: {message}"),
            Diagnostic::RaggedRows { count } => {
                write!(f, "{count} row(s) had a field count different from the header")
            }
            Diagnostic::NonUtf8Input => f.write_str("input decoded as ISO-8859-1"),
        }
    }
}

/// Metadata attached to an assembled record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// URL or location of a remote fetch; `None` for local input
    pub source_identifier: Option<String>,
    pub retrieval_time: DateTime<Utc>,
    /// Comment lines preceding the header, verbatim
    pub comment: Vec<String>,
    /// Headers from the retrieval collaborator; `None` for local input
    pub header_info: Option<HeaderInfo>,
    pub diagnostics: Vec<Diagnostic>,
    pub output_tz: Tz,
}

/// Typed table plus metadata, produced once per import call
#[derive(Debug, Clone)]
pub struct RecordSet {
    table: Table,
    metadata: ResultMetadata,
}

impl RecordSet {
    pub(crate) fn new(table: Table, metadata: ResultMetadata) -> Self {
        Self { table, metadata }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table.column(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.metadata.diagnostics
    }

    pub fn into_parts(self) -> (Table, ResultMetadata) {
        (self.table, self.metadata)
    }
}

/// Batch conversion statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub total_rows: usize,
    pub diagnostics: usize,
    pub output_dir: PathBuf,
    pub processing_time_ms: u128,
}
