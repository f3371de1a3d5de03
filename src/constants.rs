//! Application constants for the RDB processor
//!
//! Format markers, accepted date/time layouts and processing defaults used
//! throughout the importer.

// =============================================================================
// RDB1 Format Markers
// =============================================================================

/// Lines starting with this character before the header are metadata
pub const COMMENT_MARKER: char = '#';

/// Field delimiter for header and data lines
pub const FIELD_DELIMITER: u8 = b'\t';

/// Quote character honoured by the strict parse attempt
pub const QUOTE_CHAR: u8 = b'"';

/// Type tokens ending in this character declare a string column (e.g. "15s")
pub const STRING_TYPE_SUFFIX: char = 's';

/// File extensions recognised when expanding directory inputs
pub const RDB_FILE_EXTENSIONS: &[&str] = &["rdb", "txt", "tsv"];

// =============================================================================
// Date and Time Layouts
// =============================================================================

/// Layouts accepted for a pasted "<date> <time>" pair, most specific first
pub const PAIR_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Layouts accepted for the legacy bare DATE column
pub const LEGACY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Layouts accepted for the legacy TIME column
pub const LEGACY_TIME_FORMATS: &[&str] = &["%H%M%S", "%H:%M:%S", "%H:%M", "%H%M"];

/// Rendering used when timestamps are displayed as text
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Processing Defaults
// =============================================================================

/// Output timezone used when the caller does not request one
pub const DEFAULT_OUTPUT_TZ: &str = "UTC";

/// Default number of files converted concurrently by the batch processor
pub const DEFAULT_WORKERS: usize = 4;

/// Number of rows shown by the `inspect` command
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Extension given to converted output files
pub const PARQUET_EXTENSION: &str = "parquet";
