//! RDB Processor Library
//!
//! A Rust library for parsing USGS RDB1 tab-delimited documents into typed,
//! timezone-normalized tables and writing them as Apache Parquet files.
//!
//! This library provides tools for:
//! - Splitting documents into comment preamble, header lines and data
//! - Reading the data section with a strict-then-relaxed quoting strategy
//! - Coercing measurement value columns to numbers without partial conversion
//! - Merging split date and time columns into timestamps
//! - Normalizing local timezone codes to a caller-chosen IANA zone
//! - Batch conversion to Parquet with bounded concurrency
//!
//! ```no_run
//! use rdb_processor::{ParseConfig, Rdb1Importer};
//!
//! let importer = Rdb1Importer::new(ParseConfig::default().with_tz("America/New_York"))?;
//! let records = importer.import_path("01646500.rdb")?;
//! for diagnostic in records.diagnostics() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok::<(), rdb_processor::RdbError>(())
//! ```

pub mod assemble;
pub mod coercion;
pub mod config;
pub mod constants;
pub mod conventions;
pub mod datetime;
pub mod error;
pub mod header;
pub mod models;
pub mod processor;
pub mod reader;
pub mod source;
pub mod timezone;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use assemble::{Rdb1Importer, import_rdb1, normalize_name};
pub use config::{CompressionAlgorithm, ParseConfig, ProcessingConfig};
pub use conventions::{NamingConventions, RDB1_CONVENTIONS};
pub use error::{RdbError, Result};
pub use models::{
    Column, ColumnKind, ColumnValues, Diagnostic, HeaderInfo, ProcessingStats, RecordSet,
    ResultMetadata, Table,
};
pub use processor::BatchProcessor;
pub use processor::writer::{to_dataframe, write_parquet};
pub use reader::ReadMode;
pub use source::{DocumentSource, FetchedDocument, NoRemoteSource};
pub use timezone::TimezoneNormalizer;
