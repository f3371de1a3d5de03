//! Configuration management and validation.
//!
//! [`ParseConfig`] controls a single import: typed or raw reading, timestamp
//! reconstruction and the output timezone. [`ProcessingConfig`] controls batch
//! conversion to Parquet.

use crate::constants::{DEFAULT_OUTPUT_TZ, DEFAULT_WORKERS};
use crate::error::{RdbError, Result};
use crate::reader::ReadMode;
use crate::timezone;
use chrono_tz::Tz;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Options for one import call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Merge date/time columns into timestamps (typed mode only)
    pub as_date_time: bool,

    /// Infer column kinds; when false every column is read as text
    pub convert_type: bool,

    /// IANA name of the output timezone; empty means UTC
    pub tz: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            as_date_time: true,
            convert_type: true,
            tz: DEFAULT_OUTPUT_TZ.to_string(),
        }
    }
}

impl ParseConfig {
    /// Read every column as text with quotes kept literally
    pub fn raw() -> Self {
        Self::default().with_convert_type(false)
    }

    pub fn with_as_date_time(mut self, as_date_time: bool) -> Self {
        self.as_date_time = as_date_time;
        self
    }

    pub fn with_convert_type(mut self, convert_type: bool) -> Self {
        self.convert_type = convert_type;
        self
    }

    pub fn with_tz(mut self, tz: impl Into<String>) -> Self {
        self.tz = tz.into();
        self
    }

    /// Validate the output timezone against the IANA database
    pub fn resolve_timezone(&self) -> Result<Tz> {
        timezone::resolve_timezone(&self.tz)
    }

    pub fn read_mode(&self) -> ReadMode {
        if self.convert_type {
            ReadMode::Typed
        } else {
            ReadMode::Raw
        }
    }

    /// Timestamp reconstruction only runs on typed reads
    pub fn reconstructs_timestamps(&self) -> bool {
        self.convert_type && self.as_date_time
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = RdbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(RdbError::Configuration {
                message: format!(
                    "unknown compression '{other}' (expected snappy, zstd, lz4 or none)"
                ),
            }),
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionAlgorithm::Snappy => "snappy",
            CompressionAlgorithm::Zstd => "zstd",
            CompressionAlgorithm::Lz4 => "lz4",
            CompressionAlgorithm::Uncompressed => "none",
        };
        f.write_str(name)
    }
}

/// Settings for batch conversion of RDB files to Parquet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of files converted concurrently
    pub workers: usize,

    pub compression: CompressionAlgorithm,

    /// Directory receiving `<stem>.parquet`; `None` writes next to each input
    pub output_dir: Option<PathBuf>,

    /// Replace existing output files instead of skipping them
    pub overwrite: bool,

    /// Hide the progress bar (used by tests)
    pub quiet: bool,

    pub parse: ParseConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS.min(num_cpus::get()).max(1),
            compression: CompressionAlgorithm::default(),
            output_dir: None,
            overwrite: false,
            quiet: false,
            parse: ParseConfig::default(),
        }
    }
}

impl ProcessingConfig {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Enable overwriting of existing outputs
    pub fn with_overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn with_quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn with_parse(mut self, parse: ParseConfig) -> Self {
        self.parse = parse;
        self
    }

    /// Check settings before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RdbError::Configuration {
                message: "worker count must be at least 1".to_string(),
            });
        }
        self.parse.resolve_timezone()?;
        debug!(
            "Processing config: {} workers, {} compression, tz '{}'",
            self.workers, self.compression, self.parse.tz
        );
        Ok(())
    }
}
