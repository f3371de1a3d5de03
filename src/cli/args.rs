//! Command-line argument definitions for the RDB processor
//!
//! Defines the CLI using the clap derive API: `convert` for batch Parquet
//! output and `inspect` for a quick look at a single document.

use crate::config::{CompressionAlgorithm, ParseConfig, ProcessingConfig};
use crate::constants::{DEFAULT_OUTPUT_TZ, DEFAULT_PREVIEW_ROWS, DEFAULT_WORKERS};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the RDB processor
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rdb_processor",
    version,
    about = "Parse USGS RDB1 tab-delimited data into typed tables and Parquet",
    long_about = "Parses RDB1 documents from the USGS water services: comment preamble, \
                  header-name and header-type lines, then tab-delimited data. Value columns \
                  are coerced to numbers, split date/time columns are merged into timestamps \
                  and local timezone codes are normalized to a single output zone."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert RDB files to Parquet
    Convert(ConvertArgs),
    /// Print the columns, diagnostics and first rows of one document
    Inspect(InspectArgs),
}

/// Options shared by every command that parses documents
#[derive(Debug, Clone, ClapArgs)]
pub struct ParseArgs {
    /// Output timezone (IANA name, e.g. America/New_York)
    #[arg(long, value_name = "ZONE", default_value = DEFAULT_OUTPUT_TZ)]
    pub tz: String,

    /// Keep every column as text without type inference
    #[arg(long)]
    pub raw: bool,

    /// Do not merge date and time columns into timestamps
    #[arg(long = "no-datetime")]
    pub no_datetime: bool,
}

impl ParseArgs {
    pub fn to_parse_config(&self) -> ParseConfig {
        ParseConfig::default()
            .with_tz(self.tz.clone())
            .with_convert_type(!self.raw)
            .with_as_date_time(!self.no_datetime)
    }
}

/// Arguments for the convert command
#[derive(Debug, Clone, ClapArgs)]
pub struct ConvertArgs {
    /// Input files, directories or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Directory for the generated Parquet files (default: next to each input)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub parse: ParseArgs,

    /// Parquet compression algorithm
    #[arg(long, value_enum, default_value_t = CompressionArg::Snappy)]
    pub compression: CompressionArg,

    /// Number of files converted concurrently
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Overwrite existing Parquet files
    #[arg(short = 'f', long)]
    pub force: bool,
}

impl ConvertArgs {
    pub fn to_processing_config(&self) -> ProcessingConfig {
        let mut config = ProcessingConfig::default()
            .with_workers(self.workers)
            .with_compression(self.compression.into())
            .with_parse(self.parse.to_parse_config());
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if self.force {
            config = config.with_overwrite();
        }
        config
    }
}

/// Arguments for the inspect command
#[derive(Debug, Clone, ClapArgs)]
pub struct InspectArgs {
    /// File path or location understood by the configured source
    #[arg(value_name = "INPUT")]
    pub input: String,

    #[command(flatten)]
    pub parse: ParseArgs,

    /// Number of data rows to print
    #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub rows: usize,
}

/// Compression choices accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    Snappy,
    Zstd,
    Lz4,
    None,
}

impl From<CompressionArg> for CompressionAlgorithm {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Snappy => CompressionAlgorithm::Snappy,
            CompressionArg::Zstd => CompressionAlgorithm::Zstd,
            CompressionArg::Lz4 => CompressionAlgorithm::Lz4,
            CompressionArg::None => CompressionAlgorithm::Uncompressed,
        }
    }
}

impl Args {
    /// Log level implied by the flags
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
