//! Batch conversion of RDB files to Parquet.
//!
//! Discovers the input files, imports each one on the blocking thread pool
//! with bounded concurrency and writes one Parquet file per input.

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::InputDiscovery;
use self::writer::write_parquet;

use crate::assemble::Rdb1Importer;
use crate::config::ProcessingConfig;
use crate::constants::PARQUET_EXTENSION;
use crate::error::{RdbError, Result};
use crate::models::ProcessingStats;

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task;
use tracing::{debug, error, warn};

/// Result of converting a single file
#[derive(Debug)]
enum FileOutcome {
    Converted { rows: usize, diagnostics: usize },
    Skipped,
    Failed(RdbError),
}

/// Converts many RDB files concurrently
#[derive(Debug)]
pub struct BatchProcessor {
    config: ProcessingConfig,
}

impl BatchProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Output location for an input file
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let file_name = Path::new(input.file_stem().unwrap_or(input.as_os_str()))
            .with_extension(PARQUET_EXTENSION);
        match &self.config.output_dir {
            Some(dir) => dir.join(file_name),
            None => input.with_extension(PARQUET_EXTENSION),
        }
    }

    /// Main processing entry point
    pub async fn process(&self, inputs: Vec<String>) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let quiet = self.config.quiet;

        let files = InputDiscovery::new(inputs).discover_files().await?;
        if !quiet {
            println!("{}", "Converting RDB files".bright_green().bold());
            println!(
                "  {} {} files",
                "Found".bright_green(),
                files.len().to_string().bright_white().bold()
            );
        }

        if let Some(dir) = &self.config.output_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(files.len() as u64)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Converting files");

        let concurrent_limit = self.config.workers.min(files.len()).max(1);
        debug!("Converting {} files with {} workers", files.len(), concurrent_limit);

        let outcomes: Vec<(PathBuf, FileOutcome)> = stream::iter(files)
            .map(|input| {
                let output = self.output_path_for(&input);
                let config = self.config.clone();
                let pb = pb.clone();
                async move {
                    let task_input = input.clone();
                    let outcome = task::spawn_blocking(move || {
                        convert_file(&task_input, &output, &config)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        FileOutcome::Failed(RdbError::ProcessingFailed {
                            path: input.clone(),
                            reason: format!("conversion task failed: {}", e),
                        })
                    });
                    pb.inc(1);
                    (input, outcome)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect()
            .await;

        pb.finish_with_message("Done");

        let mut stats = ProcessingStats {
            output_dir: self.config.output_dir.clone().unwrap_or_default(),
            ..Default::default()
        };
        for (input, outcome) in outcomes {
            match outcome {
                FileOutcome::Converted { rows, diagnostics } => {
                    stats.files_processed += 1;
                    stats.total_rows += rows;
                    stats.diagnostics += diagnostics;
                }
                FileOutcome::Skipped => stats.files_skipped += 1,
                FileOutcome::Failed(e) => {
                    error!("Failed to convert {}: {}", input.display(), e);
                    stats.files_failed += 1;
                }
            }
        }
        stats.processing_time_ms = start_time.elapsed().as_millis();

        if !quiet {
            print_summary(&stats);
        }
        Ok(stats)
    }
}

/// Import one file and write its Parquet output; runs on the blocking pool
fn convert_file(input: &Path, output: &Path, config: &ProcessingConfig) -> FileOutcome {
    if output.exists() && !config.overwrite {
        debug!("Skipping {}: output exists", input.display());
        return FileOutcome::Skipped;
    }

    let result = Rdb1Importer::new(config.parse.clone())
        .and_then(|importer| importer.import_path(input))
        .and_then(|records| {
            for diagnostic in records.diagnostics() {
                warn!("{}: {}", input.display(), diagnostic);
            }
            let rows = write_parquet(&records, output, config.compression)?;
            Ok(FileOutcome::Converted {
                rows,
                diagnostics: records.diagnostics().len(),
            })
        });

    result.unwrap_or_else(|e| {
        FileOutcome::Failed(RdbError::ProcessingFailed {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })
    })
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files converted:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} {} (use --force to overwrite)",
            "Files skipped:".bright_yellow(),
            stats.files_skipped.to_string().bright_yellow()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold()
    );
    if stats.diagnostics > 0 {
        println!(
            "  {} {}",
            "Diagnostics:".bright_yellow(),
            stats.diagnostics.to_string().bright_yellow()
        );
    }
}
