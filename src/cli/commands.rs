//! Command implementations for the RDB processor CLI
//!
//! Dispatches parsed arguments to the batch processor or the inspector and
//! sets up logging.

use crate::assemble::Rdb1Importer;
use crate::cli::args::{Args, Commands, ConvertArgs, InspectArgs};
use crate::error::{RdbError, Result};
use crate::models::{ColumnKind, RecordSet};
use crate::processor::BatchProcessor;
use colored::*;
use std::path::PathBuf;
use tokio::task;
use tracing::debug;

/// Run the selected subcommand
pub async fn run(args: Args) -> Result<()> {
    debug!("Command line arguments: {:?}", args);
    match args.command {
        Some(Commands::Convert(convert)) => run_convert(convert).await,
        Some(Commands::Inspect(inspect)) => run_inspect(inspect).await,
        None => Ok(()),
    }
}

/// Initialise the tracing subscriber; `RUST_LOG` overrides the flags
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rdb_processor={}", log_level)));

    let initialised = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init();

    if initialised.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let processor = BatchProcessor::new(args.to_processing_config())?;
    let stats = processor.process(args.inputs).await?;

    if stats.files_failed > 0 {
        let total = stats.files_failed + stats.files_processed + stats.files_skipped;
        return Err(RdbError::ProcessingFailed {
            path: stats.output_dir,
            reason: format!("{} of {} files failed", stats.files_failed, total),
        });
    }
    Ok(())
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let importer = Rdb1Importer::new(args.parse.to_parse_config())?;
    let input = args.input.clone();
    let records = task::spawn_blocking(move || importer.import(&input))
        .await
        .map_err(|e| RdbError::ProcessingFailed {
            path: PathBuf::from(&args.input),
            reason: format!("inspect task failed: {}", e),
        })??;

    print_record_set(&args.input, &records, args.rows);
    Ok(())
}

fn print_record_set(input: &str, records: &RecordSet, rows: usize) {
    let metadata = records.metadata();

    println!("{}", "RDB document".bright_green().bold());
    println!("  {} {}", "Input:".bright_cyan(), input);
    println!(
        "  {} {} rows x {} columns",
        "Shape:".bright_cyan(),
        records.height().to_string().bright_white().bold(),
        records.width().to_string().bright_white().bold()
    );
    println!(
        "  {} {} lines",
        "Comments:".bright_cyan(),
        metadata.comment.len()
    );
    println!("  {} {}", "Timezone:".bright_cyan(), metadata.output_tz.name());

    println!("\n{}", "Columns".bright_yellow());
    for column in records.table().columns() {
        let kind = match column.kind() {
            ColumnKind::Text => column.kind().to_string().bright_black(),
            ColumnKind::Numeric => column.kind().to_string().bright_blue(),
            ColumnKind::Timestamp => column.kind().to_string().bright_magenta(),
        };
        println!("  {:<32} {}", column.name(), kind);
    }

    if !records.diagnostics().is_empty() {
        println!("\n{}", "Diagnostics".bright_red());
        for diagnostic in records.diagnostics() {
            println!("  - {}", diagnostic);
        }
    }

    let shown = rows.min(records.height());
    if shown > 0 {
        println!("\n{}", format!("First {} rows", shown).bright_yellow());
        println!("  {}", records.column_names().join("\t").bright_white().bold());
        for row in 0..shown {
            let cells: Vec<String> = records
                .table()
                .row_cells(row)
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect();
            println!("  {}", cells.join("\t"));
        }
    }
}
