use anyhow::anyhow;
use clap::Parser;
use rdb_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    commands::setup_logging(&args);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            process::exit(1);
        }
    };

    let result: anyhow::Result<()> = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available; never resolve
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result.map_err(anyhow::Error::from),
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(anyhow!("Processing interrupted by user"))
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("RDB Processor - USGS RDB1 Data Converter");
    println!("========================================");
    println!();
    println!("Parse tab-delimited RDB1 documents into typed, timezone-normalized");
    println!("tables and write them as Apache Parquet files.");
    println!();
    println!("USAGE:");
    println!("    rdb_processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    convert     Convert RDB files to Parquet");
    println!("    inspect     Show columns, diagnostics and first rows of a document");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Convert every RDB file in a directory, timestamps in New York time:");
    println!("    rdb_processor convert downloads/ -o parquet/ --tz America/New_York");
    println!();
    println!("    # Keep everything as text:");
    println!("    rdb_processor convert 'downloads/*.rdb' --raw");
    println!();
    println!("    # Look at a single file:");
    println!("    rdb_processor inspect downloads/01646500.rdb --rows 10");
    println!();
    println!("For detailed help on any command, use:");
    println!("    rdb_processor <COMMAND> --help");
}
