// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod devices;
mod error;
mod formats;
mod report;
mod scan;
mod scenario;
mod utils;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// codescan CLI - Barcode and QR scanning sessions against scripted platforms
#[derive(Parser)]
#[command(name = "codescan")]
#[command(version)]
#[command(about = "codescan CLI - Barcode and QR scanning sessions against scripted platforms")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=trace for per-frame detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scanning session and print the decoded payload
    Scan(scan::Args),

    /// List the video inputs of a scenario and the rear camera pick
    Devices(devices::Args),

    /// List the recognized barcode formats
    Formats(formats::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Scan(args) => scan::execute(args, cli.json),
        Commands::Devices(args) => devices::execute(args, cli.json),
        Commands::Formats(args) => formats::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("warn")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("Logging initialized");
}
