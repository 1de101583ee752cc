// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::report::{self, Outcome, ScanReport};
use crate::scenario::Scenario;
use crate::utils;
use clap::Args as ClapArgs;
use codescan::{
    config::ScannerConfig, format::BarcodeFormat, registry::Scanner, session::SessionCallbacks,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::Ordering,
        mpsc::{self, RecvTimeoutError},
    },
    time::{Duration, Instant},
};

/// How often the wait loop checks for Ctrl+C and the deadline
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Scenario file describing the simulated camera, document and decoders
    #[arg(short, long)]
    scenario: PathBuf,

    /// Id of the container to mount the video in
    #[arg(short, long, default_value = "scanner")]
    container: String,

    /// Give up after this many seconds
    #[arg(short, long, default_value = "10.0")]
    timeout: f64,

    /// Do not use the hardware detector even if the platform has one
    #[arg(long)]
    no_hardware: bool,

    /// Restrict decoding to these formats (comma separated)
    #[arg(long, value_delimiter = ',')]
    formats: Vec<String>,

    /// Pause between software reader attempts in milliseconds
    #[arg(long, default_value = "200")]
    scan_interval_ms: u64,

    /// Print session statistics after the payload
    #[arg(long)]
    stats: bool,
}

enum Event {
    Scanned(String),
    Failed(String),
}

fn build_config(args: &Args) -> Result<ScannerConfig, CliError> {
    let mut config = ScannerConfig::default()
        .with_hardware(!args.no_hardware)
        .with_scan_interval(Duration::from_millis(args.scan_interval_ms));

    if !args.formats.is_empty() {
        let formats = args
            .formats
            .iter()
            .map(|name| {
                name.parse::<BarcodeFormat>()
                    .map_err(|e| CliError::InvalidArgs(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        config = config.with_formats(formats);
    }

    Ok(config)
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing scan command: {:?}", args);

    let timeout = utils::parse_seconds(args.timeout)?;
    let config = build_config(&args)?;
    let sim = Scenario::load(&args.scenario)?.build()?;

    // Install signal handler for graceful shutdown
    let term = utils::install_signal_handler()?;

    let scanner = Scanner::with_config(sim.platform(), config);
    let (tx, rx) = mpsc::channel();
    let result_tx = tx.clone();
    let callbacks = SessionCallbacks::new()
        .on_result(move |payload| {
            let _ = result_tx.send(Event::Scanned(payload));
        })
        .on_error(move |message| {
            let _ = tx.send(Event::Failed(message));
        });

    let session = scanner.open(&args.container, callbacks)?;
    log::info!(
        "Session {} scanning in '{}' (Ctrl+C to stop)",
        session.handle(),
        args.container
    );

    let deadline = Instant::now() + timeout;
    let outcome = loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Event::Scanned(payload)) => break Outcome::Scanned(payload),
            Ok(Event::Failed(message)) => return Err(CliError::General(message)),
            Err(RecvTimeoutError::Timeout) => {}
            // callbacks dropped without a result, the session was stopped
            Err(RecvTimeoutError::Disconnected) => break Outcome::Interrupted,
        }

        if term.load(Ordering::Relaxed) {
            log::info!("Received Ctrl+C, stopping session {}", session.handle());
            session.stop();
            break Outcome::Interrupted;
        }
        if Instant::now() >= deadline {
            session.stop();
            break Outcome::TimedOut;
        }
    };

    let report = ScanReport::new(&session, &outcome);
    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        if let Outcome::Scanned(payload) = &outcome {
            println!("{}", payload);
        }
        if args.stats {
            report::print_text_report(&report);
        }
    }

    match outcome {
        Outcome::TimedOut => Err(CliError::Timeout(format!(
            "No code scanned within {:.1}s",
            args.timeout
        ))),
        Outcome::Scanned(_) | Outcome::Interrupted => Ok(()),
    }
}
