// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::utils::millis;
use codescan::{session::ScanSession, stats::StatsSnapshot};
use serde::Serialize;

/// How a scan command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Scanned(String),
    Interrupted,
    TimedOut,
}

impl Outcome {
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Scanned(_) => "scanned",
            Outcome::Interrupted => "interrupted",
            Outcome::TimedOut => "timeout",
        }
    }
}

/// Per-loop counters of one session
#[derive(Debug, Serialize)]
pub struct LoopStats {
    pub hardware_ticks: u64,
    pub hardware_skipped: u64,
    pub hardware_detections: u64,
    pub software_batches: u64,
    pub transient_errors: u64,
    pub empty_payloads: u64,
}

/// Summary of a finished scan session
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub handle: i64,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub state: String,
    pub acquisition: Option<String>,
    pub tuning: Option<String>,
    pub hardware_enabled: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_result_ms: Option<u64>,
    pub loops: LoopStats,
}

impl ScanReport {
    pub fn new(session: &ScanSession, outcome: &Outcome) -> ScanReport {
        let snap: StatsSnapshot = session.stats().snapshot();
        ScanReport {
            handle: session.handle().as_raw(),
            status: outcome.status(),
            payload: match outcome {
                Outcome::Scanned(payload) => Some(payload.clone()),
                _ => None,
            },
            source: snap.winner.map(|s| s.to_string()),
            state: session.state().to_string(),
            acquisition: snap.acquisition.map(|p| p.to_string()),
            tuning: snap.tuning.map(|t| t.to_string()),
            hardware_enabled: snap.hardware_enabled,
            elapsed_ms: millis(snap.elapsed),
            time_to_result_ms: snap.time_to_result.map(millis),
            loops: LoopStats {
                hardware_ticks: snap.hardware_ticks,
                hardware_skipped: snap.hardware_skipped,
                hardware_detections: snap.hardware_detections,
                software_batches: snap.software_batches,
                transient_errors: snap.transient_errors,
                empty_payloads: snap.empty_payloads,
            },
        }
    }
}

/// Print session statistics in human-readable form
pub fn print_text_report(report: &ScanReport) {
    println!("Session {}: {} ({})", report.handle, report.status, report.state);
    if let Some(source) = &report.source {
        println!("  Decoded by:     {}", source);
    }
    println!(
        "  Acquisition:    {}",
        report.acquisition.as_deref().unwrap_or("-")
    );
    println!("  Tuning:         {}", report.tuning.as_deref().unwrap_or("-"));
    println!(
        "  Hardware loop:  {}",
        if report.hardware_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    if let Some(ms) = report.time_to_result_ms {
        println!("  Time to result: {} ms", ms);
    }
    println!(
        "  Hardware:       {} ticks, {} skipped, {} detections",
        report.loops.hardware_ticks, report.loops.hardware_skipped, report.loops.hardware_detections
    );
    println!(
        "  Software:       {} batches",
        report.loops.software_batches
    );
    println!(
        "  Discarded:      {} errors, {} empty payloads",
        report.loops.transient_errors, report.loops.empty_payloads
    );
}
