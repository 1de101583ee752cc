// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Per-session counters and the acquisition and decode outcome

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

use crate::{camera::AcquisitionPath, decode::DecodeSource, lock, tuner::Tuning};

/// Counters collected while a session runs
///
/// Updated lock-free from the decode loops; read with [`SessionStats::snapshot`].
#[derive(Debug)]
pub struct SessionStats {
    started: Instant,
    hardware_ticks: AtomicU64,
    hardware_skipped: AtomicU64,
    hardware_detections: AtomicU64,
    software_batches: AtomicU64,
    transient_errors: AtomicU64,
    empty_payloads: AtomicU64,
    outcome: Mutex<Outcome>,
}

#[derive(Debug, Default, Clone)]
struct Outcome {
    acquisition: Option<AcquisitionPath>,
    tuning: Option<Tuning>,
    hardware_enabled: bool,
    winner: Option<DecodeSource>,
    time_to_result: Option<Duration>,
}

/// Point-in-time copy of [`SessionStats`]
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub elapsed: Duration,
    /// frames the hardware loop was scheduled on
    pub hardware_ticks: u64,
    /// ticks skipped because a detection was still in flight
    pub hardware_skipped: u64,
    /// completed hardware detection calls
    pub hardware_detections: u64,
    /// software reader attempts that produced output or an error
    pub software_batches: u64,
    pub transient_errors: u64,
    /// blank payloads discarded from either loop
    pub empty_payloads: u64,
    pub acquisition: Option<AcquisitionPath>,
    pub tuning: Option<Tuning>,
    pub hardware_enabled: bool,
    pub winner: Option<DecodeSource>,
    pub time_to_result: Option<Duration>,
}

impl SessionStats {
    pub fn new() -> SessionStats {
        SessionStats {
            started: Instant::now(),
            hardware_ticks: AtomicU64::new(0),
            hardware_skipped: AtomicU64::new(0),
            hardware_detections: AtomicU64::new(0),
            software_batches: AtomicU64::new(0),
            transient_errors: AtomicU64::new(0),
            empty_payloads: AtomicU64::new(0),
            outcome: Mutex::new(Outcome::default()),
        }
    }

    pub fn record_tick(&self) {
        self.hardware_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_tick(&self) {
        self.hardware_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self) {
        self.hardware_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_software_batch(&self) {
        self.software_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_payload(&self) {
        self.empty_payloads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_acquisition(&self, path: AcquisitionPath) {
        lock(&self.outcome).acquisition = Some(path);
    }

    pub(crate) fn set_tuning(&self, tuning: Tuning) {
        lock(&self.outcome).tuning = Some(tuning);
    }

    pub(crate) fn set_hardware_enabled(&self, enabled: bool) {
        lock(&self.outcome).hardware_enabled = enabled;
    }

    pub(crate) fn set_winner(&self, source: DecodeSource) {
        let mut outcome = lock(&self.outcome);
        outcome.winner = Some(source);
        outcome.time_to_result = Some(self.started.elapsed());
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let outcome = lock(&self.outcome).clone();
        StatsSnapshot {
            elapsed: self.started.elapsed(),
            hardware_ticks: self.hardware_ticks.load(Ordering::Relaxed),
            hardware_skipped: self.hardware_skipped.load(Ordering::Relaxed),
            hardware_detections: self.hardware_detections.load(Ordering::Relaxed),
            software_batches: self.software_batches.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            empty_payloads: self.empty_payloads.load(Ordering::Relaxed),
            acquisition: outcome.acquisition,
            tuning: outcome.tuning,
            hardware_enabled: outcome.hardware_enabled,
            winner: outcome.winner,
            time_to_result: outcome.time_to_result,
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = SessionStats::new();
        stats.record_tick();
        stats.record_tick();
        stats.record_skipped_tick();
        stats.record_empty_payload();
        stats.set_acquisition(AcquisitionPath::Candidate(1));
        stats.set_winner(DecodeSource::Software);

        let snap = stats.snapshot();
        assert_eq!(snap.hardware_ticks, 2);
        assert_eq!(snap.hardware_skipped, 1);
        assert_eq!(snap.empty_payloads, 1);
        assert_eq!(snap.transient_errors, 0);
        assert_eq!(snap.acquisition, Some(AcquisitionPath::Candidate(1)));
        assert_eq!(snap.winner, Some(DecodeSource::Software));
        assert!(snap.time_to_result.is_some());
    }
}
