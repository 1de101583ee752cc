// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Scanner configuration

use std::time::Duration;

use crate::{
    camera::{default_candidates, CameraCandidate},
    decode::DecodeHints,
    format::{BarcodeFormat, RECOGNIZED_FORMATS},
};

/// Scanner tuning knobs
///
/// Defaults match what mobile browsers handle well: the mount target is
/// polled 20 times every 50 ms, the software reader runs every 200 ms and the
/// hardware detector once per rendered frame.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// lookups of the mount target before giving up
    mount_attempts: u32,

    /// pause between two mount target lookups
    mount_poll_interval: Duration,

    /// ideal capture resolution used by the default candidates
    resolution: (u32, u32),

    /// explicit candidate chain, replaces the default one
    candidates: Option<Vec<CameraCandidate>>,

    /// symbologies decoders are restricted to
    formats: Vec<BarcodeFormat>,

    /// let the software reader spend more time per frame
    try_harder: bool,

    /// pause between software reader attempts
    scan_interval: Duration,

    /// hardware loop tick period
    frame_interval: Duration,

    /// upper bound on track tuning
    tuning_timeout: Duration,

    /// allow the hardware detector when the platform offers one
    hardware: bool,
}

impl ScannerConfig {
    pub fn with_mount_polling(self, attempts: u32, interval: Duration) -> ScannerConfig {
        ScannerConfig {
            mount_attempts: attempts.max(1),
            mount_poll_interval: interval,
            ..self
        }
    }

    pub fn with_resolution(self, width: u32, height: u32) -> ScannerConfig {
        ScannerConfig {
            resolution: (width, height),
            ..self
        }
    }

    pub fn with_candidates(self, candidates: Vec<CameraCandidate>) -> ScannerConfig {
        ScannerConfig {
            candidates: Some(candidates),
            ..self
        }
    }

    pub fn with_formats(self, formats: Vec<BarcodeFormat>) -> ScannerConfig {
        ScannerConfig { formats, ..self }
    }

    pub fn with_try_harder(self, try_harder: bool) -> ScannerConfig {
        ScannerConfig { try_harder, ..self }
    }

    pub fn with_scan_interval(self, scan_interval: Duration) -> ScannerConfig {
        ScannerConfig {
            scan_interval,
            ..self
        }
    }

    pub fn with_frame_interval(self, frame_interval: Duration) -> ScannerConfig {
        ScannerConfig {
            frame_interval,
            ..self
        }
    }

    pub fn with_tuning_timeout(self, tuning_timeout: Duration) -> ScannerConfig {
        ScannerConfig {
            tuning_timeout,
            ..self
        }
    }

    pub fn with_hardware(self, hardware: bool) -> ScannerConfig {
        ScannerConfig { hardware, ..self }
    }

    pub fn mount_attempts(&self) -> u32 {
        self.mount_attempts
    }

    pub fn mount_poll_interval(&self) -> Duration {
        self.mount_poll_interval
    }

    /// The acquisition chain the negotiator walks.
    pub fn candidates(&self) -> Vec<CameraCandidate> {
        match &self.candidates {
            Some(candidates) => candidates.clone(),
            None => default_candidates(self.resolution.0, self.resolution.1),
        }
    }

    pub fn formats(&self) -> &[BarcodeFormat] {
        &self.formats
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn tuning_timeout(&self) -> Duration {
        self.tuning_timeout
    }

    pub fn hardware(&self) -> bool {
        self.hardware
    }

    pub fn decode_hints(&self) -> DecodeHints {
        DecodeHints {
            try_harder: self.try_harder,
            possible_formats: self.formats.clone(),
            scan_interval: self.scan_interval,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> ScannerConfig {
        ScannerConfig {
            mount_attempts: 20,
            mount_poll_interval: Duration::from_millis(50),
            resolution: (1920, 1080),
            candidates: None,
            formats: RECOGNIZED_FORMATS.to_vec(),
            try_harder: true,
            scan_interval: Duration::from_millis(200),
            frame_interval: Duration::from_millis(16),
            tuning_timeout: Duration::from_millis(500),
            hardware: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.mount_attempts(), 20);
        assert_eq!(config.mount_poll_interval(), Duration::from_millis(50));
        assert_eq!(config.candidates().len(), 4);
        assert_eq!(config.candidates()[0].resolution(), Some((1920, 1080)));

        let hints = config.decode_hints();
        assert!(hints.try_harder);
        assert_eq!(hints.possible_formats.len(), 9);
        assert_eq!(hints.scan_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_builders() {
        let config = ScannerConfig::default()
            .with_resolution(1280, 720)
            .with_mount_polling(0, Duration::from_millis(5))
            .with_formats(vec![BarcodeFormat::QrCode])
            .with_hardware(false);
        assert_eq!(config.candidates()[1].resolution(), Some((1280, 720)));
        assert_eq!(config.mount_attempts(), 1);
        assert_eq!(config.decode_hints().possible_formats, vec![BarcodeFormat::QrCode]);
        assert!(!config.hardware());

        let config = config.with_candidates(vec![CameraCandidate::unconstrained()]);
        assert_eq!(config.candidates().len(), 1);
    }
}
