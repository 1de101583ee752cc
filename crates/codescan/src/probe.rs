// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Decoding capability probe
//!
//! The software reader is always available. A hardware (on-device) detector
//! is optional: the platform may not expose one, may not report which
//! symbologies it handles, or may fail to construct it. None of that is
//! fatal, the session simply runs without the hardware loop.

use std::{fmt, sync::Arc};

use crate::{
    decode::{DecodeError, HardwareDetector},
    format::{self, BarcodeFormat},
};

/// Platform hook for the native barcode detector
pub trait DetectorPlatform: Send + Sync {
    /// Whether the platform exposes a detector at all.
    fn is_available(&self) -> bool;

    /// Formats the detector can handle.
    fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DecodeError> {
        Err(DecodeError::new("supported format query is not available"))
    }

    /// Build a detector restricted to `formats`, or with the platform
    /// defaults when `formats` is `None`.
    fn create(
        &self,
        formats: Option<&[BarcodeFormat]>,
    ) -> Result<Arc<dyn HardwareDetector>, DecodeError>;
}

/// A constructed hardware detector
#[derive(Clone)]
pub struct HardwareCapability {
    pub detector: Arc<dyn HardwareDetector>,
    /// `None` when the detector runs with platform default formats
    pub formats: Option<Vec<BarcodeFormat>>,
}

impl fmt::Debug for HardwareCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareCapability")
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

/// Decoding capabilities available to a session
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub hardware: Option<HardwareCapability>,
}

impl Capabilities {
    /// Number of decode loops a session will run.
    pub fn loop_count(&self) -> usize {
        1 + usize::from(self.hardware.is_some())
    }
}

/// Probe every decoding capability for a session.
pub fn probe(platform: Option<&dyn DetectorPlatform>, wanted: &[BarcodeFormat]) -> Capabilities {
    Capabilities {
        hardware: detect_hardware_detector(platform, wanted),
    }
}

/// Construct the native detector restricted to `wanted`, if possible.
///
/// When the format query fails or shares nothing with `wanted`, the detector
/// is constructed with its own defaults.
pub fn detect_hardware_detector(
    platform: Option<&dyn DetectorPlatform>,
    wanted: &[BarcodeFormat],
) -> Option<HardwareCapability> {
    let platform = platform.filter(|p| p.is_available())?;

    let formats = match platform.supported_formats() {
        Ok(supported) => {
            let restricted = format::intersect(wanted, &supported);
            if restricted.is_empty() {
                log::debug!(
                    "Hardware detector reports none of the wanted formats ({:?}), using defaults",
                    supported
                );
                None
            } else {
                Some(restricted)
            }
        }
        Err(err) => {
            log::debug!("Hardware detector format query failed, using defaults: {}", err);
            None
        }
    };

    match platform.create(formats.as_deref()) {
        Ok(detector) => {
            log::debug!("Hardware detector ready (formats: {:?})", formats);
            Some(HardwareCapability { detector, formats })
        }
        Err(err) => {
            log::debug!("Hardware detector construction failed: {}", err);
            None
        }
    }
}
