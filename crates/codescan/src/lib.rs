// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! codescan - barcode/QR scanning session manager
//!
//! The library owns one scanning attempt end to end: it negotiates a camera
//! stream under varying device capability, mounts it on a rendering surface,
//! races a hardware detector against a software multi-format reader, and
//! hands the caller exactly one decoded payload before releasing every
//! resource it acquired.
//!
//! Symbol decoding itself is opaque: the platform supplies a
//! [`decode::HardwareDetector`] and a [`decode::FrameDecoder`] (or a full
//! [`decode::SoftwareDecoderFactory`]) and this crate schedules them.
//!
//! # Quick Start
//!
//! ```no_run
//! use codescan::registry::Scanner;
//! use codescan::sim::SimPlatform;
//!
//! let platform = SimPlatform::builder()
//!     .container("scanner")
//!     .payloads(["", "4006381333931"])
//!     .build();
//! let scanner = Scanner::new(platform.platform());
//!
//! let handle = scanner.start(
//!     "scanner",
//!     |payload| println!("scanned: {}", payload),
//!     |message| eprintln!("scan failed: {}", message),
//! );
//! assert!(handle.is_valid());
//! // later, or from another thread:
//! scanner.stop(handle);
//! ```
//!
//! # Components
//!
//! - [`probe`] - hardware detector feature detection
//! - [`camera`] - acquisition candidates and the fallback chain
//! - [`tuner`] - best-effort track tuning (continuous autofocus)
//! - [`decode`] - hardware and software decode loops
//! - [`session`] - single session state machine and teardown
//! - [`registry`] - process-wide handle to session mapping

use std::{
    error, fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

pub use decode::DecodeError;
pub use media::MediaError;

/// Error type for scanning sessions
///
/// Only [`Error::EnvironmentUnsupported`], [`Error::MountTargetMissing`] and
/// [`Error::CameraUnavailable`] ever reach a caller's error callback; the
/// remaining variants are recovered inside the session and only logged.
#[derive(Debug, Clone)]
pub enum Error {
    /// Insecure context or missing camera API, nothing was acquired
    EnvironmentUnsupported(&'static str),

    /// The mount target did not appear within the polling window
    MountTargetMissing(String),

    /// Every acquisition candidate and the enumeration fallback failed
    CameraUnavailable(MediaError),

    /// A single decode or detection attempt failed
    TransientDecode(DecodeError),

    /// The camera refused a tuning constraint
    TuningUnsupported(MediaError),
}

impl Error {
    /// Whether this error is delivered to the caller's error callback.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Error::EnvironmentUnsupported(_)
                | Error::MountTargetMissing(_)
                | Error::CameraUnavailable(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EnvironmentUnsupported(reason) => write!(f, "{}", reason),
            Error::MountTargetMissing(id) => {
                write!(f, "Scanner container '{}' not found", id)
            }
            Error::CameraUnavailable(err) => write!(f, "{}", err),
            Error::TransientDecode(err) => write!(f, "Decode attempt failed: {}", err),
            Error::TuningUnsupported(err) => write!(f, "Track tuning unsupported: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::EnvironmentUnsupported(_) | Error::MountTargetMissing(_) => None,
            Error::CameraUnavailable(err) => Some(err),
            Error::TransientDecode(err) => Some(err),
            Error::TuningUnsupported(err) => Some(err),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::TransientDecode(err)
    }
}

/// Reported when the execution context is not secure (no HTTPS).
pub const INSECURE_CONTEXT: &str = "Camera access requires a secure (HTTPS) context";

/// Reported when the platform exposes no camera access API.
pub const CAMERA_API_MISSING: &str = "Camera access is not supported on this platform";

/// Lock a mutex, recovering the guard if a callback panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The symbol formats the scanner recognizes.
pub mod format;

/// Video frames handed to decoders.
pub mod frame;

/// Camera access collaborator interfaces.
pub mod media;

/// Mount targets and the video rendering surface.
pub mod surface;

/// Camera acquisition candidates and the stream negotiator.
pub mod camera;

/// Best-effort tuning of acquired tracks.
pub mod tuner;

/// Hardware detector capability probe.
pub mod probe;

/// Hardware and software decode loops.
pub mod decode;

/// Per-session counters.
pub mod stats;

/// Scanner configuration.
pub mod config;

/// Scan session coordinator.
pub mod session;

/// Process-wide session registry.
pub mod registry;

/// Scripted in-memory platform for tests and dry runs.
pub mod sim;
