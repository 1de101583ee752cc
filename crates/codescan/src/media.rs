// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Camera access collaborator interfaces
//!
//! These traits describe the platform's camera API in the shape the scanner
//! consumes it: request a stream for a set of constraints (which may prompt
//! the user and may be rejected), optionally enumerate video inputs, and
//! manage the tracks of an acquired stream. Platform bindings implement them;
//! [`crate::sim`] ships a scripted implementation.

use std::{error, fmt, sync::Arc};

use crate::{camera::CameraCandidate, frame::Frame};

/// Named failure reported by the camera API
///
/// `name` carries the platform exception name (`NotAllowedError`,
/// `NotFoundError`, `OverconstrainedError`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaError {
    pub name: String,
    pub message: String,
}

impl MediaError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> MediaError {
        MediaError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The user or policy denied camera permission.
    pub fn not_allowed(message: impl Into<String>) -> MediaError {
        MediaError::new("NotAllowedError", message)
    }

    /// No device satisfies the request.
    pub fn not_found(message: impl Into<String>) -> MediaError {
        MediaError::new("NotFoundError", message)
    }

    /// A required (exact) constraint cannot be met.
    pub fn overconstrained(constraint: impl Into<String>) -> MediaError {
        let constraint = constraint.into();
        MediaError::new(
            "OverconstrainedError",
            format!("Constraint '{}' cannot be satisfied", constraint),
        )
    }

    pub fn not_supported(message: impl Into<String>) -> MediaError {
        MediaError::new("NotSupportedError", message)
    }

    /// The device is busy or failed to start.
    pub fn not_readable(message: impl Into<String>) -> MediaError {
        MediaError::new("NotReadableError", message)
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl error::Error for MediaError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Enumerated media device
///
/// Labels are usually empty until the user granted camera permission once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl DeviceInfo {
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> DeviceInfo {
        DeviceInfo {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusMode {
    None,
    Manual,
    SingleShot,
    Continuous,
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FocusMode::None => write!(f, "none"),
            FocusMode::Manual => write!(f, "manual"),
            FocusMode::SingleShot => write!(f, "single-shot"),
            FocusMode::Continuous => write!(f, "continuous"),
        }
    }
}

/// Capabilities a video track reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackCapabilities {
    pub focus_modes: Vec<FocusMode>,
}

/// Advanced constraint set applied to a live track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackConstraints {
    pub focus_mode: Option<FocusMode>,
}

impl TrackConstraints {
    pub fn is_empty(&self) -> bool {
        self.focus_mode.is_none()
    }
}

/// A single track of an acquired stream
pub trait MediaTrack: Send + Sync {
    fn label(&self) -> String;

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities::default()
    }

    fn apply_constraints(&self, constraints: &TrackConstraints) -> Result<(), MediaError> {
        let _ = constraints;
        Err(MediaError::not_supported("applyConstraints is not available"))
    }

    /// Stop the track. Stopping twice is harmless.
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// An acquired video stream
pub trait MediaStream: Send + Sync {
    fn id(&self) -> String;

    /// Device the stream is bound to, when the platform reports it.
    fn device_id(&self) -> Option<String> {
        None
    }

    fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Current frame, `None` once the tracks are stopped.
    fn latest_frame(&self) -> Option<Frame>;

    fn stop_tracks(&self) {
        for track in self.video_tracks() {
            track.stop();
        }
    }

    fn live_track_count(&self) -> usize {
        self.video_tracks().iter().filter(|t| t.is_live()).count()
    }
}

/// The platform camera access API
pub trait MediaDevices: Send + Sync {
    /// Request a stream matching `candidate`. May prompt for permission.
    fn get_user_media(&self, candidate: &CameraCandidate) -> Result<Arc<dyn MediaStream>, MediaError>;

    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, MediaError> {
        Err(MediaError::not_supported("Device enumeration is not available"))
    }
}
