// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Camera acquisition candidates and the stream negotiator
//!
//! The [`Negotiator`] walks an ordered list of [`CameraCandidate`]s and
//! returns the first stream the platform grants. Browsers and phones differ
//! wildly in which constraints they honor, so the default chain goes from the
//! most specific request (rear camera, exact) to a fully unconstrained one.
//! When every candidate is rejected, the negotiator opens a warm-up stream to
//! unlock device labels, enumerates video inputs and pins the device that
//! looks like a rear camera.

use std::{fmt, sync::Arc};

use crate::{
    media::{DeviceInfo, DeviceKind, MediaDevices, MediaError, MediaStream},
    Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacingMode {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

/// How hard the platform must honor a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strictness {
    /// Reject the request if the constraint cannot be met
    Exact,
    /// Best effort
    Ideal,
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strictness::Exact => write!(f, "exact"),
            Strictness::Ideal => write!(f, "ideal"),
        }
    }
}

/// One camera acquisition request
///
/// Video only, never audio. An empty candidate asks for any camera.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraCandidate {
    /// requested facing and how strictly to apply it
    facing: Option<(FacingMode, Strictness)>,

    /// ideal resolution, the platform may deliver something else
    resolution: Option<(u32, u32)>,

    /// device to pin, always exact
    device_id: Option<String>,
}

impl CameraCandidate {
    pub fn unconstrained() -> CameraCandidate {
        CameraCandidate::default()
    }

    pub fn with_facing(self, facing: FacingMode, strictness: Strictness) -> CameraCandidate {
        CameraCandidate {
            facing: Some((facing, strictness)),
            ..self
        }
    }

    pub fn with_resolution(self, width: u32, height: u32) -> CameraCandidate {
        CameraCandidate {
            resolution: Some((width, height)),
            ..self
        }
    }

    pub fn with_device(self, device_id: &str) -> CameraCandidate {
        CameraCandidate {
            device_id: Some(device_id.to_owned()),
            ..self
        }
    }

    pub fn facing(&self) -> Option<(FacingMode, Strictness)> {
        self.facing
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.facing.is_none() && self.resolution.is_none() && self.device_id.is_none()
    }
}

impl fmt::Display for CameraCandidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unconstrained() {
            return write!(f, "video: any");
        }
        let mut parts = Vec::new();
        if let Some(id) = &self.device_id {
            parts.push(format!("deviceId={} (exact)", id));
        }
        if let Some((facing, strictness)) = self.facing {
            parts.push(format!("facingMode={} ({})", facing, strictness));
        }
        if let Some((width, height)) = self.resolution {
            parts.push(format!("{}x{} (ideal)", width, height));
        }
        write!(f, "video: {}", parts.join(", "))
    }
}

/// The default acquisition chain, most specific first.
pub fn default_candidates(width: u32, height: u32) -> Vec<CameraCandidate> {
    vec![
        CameraCandidate::unconstrained()
            .with_facing(FacingMode::Environment, Strictness::Exact)
            .with_resolution(width, height),
        CameraCandidate::unconstrained()
            .with_facing(FacingMode::Environment, Strictness::Ideal)
            .with_resolution(width, height),
        CameraCandidate::unconstrained()
            .with_facing(FacingMode::User, Strictness::Ideal)
            .with_resolution(width, height),
        CameraCandidate::unconstrained(),
    ]
}

const REAR_LABEL_PATTERNS: [&str; 3] = ["back", "rear", "environment"];

/// Pick the video input that looks like a rear camera.
///
/// Matches labels containing back/rear/environment (case-insensitive); when
/// nothing matches, the last video input wins since phones tend to list the
/// rear cameras after the front one.
pub fn select_rear_device(devices: &[DeviceInfo]) -> Option<&DeviceInfo> {
    let videos: Vec<&DeviceInfo> = devices
        .iter()
        .filter(|d| d.kind == DeviceKind::VideoInput)
        .collect();

    videos
        .iter()
        .copied()
        .find(|d| {
            let label = d.label.to_lowercase();
            REAR_LABEL_PATTERNS.iter().any(|p| label.contains(p))
        })
        .or_else(|| videos.last().copied())
}

/// Which step of the chain produced the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionPath {
    /// Index into the candidate list
    Candidate(usize),
    /// Enumeration fallback, pinned to this device
    PinnedDevice(String),
    /// Enumeration fallback could not pin a device, warm-up stream kept
    WarmUp,
}

impl fmt::Display for AcquisitionPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AcquisitionPath::Candidate(idx) => write!(f, "candidate {}", idx + 1),
            AcquisitionPath::PinnedDevice(id) => write!(f, "pinned device {}", id),
            AcquisitionPath::WarmUp => write!(f, "warm-up stream"),
        }
    }
}

pub struct Acquired {
    pub stream: Arc<dyn MediaStream>,
    pub path: AcquisitionPath,
}

/// Resolves a live stream from an ordered candidate list
pub struct Negotiator<'a> {
    media: &'a dyn MediaDevices,
    candidates: &'a [CameraCandidate],
}

impl<'a> Negotiator<'a> {
    pub fn new(media: &'a dyn MediaDevices, candidates: &'a [CameraCandidate]) -> Negotiator<'a> {
        Negotiator { media, candidates }
    }

    /// Acquire a stream, or fail with [`Error::CameraUnavailable`] carrying
    /// the last error the platform reported.
    pub fn acquire_stream(&self) -> Result<Acquired, Error> {
        let mut last_error = None;

        for (idx, candidate) in self.candidates.iter().enumerate() {
            log::debug!("Requesting camera stream [{}]", candidate);
            match self.media.get_user_media(candidate) {
                Ok(stream) => {
                    log::info!("Camera stream {} opened with candidate {}", stream.id(), idx + 1);
                    return Ok(Acquired {
                        stream,
                        path: AcquisitionPath::Candidate(idx),
                    });
                }
                Err(err) => {
                    log::debug!("Candidate {} rejected: {}", idx + 1, err);
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = &last_error {
            log::warn!("All camera candidates rejected ({}), trying device enumeration", err);
        }
        self.enumeration_fallback().map_err(Error::CameraUnavailable)
    }

    /// Warm-up stream, enumerate, pin. Fails only if the warm-up request
    /// itself is rejected, with that rejection as the last error.
    fn enumeration_fallback(&self) -> Result<Acquired, MediaError> {
        let warm_up = self
            .media
            .get_user_media(&CameraCandidate::unconstrained())?;

        let devices = match self.media.enumerate_devices() {
            Ok(devices) => devices,
            Err(err) => {
                log::debug!("Device enumeration failed, keeping warm-up stream: {}", err);
                return Ok(Acquired {
                    stream: warm_up,
                    path: AcquisitionPath::WarmUp,
                });
            }
        };

        let device = match select_rear_device(&devices) {
            Some(device) => device,
            None => {
                log::debug!("No video inputs enumerated, keeping warm-up stream");
                return Ok(Acquired {
                    stream: warm_up,
                    path: AcquisitionPath::WarmUp,
                });
            }
        };

        log::debug!("Pinning device {} ({})", device.device_id, device.label);
        let pinned = CameraCandidate::unconstrained().with_device(&device.device_id);
        match self.media.get_user_media(&pinned) {
            Ok(stream) => {
                warm_up.stop_tracks();
                log::info!("Camera stream {} pinned to '{}'", stream.id(), device.label);
                Ok(Acquired {
                    stream,
                    path: AcquisitionPath::PinnedDevice(device.device_id.clone()),
                })
            }
            Err(err) => {
                log::debug!("Pinned request failed, keeping warm-up stream: {}", err);
                Ok(Acquired {
                    stream: warm_up,
                    path: AcquisitionPath::WarmUp,
                })
            }
        }
    }
}
