// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! JSON scenario files describing a simulated host.
//!
//! ```json
//! {
//!   "containers": ["scanner"],
//!   "camera": {
//!     "responses": ["overconstrained", "deny", "deny", "deny"],
//!     "devices": [{ "id": "cam-1", "label": "Back Camera" }]
//!   },
//!   "frames": { "payloads": ["", "4006381333931"], "interval_ms": 40 },
//!   "detector": { "supported_formats": ["qr_code", "ean_13"] }
//! }
//! ```
//!
//! Every field is optional. A missing `detector` means the platform has one
//! with default formats; `"detector": null` removes it.

use crate::error::CliError;
use codescan::{
    format::BarcodeFormat,
    media::{DeviceInfo, FocusMode, MediaError},
    sim::{FrameScript, Response, SimCamera, SimDetectorPlatform, SimFrameDecoder, SimPlatform},
};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "yes")]
    pub secure_context: bool,

    #[serde(default = "yes")]
    pub camera_api: bool,

    #[serde(default)]
    pub containers: Vec<ContainerSpec>,

    #[serde(default)]
    pub camera: CameraSpec,

    #[serde(default)]
    pub frames: FramesSpec,

    #[serde(default = "default_detector")]
    pub detector: Option<DetectorSpec>,

    /// Per-attempt latency of the software decoder
    #[serde(default)]
    pub decoder_latency_ms: u64,
}

/// A container id, optionally appearing late
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContainerSpec {
    Id(String),
    Delayed { id: String, delay_ms: u64 },
}

impl ContainerSpec {
    pub fn id(&self) -> &str {
        match self {
            ContainerSpec::Id(id) => id,
            ContainerSpec::Delayed { id, .. } => id,
        }
    }

    fn delay(&self) -> Duration {
        match self {
            ContainerSpec::Id(_) => Duration::ZERO,
            ContainerSpec::Delayed { delay_ms, .. } => Duration::from_millis(*delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSpec {
    Grant,
    Deny,
    Overconstrained,
    NotFound,
    NotReadable,
}

impl From<ResponseSpec> for Response {
    fn from(spec: ResponseSpec) -> Self {
        match spec {
            ResponseSpec::Grant => Response::Grant,
            ResponseSpec::Deny => Response::deny(),
            ResponseSpec::Overconstrained => Response::overconstrained(),
            ResponseSpec::NotFound => {
                Response::Deny(MediaError::not_found("Requested device not found"))
            }
            ResponseSpec::NotReadable => Response::not_readable(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSpec {
    /// Answers to the first requests, in order
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,

    /// Answer once `responses` ran out
    #[serde(default = "grant")]
    pub default: ResponseSpec,

    /// `None` makes enumeration fail
    #[serde(default = "no_devices")]
    pub devices: Option<Vec<DeviceSpec>>,

    #[serde(default = "continuous_focus")]
    pub focus_modes: Vec<String>,
}

impl Default for CameraSpec {
    fn default() -> Self {
        CameraSpec {
            responses: Vec::new(),
            default: grant(),
            devices: no_devices(),
            focus_modes: continuous_focus(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FramesSpec {
    #[serde(default)]
    pub payloads: Vec<String>,
    #[serde(default = "frame_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub warmup_ms: u64,
}

impl Default for FramesSpec {
    fn default() -> Self {
        FramesSpec {
            payloads: Vec::new(),
            interval_ms: frame_interval_ms(),
            warmup_ms: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorSpec {
    #[serde(default = "yes")]
    pub available: bool,
    /// `None` makes the supported format query fail
    #[serde(default)]
    pub supported_formats: Option<Vec<String>>,
    #[serde(default)]
    pub fail_construction: bool,
    #[serde(default)]
    pub latency_ms: u64,
}

fn yes() -> bool {
    true
}

fn grant() -> ResponseSpec {
    ResponseSpec::Grant
}

fn no_devices() -> Option<Vec<DeviceSpec>> {
    Some(Vec::new())
}

fn continuous_focus() -> Vec<String> {
    vec!["continuous".to_string()]
}

fn frame_interval_ms() -> u64 {
    33
}

fn default_detector() -> Option<DetectorSpec> {
    Some(DetectorSpec {
        available: true,
        ..DetectorSpec::default()
    })
}

fn parse_focus_mode(name: &str) -> Result<FocusMode, CliError> {
    match name {
        "none" => Ok(FocusMode::None),
        "manual" => Ok(FocusMode::Manual),
        "single-shot" => Ok(FocusMode::SingleShot),
        "continuous" => Ok(FocusMode::Continuous),
        other => Err(CliError::InvalidArgs(format!("Unknown focus mode: {}", other))),
    }
}

fn parse_formats(names: &[String]) -> Result<Vec<BarcodeFormat>, CliError> {
    names
        .iter()
        .map(|name| {
            name.parse::<BarcodeFormat>()
                .map_err(|e| CliError::InvalidArgs(e.to_string()))
        })
        .collect()
}

impl Scenario {
    /// Read and validate a scenario file
    pub fn load(path: &Path) -> Result<Scenario, CliError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CliError::InvalidArgs(format!("Cannot read scenario {}: {}", path.display(), e))
        })?;
        let scenario = Scenario::parse(&text).map_err(|e| match e {
            CliError::InvalidArgs(msg) => {
                CliError::InvalidArgs(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        log::debug!("Loaded scenario {}", path.display());
        Ok(scenario)
    }

    pub fn parse(text: &str) -> Result<Scenario, CliError> {
        let scenario: Scenario = serde_json::from_str(text)
            .map_err(|e| CliError::InvalidArgs(format!("Invalid scenario: {}", e)))?;
        scenario.camera_spec()?;
        scenario.detector_platform()?;
        Ok(scenario)
    }

    fn camera_spec(&self) -> Result<SimCamera, CliError> {
        let focus_modes = self
            .camera
            .focus_modes
            .iter()
            .map(|m| parse_focus_mode(m))
            .collect::<Result<Vec<_>, _>>()?;

        let camera = SimCamera::new()
            .with_responses(self.camera.responses.iter().map(|r| Response::from(*r)))
            .with_default(self.camera.default.into())
            .with_focus_modes(focus_modes);

        Ok(match &self.camera.devices {
            Some(devices) => camera.with_devices(self.device_infos(devices)),
            None => camera.without_enumeration(),
        })
    }

    fn device_infos(&self, devices: &[DeviceSpec]) -> Vec<DeviceInfo> {
        devices
            .iter()
            .map(|d| DeviceInfo::video(d.id.as_str(), d.label.as_str()))
            .collect()
    }

    fn detector_platform(&self) -> Result<Option<SimDetectorPlatform>, CliError> {
        let spec = match &self.detector {
            Some(spec) => spec,
            None => return Ok(None),
        };

        let mut platform = if spec.available {
            SimDetectorPlatform::new()
        } else {
            SimDetectorPlatform::unavailable()
        };
        if let Some(names) = &spec.supported_formats {
            platform = platform.with_supported(parse_formats(names)?);
        }
        if spec.fail_construction {
            platform = platform.failing_construction();
        }
        Ok(Some(
            platform.with_latency(Duration::from_millis(spec.latency_ms)),
        ))
    }

    /// Build the simulated platform this scenario describes
    pub fn build(&self) -> Result<SimPlatform, CliError> {
        let script = FrameScript::new(self.frames.payloads.iter().cloned())
            .with_interval(Duration::from_millis(self.frames.interval_ms))
            .with_warmup(Duration::from_millis(self.frames.warmup_ms));

        let mut builder = SimPlatform::builder()
            .camera(self.camera_spec()?)
            .script(script)
            .decoder(
                SimFrameDecoder::new().with_latency(Duration::from_millis(self.decoder_latency_ms)),
            );

        for container in &self.containers {
            builder = builder.container_after(container.id(), container.delay());
        }
        builder = match self.detector_platform()? {
            Some(detector) => builder.detector(detector),
            None => builder.without_detector(),
        };
        if !self.secure_context {
            builder = builder.insecure();
        }
        if !self.camera_api {
            builder = builder.without_camera_api();
        }

        Ok(builder.build())
    }
}
