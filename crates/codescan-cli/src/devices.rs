// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Video input enumeration of a scenario's camera.

use crate::error::CliError;
use crate::scenario::Scenario;
use clap::Args as ClapArgs;
use codescan::{
    camera::select_rear_device,
    media::{DeviceKind, MediaDevices},
    CAMERA_API_MISSING,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Scenario file describing the simulated camera
    #[arg(short, long)]
    scenario: PathBuf,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    devices: Vec<DeviceEntry>,
    /// device the enumeration fallback would pin
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeviceEntry {
    id: String,
    label: String,
    rear: bool,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let scenario = Scenario::load(&args.scenario)?;
    if !scenario.camera_api {
        return Err(CliError::EnvironmentUnsupported(CAMERA_API_MISSING.to_string()));
    }
    let sim = scenario.build()?;

    let devices = sim
        .camera()
        .enumerate_devices()
        .map_err(|e| CliError::General(format!("Failed to enumerate devices: {}", e)))?;
    let selected = select_rear_device(&devices).map(|d| d.device_id.clone());

    let output = DevicesOutput {
        devices: devices
            .iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .map(|d| DeviceEntry {
                id: d.device_id.clone(),
                label: d.label.clone(),
                rear: selected.as_deref() == Some(d.device_id.as_str()),
            })
            .collect(),
        selected,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_output(&output);
    }

    Ok(())
}

fn print_text_output(output: &DevicesOutput) {
    println!("Video inputs ({}):", output.devices.len());
    for device in &output.devices {
        let label = if device.label.is_empty() {
            "(no label)"
        } else {
            device.label.as_str()
        };
        println!(
            "  {} {}: {}",
            if device.rear { "*" } else { " " },
            device.id,
            label
        );
    }
    if let Some(id) = &output.selected {
        println!();
        println!("Fallback pins: {}", id);
    }
}
