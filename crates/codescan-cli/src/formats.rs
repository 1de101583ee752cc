// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use clap::Args as ClapArgs;
use codescan::format::{BarcodeFormat, RECOGNIZED_FORMATS};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {}

#[derive(Debug, Serialize)]
struct FormatEntry {
    name: &'static str,
    kind: &'static str,
}

fn entry(format: BarcodeFormat) -> FormatEntry {
    FormatEntry {
        name: format.name(),
        kind: if format.is_matrix() { "matrix" } else { "linear" },
    }
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing formats command: {:?}", args);

    let formats: Vec<FormatEntry> = RECOGNIZED_FORMATS.iter().copied().map(entry).collect();

    if json {
        let json_str = serde_json::to_string_pretty(&formats)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("Recognized formats ({}):", formats.len());
        for format in &formats {
            println!("  {:<10} {}", format.name, format.kind);
        }
    }

    Ok(())
}
