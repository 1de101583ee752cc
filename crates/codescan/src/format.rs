// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::{fmt, str::FromStr};

/// Barcode symbology
///
/// Names follow the platform barcode detection vocabulary (`ean_13`,
/// `qr_code`, ...) so they can be exchanged with detectors verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Code39,
    Itf,
    Codabar,
    QrCode,
}

/// Formats the scanner asks every decoder to look for.
///
/// Linear retail and logistics symbologies plus QR.
pub const RECOGNIZED_FORMATS: [BarcodeFormat; 9] = [
    BarcodeFormat::Ean13,
    BarcodeFormat::Ean8,
    BarcodeFormat::UpcA,
    BarcodeFormat::UpcE,
    BarcodeFormat::Code128,
    BarcodeFormat::Code39,
    BarcodeFormat::Itf,
    BarcodeFormat::Codabar,
    BarcodeFormat::QrCode,
];

impl BarcodeFormat {
    pub fn name(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Itf => "itf",
            BarcodeFormat::Codabar => "codabar",
            BarcodeFormat::QrCode => "qr_code",
        }
    }

    /// True for 2D matrix symbologies.
    pub fn is_matrix(&self) -> bool {
        matches!(self, BarcodeFormat::QrCode)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown format name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown barcode format: {}", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for BarcodeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RECOGNIZED_FORMATS
            .iter()
            .copied()
            .find(|f| f.name() == normalized || f.name().replace('_', "") == normalized)
            .ok_or_else(|| UnknownFormat(s.to_owned()))
    }
}

/// Restrict `supported` to the formats in `wanted`, keeping `wanted` order.
pub fn intersect(wanted: &[BarcodeFormat], supported: &[BarcodeFormat]) -> Vec<BarcodeFormat> {
    wanted
        .iter()
        .copied()
        .filter(|f| supported.contains(f))
        .collect()
}
