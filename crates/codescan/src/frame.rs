// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Video frames as seen by the decoders

use std::{
    fmt,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use unix_ts::Timestamp;

/// A single video frame grabbed from a live stream
///
/// Pixel data is shared, cloning a frame is cheap. The layout of `data` is
/// whatever the stream and the decoders agreed on; the scanner never looks
/// inside it.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    sequence: u64,
    timestamp: Timestamp,
    data: Arc<[u8]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, sequence: u64, data: impl Into<Arc<[u8]>>) -> Frame {
        Frame {
            width,
            height,
            sequence,
            timestamp: now(),
            data: data.into(),
        }
    }

    pub fn with_timestamp(self, timestamp: Timestamp) -> Frame {
        Frame { timestamp, ..self }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Monotonic frame counter assigned by the stream.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A frame without dimensions carries nothing a decoder can use yet.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} {}x{} {} bytes",
            self.sequence,
            self.width,
            self.height,
            self.data.len()
        )
    }
}

fn now() -> Timestamp {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Timestamp::new(elapsed.as_secs() as i64, elapsed.subsec_nanos())
}
