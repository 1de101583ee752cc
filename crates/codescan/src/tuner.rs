// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Track tuning
//!
//! Asks the primary video track for continuous autofocus when it reports
//! support for it. Tuning is best-effort: a track that rejects the
//! constraint, or does not answer within `tuning_timeout`, leaves the session
//! scanning with the camera's own settings.

use std::{
    fmt,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use crate::{
    media::{FocusMode, MediaStream, MediaTrack, TrackConstraints},
    Error,
};

/// Outcome of a tuning attempt, for logs and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tuning {
    /// Continuous autofocus was requested and accepted
    ContinuousFocus,
    /// The track offers nothing worth adjusting
    Unchanged,
    /// The attempt failed or did not finish in time
    Skipped,
}

impl fmt::Display for Tuning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tuning::ContinuousFocus => write!(f, "continuous-focus"),
            Tuning::Unchanged => write!(f, "unchanged"),
            Tuning::Skipped => write!(f, "skipped"),
        }
    }
}

/// Constraints worth applying given what the track reports.
pub fn constraints_for(track: &dyn MediaTrack) -> TrackConstraints {
    let caps = track.capabilities();
    TrackConstraints {
        focus_mode: caps
            .focus_modes
            .contains(&FocusMode::Continuous)
            .then_some(FocusMode::Continuous),
    }
}

/// Request continuous autofocus on the primary video track.
pub fn try_tune(stream: &dyn MediaStream) -> Result<Tuning, Error> {
    let track = match stream.video_tracks().into_iter().next() {
        Some(track) => track,
        None => return Ok(Tuning::Unchanged),
    };

    let constraints = constraints_for(track.as_ref());
    if constraints.is_empty() {
        return Ok(Tuning::Unchanged);
    }

    track
        .apply_constraints(&constraints)
        .map_err(Error::TuningUnsupported)?;
    Ok(Tuning::ContinuousFocus)
}

/// Best-effort [`try_tune`] bounded by `timeout`.
///
/// Never fails. A track that takes longer than `timeout` to accept its
/// constraints is left to finish on its own thread, which keeps the stream
/// alive until then. That thread may call `apply_constraints` on a track the
/// session has already stopped; it never reads frames.
pub fn tune(stream: Arc<dyn MediaStream>, timeout: Duration) -> Tuning {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("codescan-tune".into())
        .spawn(move || {
            let _ = tx.send(try_tune(stream.as_ref()));
        });

    if let Err(err) = spawned {
        log::debug!("Could not spawn tuning thread: {}", err);
        return Tuning::Skipped;
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(tuning)) => {
            log::debug!("Track tuning: {:?}", tuning);
            tuning
        }
        Ok(Err(err)) => {
            log::debug!("{}", err);
            Tuning::Skipped
        }
        Err(_) => {
            log::debug!("Track tuning did not finish within {:?}", timeout);
            Tuning::Skipped
        }
    }
}
