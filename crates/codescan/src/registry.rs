// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Process-wide session registry
//!
//! [`Scanner`] is the public entry point: [`Scanner::start`] checks the
//! environment, waits for the mount target, registers a new
//! [`ScanSession`] under a fresh [`Handle`] and drives it into scanning;
//! [`Scanner::stop`] cancels it by handle. The handle map is the only state
//! shared between sessions. Sessions remove themselves from it at the end of
//! their teardown.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex, Weak,
    },
};

use crate::{
    config::ScannerConfig,
    decode::SoftwareDecoderFactory,
    lock,
    media::MediaDevices,
    probe::DetectorPlatform,
    session::{ScanSession, SessionCallbacks, SessionState},
    stats::StatsSnapshot,
    surface::{self, Document, VideoSurface},
    Error, CAMERA_API_MISSING, INSECURE_CONTEXT,
};

/// Caller-visible session identifier
///
/// Handles count up from 1 and are never reused within a [`Scanner`].
/// [`Handle::INVALID`] (`-1`) is returned when a session could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(i64);

impl Handle {
    pub const INVALID: Handle = Handle(-1);

    pub fn from_raw(raw: i64) -> Handle {
        Handle(raw)
    }

    pub fn as_raw(&self) -> i64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the scanner needs from the host platform
#[derive(Clone)]
pub struct Platform {
    /// camera access is only offered in secure contexts
    pub secure_context: bool,
    /// `None` when the platform has no camera API at all
    pub media: Option<Arc<dyn MediaDevices>>,
    pub document: Arc<dyn Document>,
    pub detector: Option<Arc<dyn DetectorPlatform>>,
    pub software: Arc<dyn SoftwareDecoderFactory>,
}

#[derive(Default)]
struct Registry {
    sessions: Mutex<HashMap<Handle, Arc<ScanSession>>>,
}

impl Registry {
    fn insert(&self, session: Arc<ScanSession>) {
        lock(&self.sessions).insert(session.handle(), session);
    }

    fn remove(&self, handle: Handle) -> Option<Arc<ScanSession>> {
        lock(&self.sessions).remove(&handle)
    }

    fn get(&self, handle: Handle) -> Option<Arc<ScanSession>> {
        lock(&self.sessions).get(&handle).cloned()
    }
}

/// Starts, tracks and stops scanning sessions
///
/// Dropping the scanner stops every session it still tracks.
pub struct Scanner {
    platform: Platform,
    config: ScannerConfig,
    registry: Arc<Registry>,
    next_id: AtomicI64,
}

impl Scanner {
    pub fn new(platform: Platform) -> Scanner {
        Scanner::with_config(platform, ScannerConfig::default())
    }

    pub fn with_config(platform: Platform, config: ScannerConfig) -> Scanner {
        Scanner {
            platform,
            config,
            registry: Arc::new(Registry::default()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Start a session in the container `mount_id`.
    ///
    /// Blocks until the session is scanning (or ended). Exactly one of
    /// `on_result` and `on_error` may fire, at most once, possibly from a
    /// decode loop thread. Returns [`Handle::INVALID`] if the session failed
    /// before scanning; `on_error` has then been called.
    pub fn start<R, E>(&self, mount_id: &str, on_result: R, on_error: E) -> Handle
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.start_with(
            mount_id,
            SessionCallbacks::new().on_result(on_result).on_error(on_error),
        )
    }

    /// [`start`](Self::start) with optional callbacks.
    pub fn start_with(&self, mount_id: &str, callbacks: SessionCallbacks) -> Handle {
        self.open(mount_id, callbacks)
            .map_or(Handle::INVALID, |session| session.handle())
    }

    /// Like [`start_with`](Self::start_with) but hands back the session
    /// itself, which stays readable after it left the registry.
    ///
    /// On failure the error callback has already received the message and
    /// the same error is returned.
    pub fn open(
        &self,
        mount_id: &str,
        mut callbacks: SessionCallbacks,
    ) -> Result<Arc<ScanSession>, Error> {
        let media = match self.check_environment() {
            Ok(media) => media,
            Err(err) => return Err(reject(err, &mut callbacks)),
        };

        let container = match surface::wait_for_container(
            self.platform.document.as_ref(),
            mount_id,
            self.config.mount_attempts(),
            self.config.mount_poll_interval(),
        ) {
            Some(container) => container,
            None => {
                let err = Error::MountTargetMissing(mount_id.to_owned());
                return Err(reject(err, &mut callbacks));
            }
        };

        let handle = Handle(self.next_id.fetch_add(1, Ordering::SeqCst));
        let surface = VideoSurface::new(format!("codescan-video-{}", handle));
        surface.mount(container);

        let registry: Weak<Registry> = Arc::downgrade(&self.registry);
        let session = ScanSession::new(
            handle,
            surface,
            callbacks,
            Box::new(move |handle| {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(handle);
                    log::debug!("Session {} removed from registry", handle);
                }
            }),
        );
        self.registry.insert(session.clone());
        log::debug!("Session {} acquiring camera for '{}'", handle, mount_id);

        match session.launch(media.as_ref(), &self.platform, &self.config) {
            Ok(()) => Ok(session),
            Err(err) => {
                session.fail(err.clone());
                Err(err)
            }
        }
    }

    fn check_environment(&self) -> Result<Arc<dyn MediaDevices>, Error> {
        if !self.platform.secure_context {
            return Err(Error::EnvironmentUnsupported(INSECURE_CONTEXT));
        }
        self.platform
            .media
            .clone()
            .ok_or(Error::EnvironmentUnsupported(CAMERA_API_MISSING))
    }

    /// Stop the session behind `handle`. Unknown or finished handles are
    /// ignored.
    pub fn stop(&self, handle: Handle) {
        match self.registry.get(handle) {
            Some(session) => {
                session.stop();
            }
            None => log::trace!("Stop for unknown session {}", handle),
        }
    }

    /// Stop every live session.
    pub fn stop_all(&self) {
        let sessions: Vec<Arc<ScanSession>> = lock(&self.registry.sessions)
            .values()
            .cloned()
            .collect();
        if !sessions.is_empty() {
            log::debug!("Stopping {} active session(s)", sessions.len());
        }
        for session in sessions {
            session.stop();
        }
    }

    /// State of a live session; `None` once it left the registry.
    pub fn state(&self, handle: Handle) -> Option<SessionState> {
        self.registry.get(handle).map(|s| s.state())
    }

    pub fn stats(&self, handle: Handle) -> Option<StatsSnapshot> {
        self.registry.get(handle).map(|s| s.stats().snapshot())
    }

    pub fn active_count(&self) -> usize {
        lock(&self.registry.sessions).len()
    }

    pub fn active_handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = lock(&self.registry.sessions).keys().copied().collect();
        handles.sort();
        handles
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn reject(err: Error, callbacks: &mut SessionCallbacks) -> Error {
    log::warn!("Scan not started: {}", err);
    if let Some(on_error) = callbacks.on_error.take() {
        on_error(err.to_string());
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaStream;
    use crate::sim::SimPlatform;
    use crate::surface::Container;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_handle() {
        assert!(!Handle::INVALID.is_valid());
        assert_eq!(Handle::INVALID.as_raw(), -1);
        assert!(Handle::from_raw(1).is_valid());
        assert_eq!(Handle::from_raw(42).to_string(), "42");
    }

    #[test]
    fn test_insecure_context_rejected() {
        let sim = SimPlatform::builder().container("scanner").insecure().build();
        let scanner = Scanner::new(sim.platform());
        let (tx, rx) = mpsc::channel();

        let handle = scanner.start("scanner", |_| {}, move |m| tx.send(m).unwrap());
        assert_eq!(handle, Handle::INVALID);
        assert_eq!(rx.try_recv().unwrap(), INSECURE_CONTEXT);
        assert_eq!(sim.camera().request_count(), 0);
        assert_eq!(scanner.active_count(), 0);
    }

    #[test]
    fn test_missing_camera_api_rejected() {
        let sim = SimPlatform::builder().container("scanner").without_camera_api().build();
        let scanner = Scanner::new(sim.platform());
        let (tx, rx) = mpsc::channel();

        let handle = scanner.start("scanner", |_| {}, move |m| tx.send(m).unwrap());
        assert_eq!(handle, Handle::INVALID);
        assert_eq!(rx.try_recv().unwrap(), CAMERA_API_MISSING);

        let err = scanner.open("scanner", SessionCallbacks::new()).err().unwrap();
        assert!(matches!(err, Error::EnvironmentUnsupported(CAMERA_API_MISSING)));
    }

    #[test]
    fn test_handles_count_up_and_stop_all() {
        let sim = SimPlatform::builder().container("scanner").payloads([""]).build();
        let scanner = Scanner::new(sim.platform());

        let a = scanner.start_with("scanner", SessionCallbacks::new());
        let b = scanner.start_with("scanner", SessionCallbacks::new());
        assert_eq!(a.as_raw(), 1);
        assert_eq!(b.as_raw(), 2);
        assert_eq!(scanner.active_handles(), vec![a, b]);
        assert_eq!(scanner.state(a), Some(SessionState::Scanning));

        scanner.stop_all();
        assert_eq!(scanner.active_count(), 0);
        assert!(scanner.state(a).is_none());
        assert!(sim.camera().opened_streams().iter().all(|s| s.live_track_count() == 0));

        // unknown handles are ignored
        scanner.stop(Handle::from_raw(99));
        scanner.stop(Handle::INVALID);
    }

    #[test]
    fn test_drop_stops_sessions() {
        let sim = SimPlatform::builder().container("scanner").payloads([""]).build();
        {
            let scanner = Scanner::with_config(
                sim.platform(),
                ScannerConfig::default().with_mount_polling(1, Duration::from_millis(1)),
            );
            assert!(scanner.start_with("scanner", SessionCallbacks::new()).is_valid());
        }
        assert_eq!(sim.camera().opened_streams()[0].live_track_count(), 0);
        assert_eq!(sim.container("scanner").unwrap().child_count(), 0);
    }
}
