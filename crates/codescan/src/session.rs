// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Scan session coordinator
//!
//! A [`ScanSession`] owns one scanning attempt: the negotiated stream, the
//! mounted [`VideoSurface`] and up to two decode loops. Its life follows
//!
//! ```text
//! Acquiring -> Scanning -> { Completed | Stopped | Failed }
//!     \_____________________________/^
//! ```
//!
//! Every terminal transition goes through one latch (`emitted`), flipped
//! with a compare-and-swap: whichever of the two decode loops, an external
//! stop or an acquisition failure gets there first decides the outcome, and
//! everyone else becomes a no-op. The caller therefore sees at most one
//! result or one error, never both.
//!
//! Teardown releases resources in this order, and may run any number of
//! times from any thread:
//!
//! 1. detach the stream from the surface, so no loop can read another frame
//! 2. stop every stream track
//! 3. remove the surface from its container
//! 4. reset the software reader and cancel the hardware loop
//! 5. remove the session from the registry

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, Weak,
    },
};

use crate::{
    camera::Negotiator,
    config::ScannerConfig,
    decode::{
        first_payload, BatchCallback, DecodeError, DecodeResult, DecodeSource, HardwareLoop,
        ResultSink, SoftwareDecoder,
    },
    lock,
    media::{MediaDevices, MediaStream},
    probe,
    registry::{Handle, Platform},
    stats::SessionStats,
    surface::VideoSurface,
    tuner, Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Acquiring,
    Scanning,
    Completed,
    Stopped,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Stopped | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Scanning => write!(f, "scanning"),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

pub type ResultCallback = Box<dyn FnOnce(String) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(String) + Send>;

/// Caller callbacks, both optional
///
/// Stored as `FnOnce`: each can fire at most once by construction, and the
/// session drops both as soon as either fires.
#[derive(Default)]
pub struct SessionCallbacks {
    pub on_result: Option<ResultCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl SessionCallbacks {
    pub fn new() -> SessionCallbacks {
        SessionCallbacks::default()
    }

    pub fn on_result<F>(self, callback: F) -> SessionCallbacks
    where
        F: FnOnce(String) + Send + 'static,
    {
        SessionCallbacks {
            on_result: Some(Box::new(callback)),
            ..self
        }
    }

    pub fn on_error<F>(self, callback: F) -> SessionCallbacks
    where
        F: FnOnce(String) + Send + 'static,
    {
        SessionCallbacks {
            on_error: Some(Box::new(callback)),
            ..self
        }
    }
}

#[derive(Default)]
struct Resources {
    stream: Option<Arc<dyn MediaStream>>,
    software: Option<Arc<dyn SoftwareDecoder>>,
    hardware: Option<Arc<HardwareLoop>>,
}

type TeardownHook = Box<dyn FnOnce(Handle) + Send>;

/// One end-to-end scanning attempt
pub struct ScanSession {
    handle: Handle,
    state: Mutex<SessionState>,
    /// one-way latch guarding every terminal transition
    emitted: AtomicBool,
    surface: Arc<VideoSurface>,
    resources: Mutex<Resources>,
    callbacks: Mutex<SessionCallbacks>,
    stats: Arc<SessionStats>,
    on_teardown: Mutex<Option<TeardownHook>>,
}

impl ScanSession {
    pub(crate) fn new(
        handle: Handle,
        surface: Arc<VideoSurface>,
        callbacks: SessionCallbacks,
        on_teardown: TeardownHook,
    ) -> Arc<ScanSession> {
        Arc::new(ScanSession {
            handle,
            state: Mutex::new(SessionState::Acquiring),
            emitted: AtomicBool::new(false),
            surface,
            resources: Mutex::new(Resources::default()),
            callbacks: Mutex::new(callbacks),
            stats: Arc::new(SessionStats::new()),
            on_teardown: Mutex::new(Some(on_teardown)),
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_terminal(&self) -> bool {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    pub fn surface(&self) -> &Arc<VideoSurface> {
        &self.surface
    }

    /// Trip the latch into `terminal`. Only the first caller gets `true`.
    fn finish(&self, terminal: SessionState) -> bool {
        let mut state = lock(&self.state);
        if self
            .emitted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        log::debug!("Session {}: {} -> {}", self.handle, *state, terminal);
        *state = terminal;
        true
    }

    fn take_callbacks(&self) -> SessionCallbacks {
        std::mem::take(&mut *lock(&self.callbacks))
    }

    /// Negotiate the stream, mount it and start the decode loops.
    ///
    /// Returns once scanning runs. An external stop at any point is honored:
    /// whatever was acquired after it is released immediately.
    pub(crate) fn launch(
        self: &Arc<Self>,
        media: &dyn MediaDevices,
        platform: &Platform,
        config: &ScannerConfig,
    ) -> Result<(), Error> {
        let candidates = config.candidates();
        let acquired = Negotiator::new(media, &candidates).acquire_stream()?;
        self.stats.set_acquisition(acquired.path.clone());
        let stream = acquired.stream;

        {
            let mut resources = lock(&self.resources);
            if self.is_terminal() {
                log::debug!("Session {} ended during acquisition, releasing stream", self.handle);
                stream.stop_tracks();
                return Ok(());
            }
            self.surface.attach_stream(stream.clone());
            resources.stream = Some(stream.clone());
        }

        let tuning = tuner::tune(stream, config.tuning_timeout());
        self.stats.set_tuning(tuning);

        let capabilities = if config.hardware() {
            probe::probe(platform.detector.as_deref(), config.formats())
        } else {
            probe::probe(None, config.formats())
        };
        self.stats.set_hardware_enabled(capabilities.hardware.is_some());

        let software = platform.software.create(&config.decode_hints());
        let hardware = capabilities.hardware.as_ref().map(|_| HardwareLoop::new());

        {
            let mut resources = lock(&self.resources);
            let mut state = lock(&self.state);
            if self.is_terminal() {
                return Ok(());
            }
            resources.software = Some(software.clone());
            resources.hardware = hardware.clone();
            *state = SessionState::Scanning;
        }
        log::info!(
            "Session {} scanning with {} decode loop(s)",
            self.handle,
            capabilities.loop_count()
        );

        let sink: Arc<dyn ResultSink> = Arc::new(SessionSink(Arc::downgrade(self)));

        if let Err(err) = software.decode_continuously(self.surface.clone(), self.batch_callback(sink.clone())) {
            log::warn!("Session {}: software reader failed to start: {}", self.handle, err);
        }

        if let (Some(hw), Some(cap)) = (&hardware, capabilities.hardware) {
            if let Err(err) = hw.start(
                cap.detector,
                self.surface.clone(),
                sink,
                self.stats.clone(),
                config.frame_interval(),
            ) {
                log::warn!("Session {}: hardware loop failed to start: {}", self.handle, err);
            }
        }

        // a loop may have been stored after teardown already emptied the slots
        if self.is_terminal() {
            software.reset();
            if let Some(hw) = &hardware {
                hw.cancel();
            }
        }

        Ok(())
    }

    fn batch_callback(&self, sink: Arc<dyn ResultSink>) -> BatchCallback {
        let stats = self.stats.clone();
        Box::new(move |batch: Result<Vec<String>, DecodeError>| {
            stats.record_software_batch();
            match batch {
                Ok(texts) => {
                    match first_payload(texts.iter().map(String::as_str), DecodeSource::Software) {
                        Some(result) => {
                            sink.offer(result);
                        }
                        None => stats.record_empty_payload(),
                    }
                }
                Err(err) => {
                    stats.record_transient_error();
                    log::trace!("{}", Error::TransientDecode(err));
                }
            }
        })
    }

    /// Deliver `result` if nothing else ended the session first.
    pub fn emit(&self, result: DecodeResult) -> bool {
        if !self.finish(SessionState::Completed) {
            log::trace!(
                "Session {}: discarding {} result, already finished",
                self.handle,
                result.source()
            );
            return false;
        }

        self.stats.set_winner(result.source());
        log::info!(
            "Session {} scanned '{}' ({})",
            self.handle,
            result.payload(),
            result.source()
        );

        if let Some(on_result) = self.take_callbacks().on_result {
            on_result(result.into_payload());
        }
        self.teardown();
        true
    }

    /// End the session with a reportable error.
    pub(crate) fn fail(&self, err: Error) -> bool {
        if !self.finish(SessionState::Failed) {
            return false;
        }

        log::warn!("Session {} failed: {}", self.handle, err);
        if let Some(on_error) = self.take_callbacks().on_error {
            on_error(err.to_string());
        }
        self.teardown();
        true
    }

    /// Stop without delivering anything. Returns false if already finished.
    pub fn stop(&self) -> bool {
        if !self.finish(SessionState::Stopped) {
            return false;
        }

        log::info!("Session {} stopped", self.handle);
        drop(self.take_callbacks());
        self.teardown();
        true
    }

    /// Release everything the session holds. Idempotent.
    pub fn teardown(&self) {
        let (stream, software, hardware) = {
            let mut resources = lock(&self.resources);
            let detached = self.surface.detach_stream();
            (
                resources.stream.take().or(detached),
                resources.software.take(),
                resources.hardware.take(),
            )
        };

        if let Some(hardware) = &hardware {
            hardware.cancel();
        }
        if let Some(stream) = &stream {
            stream.stop_tracks();
            log::debug!("Session {}: stream {} released", self.handle, stream.id());
        }
        self.surface.unmount();
        if let Some(software) = &software {
            software.reset();
        }

        let hook = lock(&self.on_teardown).take();
        if let Some(hook) = hook {
            hook(self.handle);
        }
    }
}

/// Decode loops report here; holds the session weakly so loops never keep a
/// finished session alive.
struct SessionSink(Weak<ScanSession>);

impl ResultSink for SessionSink {
    fn offer(&self, result: DecodeResult) -> bool {
        match self.0.upgrade() {
            Some(session) => session.emit(result),
            None => false,
        }
    }

    fn is_open(&self) -> bool {
        self.0.upgrade().is_some_and(|s| !s.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{FrameScript, SimDocument, SimStream};
    use crate::surface::{Container, Document};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    struct Probe {
        session: Arc<ScanSession>,
        results: Arc<Mutex<Vec<String>>>,
        errors: Arc<Mutex<Vec<String>>>,
        removed: Arc<AtomicUsize>,
    }

    fn session_with_stream() -> (Probe, Arc<SimStream>, Arc<crate::sim::SimContainer>) {
        let document = SimDocument::new();
        let container = document.add_container("scanner");
        let surface = VideoSurface::new("video-1");
        surface.mount(document.get_element_by_id("scanner").unwrap());

        let results = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let removed = Arc::new(AtomicUsize::new(0));
        let (r, e, rm) = (results.clone(), errors.clone(), removed.clone());

        let session = ScanSession::new(
            Handle::from_raw(1),
            surface,
            SessionCallbacks::new()
                .on_result(move |p| r.lock().unwrap().push(p))
                .on_error(move |m| e.lock().unwrap().push(m)),
            Box::new(move |_| {
                rm.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let stream = SimStream::new("s1", None, FrameScript::new(["x"]));
        session.surface.attach_stream(stream.clone());
        lock(&session.resources).stream = Some(stream.clone() as Arc<dyn MediaStream>);

        (
            Probe {
                session,
                results,
                errors,
                removed,
            },
            stream,
            container,
        )
    }

    #[test]
    fn test_emit_once_then_teardown() {
        let (probe, stream, container) = session_with_stream();
        let first = DecodeResult::new(" 123 ", DecodeSource::Software).unwrap();
        let second = DecodeResult::new("456", DecodeSource::Hardware).unwrap();

        assert!(probe.session.emit(first));
        assert!(!probe.session.emit(second));
        assert!(!probe.session.stop());

        assert_eq!(*probe.results.lock().unwrap(), vec!["123".to_string()]);
        assert!(probe.errors.lock().unwrap().is_empty());
        assert_eq!(probe.session.state(), SessionState::Completed);
        assert_eq!(stream.live_track_count(), 0);
        assert_eq!(container.child_count(), 0);
        assert_eq!(probe.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_delivers_nothing() {
        let (probe, stream, container) = session_with_stream();
        assert!(probe.session.stop());
        assert!(!probe.session.stop());
        assert!(!probe.session.emit(DecodeResult::new("late", DecodeSource::Software).unwrap()));
        assert!(!probe.session.fail(Error::MountTargetMissing("x".into())));

        assert!(probe.results.lock().unwrap().is_empty());
        assert!(probe.errors.lock().unwrap().is_empty());
        assert_eq!(probe.session.state(), SessionState::Stopped);
        assert_eq!(stream.live_track_count(), 0);
        assert_eq!(container.child_count(), 0);
        assert!(probe.session.surface().frame().is_none());
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (probe, stream, _container) = session_with_stream();
        probe.session.teardown();
        probe.session.teardown();
        assert_eq!(stream.live_track_count(), 0);
        assert_eq!(probe.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fail_reports_once() {
        let (probe, _stream, _container) = session_with_stream();
        assert!(probe.session.fail(Error::CameraUnavailable(crate::MediaError::not_allowed("denied"))));
        assert!(!probe.session.emit(DecodeResult::new("1", DecodeSource::Software).unwrap()));
        assert_eq!(
            *probe.errors.lock().unwrap(),
            vec!["NotAllowedError: denied".to_string()]
        );
        assert!(probe.results.lock().unwrap().is_empty());
        assert_eq!(probe.session.state(), SessionState::Failed);
    }

    #[test]
    fn test_concurrent_emitters_single_winner() {
        for _ in 0..50 {
            let (probe, _stream, _container) = session_with_stream();
            let barrier = Arc::new(Barrier::new(3));
            let wins = Arc::new(AtomicUsize::new(0));

            let workers: Vec<_> = [DecodeSource::Hardware, DecodeSource::Software]
                .into_iter()
                .map(|source| {
                    let session = probe.session.clone();
                    let barrier = barrier.clone();
                    let wins = wins.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        if session.emit(DecodeResult::new("SAME", source).unwrap()) {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            let stopper = {
                let session = probe.session.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    session.stop()
                })
            };

            for w in workers {
                w.join().unwrap();
            }
            let stopped = stopper.join().unwrap();

            let delivered = probe.results.lock().unwrap().len();
            assert_eq!(wins.load(Ordering::SeqCst) + usize::from(stopped), 1);
            assert_eq!(delivered, wins.load(Ordering::SeqCst));
            assert_eq!(probe.removed.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_sink_closes_with_session() {
        let (probe, _stream, _container) = session_with_stream();
        let sink = SessionSink(Arc::downgrade(&probe.session));
        assert!(sink.is_open());
        probe.session.stop();
        assert!(!sink.is_open());

        let orphan = SessionSink(Weak::new());
        assert!(!orphan.is_open());
        assert!(!orphan.offer(DecodeResult::new("x", DecodeSource::Hardware).unwrap()));
    }
}
