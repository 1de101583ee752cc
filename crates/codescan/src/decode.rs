// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Hardware and software decode loops
//!
//! Two independent strategies poll the same [`VideoSurface`]:
//!
//! - the **software loop** runs a general purpose multi-format reader in
//!   continuous mode ([`SoftwareDecoder::decode_continuously`]) until it is
//!   explicitly [`reset`](SoftwareDecoder::reset);
//! - the **hardware loop** ([`HardwareLoop`]) ticks once per rendered frame
//!   and hands the frame to a single-shot [`HardwareDetector`], never
//!   starting a detection while the previous one is still in flight.
//!
//! Both report through one [`ResultSink`] owned by the session. Decode
//! failures are transient: they are counted, logged at trace level and the
//! loop keeps going.

use std::{
    error, fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    format::{BarcodeFormat, RECOGNIZED_FORMATS},
    frame::Frame,
    lock,
    stats::SessionStats,
    surface::VideoSurface,
};

/// A failed decode or detection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> DecodeError {
        DecodeError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::new(err.to_string())
    }
}

/// Which loop produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeSource {
    Hardware,
    Software,
}

impl fmt::Display for DecodeSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeSource::Hardware => write!(f, "hardware"),
            DecodeSource::Software => write!(f, "software"),
        }
    }
}

/// A decoded, trimmed, non-empty payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    payload: String,
    source: DecodeSource,
}

impl DecodeResult {
    /// Trim `raw`; blank payloads yield `None`.
    pub fn new(raw: &str, source: DecodeSource) -> Option<DecodeResult> {
        let payload = raw.trim();
        if payload.is_empty() {
            return None;
        }
        Some(DecodeResult {
            payload: payload.to_owned(),
            source,
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn source(&self) -> DecodeSource {
        self.source
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

/// First non-blank value of a batch, in iteration order.
pub fn first_payload<'a, I>(values: I, source: DecodeSource) -> Option<DecodeResult>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .find_map(|value| DecodeResult::new(value, source))
}

/// Where decode loops deliver their payloads
pub trait ResultSink: Send + Sync {
    /// Offer a result. Returns true if it was accepted.
    fn offer(&self, result: DecodeResult) -> bool;

    /// False once the sink accepts nothing more; loops stop polling.
    fn is_open(&self) -> bool;
}

/// One barcode found by the hardware detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBarcode {
    pub raw_value: String,
    pub format: Option<BarcodeFormat>,
}

/// Native single-shot barcode detector
pub trait HardwareDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedBarcode>, DecodeError>;
}

/// Configuration handed to the software reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeHints {
    pub try_harder: bool,
    pub possible_formats: Vec<BarcodeFormat>,
    /// pause between two continuous-mode attempts
    pub scan_interval: Duration,
}

impl Default for DecodeHints {
    fn default() -> Self {
        DecodeHints {
            try_harder: true,
            possible_formats: RECOGNIZED_FORMATS.to_vec(),
            scan_interval: Duration::from_millis(200),
        }
    }
}

/// Opaque single-shot multi-format decoder
///
/// Returns every text found in the frame; an empty vector means nothing was
/// found.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &Frame, hints: &DecodeHints) -> Result<Vec<String>, DecodeError>;
}

/// Receives each continuous-mode attempt that produced output or failed.
pub type BatchCallback = Box<dyn Fn(Result<Vec<String>, DecodeError>) + Send + Sync>;

/// Software decoder with a continuous-mode subscription
pub trait SoftwareDecoder: Send + Sync {
    /// Start decoding frames from `surface`, reporting through `on_batch`
    /// until [`reset`](Self::reset). Must not invoke `on_batch` before
    /// returning.
    fn decode_continuously(
        &self,
        surface: Arc<VideoSurface>,
        on_batch: BatchCallback,
    ) -> Result<(), DecodeError>;

    /// Stop consuming frames. Safe to call repeatedly, from any thread,
    /// including from inside `on_batch`.
    fn reset(&self);
}

/// Builds one software decoder per session
pub trait SoftwareDecoderFactory: Send + Sync {
    fn create(&self, hints: &DecodeHints) -> Arc<dyn SoftwareDecoder>;
}

struct ReaderThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReaderThread {
    fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.thread().unpark();
        join_unless_current(self.handle);
    }
}

/// Continuous-mode reader polling a surface on its own thread
///
/// Every `scan_interval` the current frame is handed to the wrapped
/// [`FrameDecoder`].
pub struct MultiFormatReader {
    decoder: Arc<dyn FrameDecoder>,
    hints: DecodeHints,
    running: Mutex<Option<ReaderThread>>,
}

impl MultiFormatReader {
    pub fn new(decoder: Arc<dyn FrameDecoder>, hints: DecodeHints) -> MultiFormatReader {
        MultiFormatReader {
            decoder,
            hints,
            running: Mutex::new(None),
        }
    }

    pub fn hints(&self) -> &DecodeHints {
        &self.hints
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running).is_some()
    }
}

impl SoftwareDecoder for MultiFormatReader {
    fn decode_continuously(
        &self,
        surface: Arc<VideoSurface>,
        on_batch: BatchCallback,
    ) -> Result<(), DecodeError> {
        let mut running = lock(&self.running);
        if running.is_some() {
            return Err(DecodeError::new("reader is already decoding continuously"));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let decoder = self.decoder.clone();
        let hints = self.hints.clone();

        let handle = thread::Builder::new()
            .name("codescan-reader".into())
            .spawn(move || {
                while !thread_stop.load(Ordering::SeqCst) {
                    if let Some(frame) = surface.frame().filter(Frame::has_dimensions) {
                        match decoder.decode(&frame, &hints) {
                            Ok(texts) if texts.is_empty() => {}
                            Ok(texts) => on_batch(Ok(texts)),
                            Err(err) => on_batch(Err(err)),
                        }
                    }
                    if thread_stop.load(Ordering::SeqCst) {
                        break;
                    }
                    thread::park_timeout(hints.scan_interval);
                }
                log::trace!("Software reader stopped");
            })?;

        *running = Some(ReaderThread { stop, handle });
        Ok(())
    }

    fn reset(&self) {
        let thread = lock(&self.running).take();
        if let Some(thread) = thread {
            thread.shutdown();
        }
    }
}

impl Drop for MultiFormatReader {
    fn drop(&mut self) {
        self.reset();
    }
}

/// [`SoftwareDecoderFactory`] producing [`MultiFormatReader`]s
pub struct ReaderFactory {
    decoder: Arc<dyn FrameDecoder>,
}

impl ReaderFactory {
    pub fn new(decoder: Arc<dyn FrameDecoder>) -> ReaderFactory {
        ReaderFactory { decoder }
    }
}

impl SoftwareDecoderFactory for ReaderFactory {
    fn create(&self, hints: &DecodeHints) -> Arc<dyn SoftwareDecoder> {
        Arc::new(MultiFormatReader::new(self.decoder.clone(), hints.clone()))
    }
}

/// Frame-scheduled polling of a [`HardwareDetector`]
///
/// A ticker thread wakes once per `frame_interval` and forwards the current
/// frame to a detection worker, skipping the tick while the video has no
/// dimensions yet or while the previous detection is still outstanding.
/// The loop stops for good once a payload is found, the sink closes, or it
/// is cancelled.
pub struct HardwareLoop {
    active: Arc<AtomicBool>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl HardwareLoop {
    pub fn new() -> Arc<HardwareLoop> {
        Arc::new(HardwareLoop {
            active: Arc::new(AtomicBool::new(true)),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn start(
        &self,
        detector: Arc<dyn HardwareDetector>,
        surface: Arc<VideoSurface>,
        sink: Arc<dyn ResultSink>,
        stats: Arc<SessionStats>,
        frame_interval: Duration,
    ) -> Result<(), io::Error> {
        let in_flight = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::sync_channel::<Frame>(1);

        let worker = {
            let active = self.active.clone();
            let in_flight = in_flight.clone();
            let sink = sink.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name("codescan-detect".into())
                .spawn(move || {
                    for frame in rx {
                        let detected = detector.detect(&frame);
                        stats.record_detection();
                        if !active.load(Ordering::SeqCst) {
                            in_flight.store(false, Ordering::SeqCst);
                            break;
                        }
                        match detected {
                            Ok(barcodes) => {
                                let found = first_payload(
                                    barcodes.iter().map(|b| b.raw_value.as_str()),
                                    DecodeSource::Hardware,
                                );
                                match found {
                                    Some(result) => {
                                        active.store(false, Ordering::SeqCst);
                                        sink.offer(result);
                                    }
                                    None if !barcodes.is_empty() => stats.record_empty_payload(),
                                    None => {}
                                }
                            }
                            Err(err) => {
                                stats.record_transient_error();
                                log::trace!("Hardware detection failed on frame {}: {}", frame, err);
                            }
                        }
                        in_flight.store(false, Ordering::SeqCst);
                    }
                })?
        };

        let ticker = {
            let active = self.active.clone();
            thread::Builder::new()
                .name("codescan-frames".into())
                .spawn(move || {
                    loop {
                        thread::park_timeout(frame_interval);
                        if !active.load(Ordering::SeqCst) || !sink.is_open() {
                            break;
                        }
                        stats.record_tick();
                        if in_flight.load(Ordering::SeqCst) {
                            stats.record_skipped_tick();
                            continue;
                        }
                        let frame = match surface.frame().filter(Frame::has_dimensions) {
                            Some(frame) => frame,
                            None => continue,
                        };
                        in_flight.store(true, Ordering::SeqCst);
                        if tx.send(frame).is_err() {
                            break;
                        }
                    }
                    log::trace!("Hardware loop stopped");
                })
        };

        let ticker = match ticker {
            Ok(ticker) => ticker,
            Err(err) => {
                self.active.store(false, Ordering::SeqCst);
                let _ = worker.join();
                return Err(err);
            }
        };

        let mut threads = lock(&self.threads);
        threads.push(ticker);
        threads.push(worker);
        Ok(())
    }

    /// Stop scheduling and wait for the loop threads, except the calling one.
    ///
    /// A detection already in flight runs to completion; its result is
    /// dropped.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
        let threads: Vec<JoinHandle<()>> = lock(&self.threads).drain(..).collect();
        for handle in threads {
            handle.thread().unpark();
            join_unless_current(handle);
        }
    }
}

fn join_unless_current(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        log::warn!("Decode loop thread panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{FrameScript, SimDetector, SimFrameDecoder, SimStream};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct CollectSink {
        results: Mutex<Vec<DecodeResult>>,
    }

    impl ResultSink for CollectSink {
        fn offer(&self, result: DecodeResult) -> bool {
            self.results.lock().unwrap().push(result);
            true
        }

        fn is_open(&self) -> bool {
            self.results.lock().unwrap().is_empty()
        }
    }

    fn surface_with(script: FrameScript) -> Arc<VideoSurface> {
        let surface = VideoSurface::new("video");
        surface.attach_stream(SimStream::new("s", None, script));
        surface
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_decode_result_trims() {
        let result = DecodeResult::new("  4006381333931\n", DecodeSource::Software).unwrap();
        assert_eq!(result.payload(), "4006381333931");
        assert_eq!(result.source(), DecodeSource::Software);
        assert!(DecodeResult::new("", DecodeSource::Hardware).is_none());
        assert!(DecodeResult::new(" \t\n", DecodeSource::Hardware).is_none());
    }

    #[test]
    fn test_first_payload_is_first_match() {
        let batch = ["", "  ", "first", "second"];
        let result = first_payload(batch.iter().copied(), DecodeSource::Software).unwrap();
        assert_eq!(result.payload(), "first");
        assert!(first_payload(["", " "].iter().copied(), DecodeSource::Software).is_none());
    }

    #[test]
    fn test_hardware_loop_finds_payload_after_blanks() {
        let surface = surface_with(
            FrameScript::new(["", "   ", "9780201379624"])
                .with_interval(Duration::from_millis(10))
                .with_warmup(Duration::from_millis(20)),
        );
        let sink = Arc::new(CollectSink::default());
        let stats = Arc::new(SessionStats::new());
        let hw = HardwareLoop::new();
        hw.start(
            Arc::new(SimDetector::new()),
            surface,
            sink.clone(),
            stats.clone(),
            Duration::from_millis(2),
        )
        .unwrap();

        assert!(wait_for(|| !hw.is_active()));
        hw.cancel();
        let results = sink.results.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload(), "9780201379624");
        assert_eq!(results[0].source(), DecodeSource::Hardware);
        assert!(stats.snapshot().empty_payloads > 0);
    }

    #[test]
    fn test_hardware_loop_skips_while_in_flight() {
        let surface = surface_with(FrameScript::new([""]).with_warmup(Duration::ZERO));
        let sink = Arc::new(CollectSink::default());
        let stats = Arc::new(SessionStats::new());
        let hw = HardwareLoop::new();
        hw.start(
            Arc::new(SimDetector::new().with_latency(Duration::from_millis(40))),
            surface,
            sink.clone(),
            stats.clone(),
            Duration::from_millis(2),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(150));
        hw.cancel();
        let snap = stats.snapshot();
        assert!(snap.hardware_skipped > 0);
        assert!(snap.hardware_detections <= 5);
        assert!(sink.results.lock().unwrap().is_empty());
    }

    #[test]
    fn test_hardware_loop_survives_detection_errors() {
        let surface = surface_with(
            FrameScript::new(["!error", "!error", "QR-PAYLOAD"])
                .with_interval(Duration::from_millis(10))
                .with_warmup(Duration::ZERO),
        );
        let sink = Arc::new(CollectSink::default());
        let stats = Arc::new(SessionStats::new());
        let hw = HardwareLoop::new();
        hw.start(
            Arc::new(SimDetector::new()),
            surface,
            sink.clone(),
            stats.clone(),
            Duration::from_millis(2),
        )
        .unwrap();

        assert!(wait_for(|| !sink.results.lock().unwrap().is_empty()));
        hw.cancel();
        assert!(stats.snapshot().transient_errors > 0);
    }

    #[test]
    fn test_hardware_loop_waits_for_dimensions() {
        let surface = surface_with(FrameScript::new(["123"]).with_warmup(Duration::from_secs(10)));
        let sink = Arc::new(CollectSink::default());
        let stats = Arc::new(SessionStats::new());
        let hw = HardwareLoop::new();
        hw.start(
            Arc::new(SimDetector::new()),
            surface,
            sink.clone(),
            stats.clone(),
            Duration::from_millis(2),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        hw.cancel();
        assert!(!hw.is_active());
        assert_eq!(stats.snapshot().hardware_detections, 0);
        assert!(sink.results.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reader_reports_batches_until_reset() {
        let surface = surface_with(FrameScript::new(["ABC"]).with_warmup(Duration::ZERO));
        let hints = DecodeHints {
            scan_interval: Duration::from_millis(5),
            ..DecodeHints::default()
        };
        let reader = MultiFormatReader::new(Arc::new(SimFrameDecoder::new()), hints);
        let batches = Arc::new(Mutex::new(Vec::new()));
        let sink = batches.clone();
        reader
            .decode_continuously(
                surface.clone(),
                Box::new(move |batch| sink.lock().unwrap().push(batch)),
            )
            .unwrap();
        assert!(reader.is_running());
        assert!(reader
            .decode_continuously(surface, Box::new(|_| {}))
            .is_err());

        assert!(wait_for(|| batches.lock().unwrap().len() >= 2));
        reader.reset();
        assert!(!reader.is_running());

        let seen = batches.lock().unwrap().len();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(batches.lock().unwrap().len(), seen);
        assert_eq!(batches.lock().unwrap()[0], Ok(vec!["ABC".to_string()]));

        // reset twice is harmless
        reader.reset();
    }

    #[test]
    fn test_reader_reset_from_callback() {
        let surface = surface_with(FrameScript::new(["X"]).with_warmup(Duration::ZERO));
        let hints = DecodeHints {
            scan_interval: Duration::from_millis(5),
            ..DecodeHints::default()
        };
        let reader = Arc::new(MultiFormatReader::new(Arc::new(SimFrameDecoder::new()), hints));
        let calls = Arc::new(Mutex::new(0));
        let (r, c) = (Arc::downgrade(&reader), calls.clone());
        reader
            .decode_continuously(
                surface,
                Box::new(move |_| {
                    *c.lock().unwrap() += 1;
                    if let Some(reader) = r.upgrade() {
                        reader.reset();
                    }
                }),
            )
            .unwrap();

        assert!(wait_for(|| !reader.is_running()));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
