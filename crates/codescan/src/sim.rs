// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Scripted in-memory platform
//!
//! Implements every collaborator trait without hardware so sessions can be
//! exercised end to end: a camera answering requests from a script, streams
//! playing a [`FrameScript`], a document whose containers may show up late,
//! and decoders that read the payload text straight out of the frame bytes.
//!
//! Frame payload conventions understood by [`SimDetector`] and
//! [`SimFrameDecoder`]:
//!
//! - `""` decodes to nothing;
//! - `"a|b"` decodes to two symbols, `a` and `b`;
//! - a payload starting with `!error` fails the attempt.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    camera::CameraCandidate,
    decode::{DecodeError, DecodeHints, DetectedBarcode, FrameDecoder, HardwareDetector, ReaderFactory},
    format::BarcodeFormat,
    frame::Frame,
    lock,
    media::{
        DeviceInfo, FocusMode, MediaDevices, MediaError, MediaStream, MediaTrack,
        TrackCapabilities, TrackConstraints,
    },
    probe::DetectorPlatform,
    registry::Platform,
    surface::{Container, Document},
};

const ERROR_MARKER: &str = "!error";

/// What a stream shows over time
///
/// Each payload is displayed for one `interval`, the last one stays on
/// screen. During `warmup` the video has no dimensions yet.
#[derive(Debug, Clone)]
pub struct FrameScript {
    payloads: Vec<String>,
    interval: Duration,
    warmup: Duration,
    width: u32,
    height: u32,
}

impl FrameScript {
    pub fn new<I, S>(payloads: I) -> FrameScript
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FrameScript {
            payloads: payloads.into_iter().map(Into::into).collect(),
            ..FrameScript::default()
        }
    }

    pub fn with_interval(self, interval: Duration) -> FrameScript {
        FrameScript { interval, ..self }
    }

    pub fn with_warmup(self, warmup: Duration) -> FrameScript {
        FrameScript { warmup, ..self }
    }

    pub fn with_size(self, width: u32, height: u32) -> FrameScript {
        FrameScript {
            width,
            height,
            ..self
        }
    }

    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    /// The frame shown `elapsed` after playback started.
    pub fn frame_at(&self, elapsed: Duration) -> Frame {
        if elapsed < self.warmup {
            return Frame::new(0, 0, 0, Vec::new());
        }
        let playing = elapsed - self.warmup;
        let index = if self.interval.is_zero() {
            0
        } else {
            (playing.as_nanos() / self.interval.as_nanos()) as usize
        };
        let data = match self.payloads.len() {
            0 => Vec::new(),
            n => self.payloads[index.min(n - 1)].as_bytes().to_vec(),
        };
        Frame::new(self.width, self.height, index as u64, data)
    }
}

impl Default for FrameScript {
    fn default() -> Self {
        FrameScript {
            payloads: Vec::new(),
            interval: Duration::from_millis(33),
            warmup: Duration::ZERO,
            width: 640,
            height: 480,
        }
    }
}

/// Symbols encoded in a simulated frame.
fn frame_symbols(frame: &Frame) -> Result<Vec<String>, DecodeError> {
    let text = String::from_utf8_lossy(frame.data());
    if text.starts_with(ERROR_MARKER) {
        return Err(DecodeError::new(format!("simulated failure on frame {}", frame.sequence())));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(text.split('|').map(str::to_owned).collect())
}

/// Video track with scripted capabilities
pub struct SimTrack {
    label: String,
    focus_modes: Vec<FocusMode>,
    reject_constraints: bool,
    apply_delay: Duration,
    applied: Mutex<Vec<TrackConstraints>>,
    live: AtomicBool,
}

impl SimTrack {
    pub fn new(label: impl Into<String>) -> SimTrack {
        SimTrack {
            label: label.into(),
            focus_modes: Vec::new(),
            reject_constraints: false,
            apply_delay: Duration::ZERO,
            applied: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
        }
    }

    pub fn with_focus_modes(self, modes: impl IntoIterator<Item = FocusMode>) -> SimTrack {
        SimTrack {
            focus_modes: modes.into_iter().collect(),
            ..self
        }
    }

    /// Fail every `apply_constraints` call.
    pub fn rejecting_constraints(self) -> SimTrack {
        SimTrack {
            reject_constraints: true,
            ..self
        }
    }

    pub fn with_apply_delay(self, delay: Duration) -> SimTrack {
        SimTrack {
            apply_delay: delay,
            ..self
        }
    }

    /// Constraints accepted so far.
    pub fn applied(&self) -> Vec<TrackConstraints> {
        lock(&self.applied).clone()
    }
}

impl MediaTrack for SimTrack {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities {
            focus_modes: self.focus_modes.clone(),
        }
    }

    fn apply_constraints(&self, constraints: &TrackConstraints) -> Result<(), MediaError> {
        if !self.apply_delay.is_zero() {
            thread::sleep(self.apply_delay);
        }
        if self.reject_constraints {
            return Err(MediaError::overconstrained("focusMode"));
        }
        lock(&self.applied).push(constraints.clone());
        Ok(())
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Single-track stream playing a [`FrameScript`]
pub struct SimStream {
    id: String,
    device_id: Option<String>,
    track: Arc<SimTrack>,
    script: FrameScript,
    started: Instant,
}

impl SimStream {
    pub fn new(id: &str, device_id: Option<&str>, script: FrameScript) -> Arc<SimStream> {
        SimStream::with_track(id, device_id, Arc::new(SimTrack::new("Sim Camera")), script)
    }

    pub fn with_track(
        id: &str,
        device_id: Option<&str>,
        track: Arc<SimTrack>,
        script: FrameScript,
    ) -> Arc<SimStream> {
        Arc::new(SimStream {
            id: id.to_owned(),
            device_id: device_id.map(str::to_owned),
            track,
            script,
            started: Instant::now(),
        })
    }

    pub fn sim_track(&self) -> &Arc<SimTrack> {
        &self.track
    }
}

impl MediaStream for SimStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn device_id(&self) -> Option<String> {
        self.device_id.clone()
    }

    fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone()]
    }

    fn latest_frame(&self) -> Option<Frame> {
        if !self.track.is_live() {
            return None;
        }
        Some(self.script.frame_at(self.started.elapsed()))
    }
}

/// Scripted answer to one camera request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Grant,
    Deny(MediaError),
}

impl Response {
    pub fn deny() -> Response {
        Response::Deny(MediaError::not_allowed("Permission denied"))
    }

    pub fn overconstrained() -> Response {
        Response::Deny(MediaError::overconstrained("facingMode"))
    }

    pub fn not_readable() -> Response {
        Response::Deny(MediaError::not_readable("Could not start video source"))
    }
}

#[derive(Default)]
struct CameraLog {
    requests: Vec<CameraCandidate>,
    opened: Vec<Arc<SimStream>>,
    enumerations: usize,
}

/// Camera API answering requests from a script
///
/// Requests consume scripted [`Response`]s in order; once the script runs
/// out every request gets the default response ([`Response::Grant`] unless
/// changed).
pub struct SimCamera {
    responses: Mutex<VecDeque<Response>>,
    default: Response,
    devices: Option<Vec<DeviceInfo>>,
    focus_modes: Vec<FocusMode>,
    script: FrameScript,
    prompt_delay: Duration,
    log: Mutex<CameraLog>,
}

impl SimCamera {
    pub fn new() -> SimCamera {
        SimCamera {
            responses: Mutex::new(VecDeque::new()),
            default: Response::Grant,
            devices: Some(Vec::new()),
            focus_modes: vec![FocusMode::Continuous],
            script: FrameScript::default(),
            prompt_delay: Duration::ZERO,
            log: Mutex::new(CameraLog::default()),
        }
    }

    pub fn with_responses(self, responses: impl IntoIterator<Item = Response>) -> SimCamera {
        SimCamera {
            responses: Mutex::new(responses.into_iter().collect()),
            ..self
        }
    }

    pub fn with_default(self, default: Response) -> SimCamera {
        SimCamera { default, ..self }
    }

    pub fn with_devices(self, devices: Vec<DeviceInfo>) -> SimCamera {
        SimCamera {
            devices: Some(devices),
            ..self
        }
    }

    /// Make device enumeration unavailable.
    pub fn without_enumeration(self) -> SimCamera {
        SimCamera {
            devices: None,
            ..self
        }
    }

    pub fn with_focus_modes(self, modes: impl IntoIterator<Item = FocusMode>) -> SimCamera {
        SimCamera {
            focus_modes: modes.into_iter().collect(),
            ..self
        }
    }

    /// Hold every request this long before answering, like a permission
    /// prompt the user takes a while to dismiss.
    pub fn with_prompt_delay(self, prompt_delay: Duration) -> SimCamera {
        SimCamera { prompt_delay, ..self }
    }

    /// What every granted stream shows.
    pub fn with_script(self, script: FrameScript) -> SimCamera {
        SimCamera { script, ..self }
    }

    pub fn devices(&self) -> Option<&[DeviceInfo]> {
        self.devices.as_deref()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.log).requests.len()
    }

    pub fn enumeration_count(&self) -> usize {
        lock(&self.log).enumerations
    }

    pub fn requests(&self) -> Vec<CameraCandidate> {
        lock(&self.log).requests.clone()
    }

    /// Every stream granted so far, in order.
    pub fn opened_streams(&self) -> Vec<Arc<SimStream>> {
        lock(&self.log).opened.clone()
    }

    fn track_label(&self, device_id: Option<&str>) -> String {
        device_id
            .and_then(|id| {
                self.devices
                    .iter()
                    .flatten()
                    .find(|d| d.device_id == id)
                    .map(|d| d.label.clone())
            })
            .unwrap_or_else(|| "Sim Camera".to_owned())
    }
}

impl Default for SimCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for SimCamera {
    fn get_user_media(&self, candidate: &CameraCandidate) -> Result<Arc<dyn MediaStream>, MediaError> {
        if !self.prompt_delay.is_zero() {
            thread::sleep(self.prompt_delay);
        }
        let response = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        let mut log = lock(&self.log);
        log.requests.push(candidate.clone());
        match response {
            Response::Grant => {
                let id = format!("sim-stream-{}", log.opened.len() + 1);
                let track = SimTrack::new(self.track_label(candidate.device_id()))
                    .with_focus_modes(self.focus_modes.iter().copied());
                let stream = SimStream::with_track(
                    &id,
                    candidate.device_id(),
                    Arc::new(track),
                    self.script.clone(),
                );
                log.opened.push(stream.clone());
                Ok(stream)
            }
            Response::Deny(err) => Err(err),
        }
    }

    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, MediaError> {
        lock(&self.log).enumerations += 1;
        match &self.devices {
            Some(devices) => Ok(devices.clone()),
            None => Err(MediaError::not_supported("Device enumeration is not available")),
        }
    }
}

/// A mount target recording its children
#[derive(Default)]
pub struct SimContainer {
    children: Mutex<Vec<String>>,
}

impl SimContainer {
    pub fn children(&self) -> Vec<String> {
        lock(&self.children).clone()
    }
}

impl Container for SimContainer {
    fn clear(&self) {
        lock(&self.children).clear();
    }

    fn append_child(&self, child_id: &str) {
        lock(&self.children).push(child_id.to_owned());
    }

    fn remove_child(&self, child_id: &str) -> bool {
        let mut children = lock(&self.children);
        match children.iter().position(|c| c == child_id) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    fn child_count(&self) -> usize {
        lock(&self.children).len()
    }
}

/// Document whose containers can appear after a delay
#[derive(Default)]
pub struct SimDocument {
    containers: Mutex<HashMap<String, (Arc<SimContainer>, Instant)>>,
}

impl SimDocument {
    pub fn new() -> SimDocument {
        SimDocument::default()
    }

    pub fn add_container(&self, id: &str) -> Arc<SimContainer> {
        self.add_container_after(id, Duration::ZERO)
    }

    /// Add a container that becomes visible `delay` from now.
    pub fn add_container_after(&self, id: &str, delay: Duration) -> Arc<SimContainer> {
        let container = Arc::new(SimContainer::default());
        lock(&self.containers).insert(id.to_owned(), (container.clone(), Instant::now() + delay));
        container
    }

    /// Look up a container regardless of whether it is visible yet.
    pub fn container(&self, id: &str) -> Option<Arc<SimContainer>> {
        lock(&self.containers).get(id).map(|(c, _)| c.clone())
    }
}

impl Document for SimDocument {
    fn get_element_by_id(&self, id: &str) -> Option<Arc<dyn Container>> {
        let containers = lock(&self.containers);
        let (container, visible_at) = containers.get(id)?;
        if Instant::now() < *visible_at {
            return None;
        }
        Some(container.clone())
    }
}

/// Hardware detector reading symbols from frame bytes
#[derive(Debug, Default)]
pub struct SimDetector {
    latency: Duration,
}

impl SimDetector {
    pub fn new() -> SimDetector {
        SimDetector::default()
    }

    /// Time every detection takes.
    pub fn with_latency(self, latency: Duration) -> SimDetector {
        SimDetector { latency }
    }
}

impl HardwareDetector for SimDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedBarcode>, DecodeError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(frame_symbols(frame)?
            .into_iter()
            .map(|raw_value| DetectedBarcode {
                raw_value,
                format: None,
            })
            .collect())
    }
}

/// Detector platform with scripted feature detection
pub struct SimDetectorPlatform {
    available: bool,
    supported: Option<Vec<BarcodeFormat>>,
    fail_construction: bool,
    latency: Duration,
    created_with: Mutex<Vec<Option<Vec<BarcodeFormat>>>>,
}

impl SimDetectorPlatform {
    /// Available detector whose supported format query fails.
    pub fn new() -> SimDetectorPlatform {
        SimDetectorPlatform {
            available: true,
            supported: None,
            fail_construction: false,
            latency: Duration::ZERO,
            created_with: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> SimDetectorPlatform {
        SimDetectorPlatform {
            available: false,
            ..SimDetectorPlatform::new()
        }
    }

    pub fn with_supported(self, formats: impl IntoIterator<Item = BarcodeFormat>) -> SimDetectorPlatform {
        SimDetectorPlatform {
            supported: Some(formats.into_iter().collect()),
            ..self
        }
    }

    pub fn failing_construction(self) -> SimDetectorPlatform {
        SimDetectorPlatform {
            fail_construction: true,
            ..self
        }
    }

    pub fn with_latency(self, latency: Duration) -> SimDetectorPlatform {
        SimDetectorPlatform { latency, ..self }
    }

    /// Format restrictions of every successful construction.
    pub fn created_with(&self) -> Vec<Option<Vec<BarcodeFormat>>> {
        lock(&self.created_with).clone()
    }
}

impl Default for SimDetectorPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorPlatform for SimDetectorPlatform {
    fn is_available(&self) -> bool {
        self.available
    }

    fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DecodeError> {
        self.supported
            .clone()
            .ok_or_else(|| DecodeError::new("getSupportedFormats is not available"))
    }

    fn create(
        &self,
        formats: Option<&[BarcodeFormat]>,
    ) -> Result<Arc<dyn HardwareDetector>, DecodeError> {
        if self.fail_construction {
            return Err(DecodeError::new("BarcodeDetector construction failed"));
        }
        lock(&self.created_with).push(formats.map(<[BarcodeFormat]>::to_vec));
        Ok(Arc::new(SimDetector::new().with_latency(self.latency)))
    }
}

/// Single-shot software decoder reading symbols from frame bytes
#[derive(Debug, Default)]
pub struct SimFrameDecoder {
    latency: Duration,
    calls: AtomicUsize,
}

impl SimFrameDecoder {
    pub fn new() -> SimFrameDecoder {
        SimFrameDecoder::default()
    }

    pub fn with_latency(self, latency: Duration) -> SimFrameDecoder {
        SimFrameDecoder { latency, ..self }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FrameDecoder for SimFrameDecoder {
    fn decode(&self, frame: &Frame, hints: &DecodeHints) -> Result<Vec<String>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if hints.possible_formats.is_empty() {
            return Ok(Vec::new());
        }
        frame_symbols(frame)
    }
}

/// A complete simulated host
pub struct SimPlatform {
    secure_context: bool,
    camera_api: bool,
    camera: Arc<SimCamera>,
    document: Arc<SimDocument>,
    detector: Option<Arc<SimDetectorPlatform>>,
    decoder: Arc<SimFrameDecoder>,
}

impl SimPlatform {
    pub fn builder() -> SimPlatformBuilder {
        SimPlatformBuilder::default()
    }

    /// Collaborators to hand to a [`crate::registry::Scanner`].
    pub fn platform(&self) -> Platform {
        Platform {
            secure_context: self.secure_context,
            media: self
                .camera_api
                .then(|| self.camera.clone() as Arc<dyn MediaDevices>),
            document: self.document.clone(),
            detector: self
                .detector
                .clone()
                .map(|d| d as Arc<dyn DetectorPlatform>),
            software: Arc::new(ReaderFactory::new(self.decoder.clone())),
        }
    }

    pub fn camera(&self) -> &Arc<SimCamera> {
        &self.camera
    }

    pub fn document(&self) -> &Arc<SimDocument> {
        &self.document
    }

    pub fn container(&self, id: &str) -> Option<Arc<SimContainer>> {
        self.document.container(id)
    }

    pub fn detector(&self) -> Option<&Arc<SimDetectorPlatform>> {
        self.detector.as_ref()
    }

    pub fn decoder(&self) -> &Arc<SimFrameDecoder> {
        &self.decoder
    }
}

/// Builder for [`SimPlatform`]
///
/// Defaults: secure context, camera API present granting every request,
/// hardware detector available.
pub struct SimPlatformBuilder {
    secure_context: bool,
    camera_api: bool,
    camera: SimCamera,
    script: Option<FrameScript>,
    containers: Vec<(String, Duration)>,
    detector: Option<SimDetectorPlatform>,
    decoder: SimFrameDecoder,
}

impl Default for SimPlatformBuilder {
    fn default() -> Self {
        SimPlatformBuilder {
            secure_context: true,
            camera_api: true,
            camera: SimCamera::new(),
            script: None,
            containers: Vec::new(),
            detector: Some(SimDetectorPlatform::new()),
            decoder: SimFrameDecoder::new(),
        }
    }
}

impl SimPlatformBuilder {
    pub fn container(mut self, id: &str) -> Self {
        self.containers.push((id.to_owned(), Duration::ZERO));
        self
    }

    pub fn container_after(mut self, id: &str, delay: Duration) -> Self {
        self.containers.push((id.to_owned(), delay));
        self
    }

    /// Payloads shown by every granted stream, one frame interval each.
    pub fn payloads<I, S>(mut self, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script = Some(FrameScript::new(payloads));
        self
    }

    pub fn script(mut self, script: FrameScript) -> Self {
        self.script = Some(script);
        self
    }

    pub fn camera(mut self, camera: SimCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn detector(mut self, detector: SimDetectorPlatform) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn without_detector(mut self) -> Self {
        self.detector = None;
        self
    }

    pub fn decoder(mut self, decoder: SimFrameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn insecure(mut self) -> Self {
        self.secure_context = false;
        self
    }

    pub fn without_camera_api(mut self) -> Self {
        self.camera_api = false;
        self
    }

    pub fn build(self) -> SimPlatform {
        let document = SimDocument::new();
        for (id, delay) in &self.containers {
            document.add_container_after(id, *delay);
        }
        let camera = match self.script {
            Some(script) => self.camera.with_script(script),
            None => self.camera,
        };
        SimPlatform {
            secure_context: self.secure_context,
            camera_api: self.camera_api,
            camera: Arc::new(camera),
            document: Arc::new(document),
            detector: self.detector.map(Arc::new),
            decoder: Arc::new(self.decoder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_script_timeline() {
        let script = FrameScript::new(["a", "b"])
            .with_interval(Duration::from_millis(10))
            .with_warmup(Duration::from_millis(5));

        assert!(!script.frame_at(Duration::from_millis(2)).has_dimensions());
        assert_eq!(script.frame_at(Duration::from_millis(6)).data(), b"a");
        assert_eq!(script.frame_at(Duration::from_millis(16)).data(), b"b");
        // last payload stays on screen
        assert_eq!(script.frame_at(Duration::from_secs(5)).data(), b"b");
    }

    #[test]
    fn test_stopped_stream_has_no_frames() {
        let stream = SimStream::new("s", None, FrameScript::new(["x"]));
        assert!(stream.latest_frame().is_some());
        stream.stop_tracks();
        assert!(stream.latest_frame().is_none());
        assert_eq!(stream.live_track_count(), 0);
    }

    #[test]
    fn test_frame_symbols() {
        let frame = |text: &str| Frame::new(640, 480, 3, text.as_bytes().to_vec());
        assert!(frame_symbols(&frame("")).unwrap().is_empty());
        assert_eq!(frame_symbols(&frame("a| b")).unwrap(), vec!["a", " b"]);
        assert!(frame_symbols(&frame("!error")).is_err());
    }

    #[test]
    fn test_camera_script_then_default() {
        let camera = SimCamera::new()
            .with_responses([Response::deny()])
            .with_default(Response::not_readable());
        let candidate = CameraCandidate::unconstrained();

        let err = camera.get_user_media(&candidate).err().unwrap();
        assert_eq!(err.name, "NotAllowedError");
        let err = camera.get_user_media(&candidate).err().unwrap();
        assert_eq!(err.name, "NotReadableError");
        assert_eq!(camera.request_count(), 2);
        assert!(camera.opened_streams().is_empty());
    }

    #[test]
    fn test_prompt_delay_holds_request() {
        let camera = SimCamera::new().with_prompt_delay(Duration::from_millis(30));
        let start = Instant::now();
        assert!(camera.get_user_media(&CameraCandidate::unconstrained()).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pinned_stream_takes_device_label() {
        let camera = SimCamera::new().with_devices(vec![DeviceInfo::video("b", "Back Camera")]);
        let stream = camera
            .get_user_media(&CameraCandidate::unconstrained().with_device("b"))
            .unwrap();
        assert_eq!(stream.device_id().as_deref(), Some("b"));
        assert_eq!(stream.video_tracks()[0].label(), "Back Camera");
    }

    #[test]
    fn test_late_container() {
        let document = SimDocument::new();
        document.add_container_after("late", Duration::from_secs(60));
        assert!(document.get_element_by_id("late").is_none());
        assert!(document.container("late").is_some());
        assert!(document.get_element_by_id("missing").is_none());
    }

    #[test]
    fn test_platform_switches() {
        let sim = SimPlatform::builder()
            .insecure()
            .without_camera_api()
            .without_detector()
            .build();
        let platform = sim.platform();
        assert!(!platform.secure_context);
        assert!(platform.media.is_none());
        assert!(platform.detector.is_none());
    }
}
