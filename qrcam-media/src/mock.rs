//! Scriptable in-memory host, for tests and headless demos

use crate::decode::{DecodeError, DecodedPayload, QrDecoder};
use async_trait::async_trait;
use parking_lot::Mutex;
use qrcam_core::{
    DeviceId, DeviceKind, MediaDeviceInfo, MediaDevices, MediaStream, Panel, PanelView,
    PixelBuffer, QrCamError, QrCamResult, VideoConstraints, VideoSurface,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Stream handed out by [`MockMediaDevices`]
#[derive(Debug)]
pub struct MockStream {
    id: String,
    device_id: Option<DeviceId>,
    active: AtomicBool,
}

impl MockStream {
    /// Device the stream was opened for
    pub fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Camera host with a fixed device list and scripted request outcomes
pub struct MockMediaDevices {
    devices: Mutex<Vec<MediaDeviceInfo>>,
    user_media_supported: AtomicBool,
    enumeration_supported: AtomicBool,
    failures: Mutex<VecDeque<QrCamError>>,
    delays: Mutex<VecDeque<Duration>>,
    enumeration_failures: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<VideoConstraints>>,
    streams: Mutex<Vec<Arc<MockStream>>>,
    next_stream: AtomicU64,
    enumerations: AtomicU64,
}

impl MockMediaDevices {
    /// Host with a single default camera
    pub fn new() -> Self {
        Self::with_video_inputs(&["mock_camera_0"])
    }

    /// Host with the given cameras, in enumeration order
    pub fn with_video_inputs(ids: &[&str]) -> Self {
        let mut devices = vec![MediaDeviceInfo {
            kind: DeviceKind::AudioInput,
            device_id: DeviceId::new("mock_microphone_0"),
            label: "Mock Microphone".to_string(),
        }];
        devices.extend(
            ids.iter()
                .map(|id| MediaDeviceInfo::video_input(*id, format!("Mock Camera {}", id))),
        );

        Self {
            devices: Mutex::new(devices),
            user_media_supported: AtomicBool::new(true),
            enumeration_supported: AtomicBool::new(true),
            failures: Mutex::new(VecDeque::new()),
            delays: Mutex::new(VecDeque::new()),
            enumeration_failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            streams: Mutex::new(Vec::new()),
            next_stream: AtomicU64::new(0),
            enumerations: AtomicU64::new(0),
        }
    }

    /// Pretend the host has no camera API
    pub fn without_user_media(self) -> Self {
        self.user_media_supported.store(false, Ordering::SeqCst);
        self
    }

    /// Pretend the host cannot list devices
    pub fn without_enumeration(self) -> Self {
        self.enumeration_supported.store(false, Ordering::SeqCst);
        self
    }

    /// Make the next request fail with `error`
    pub fn fail_next(&self, error: QrCamError) {
        self.failures.lock().push_back(error);
    }

    /// Make the next device listing fail with `reason`
    pub fn fail_next_enumeration(&self, reason: &str) {
        self.enumeration_failures.lock().push_back(reason.to_string());
    }

    /// Make the next request take `delay` to complete
    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().push_back(delay);
    }

    /// Constraints of every request so far
    pub fn requests(&self) -> Vec<VideoConstraints> {
        self.requests.lock().clone()
    }

    /// Every stream handed out so far
    pub fn streams(&self) -> Vec<Arc<MockStream>> {
        self.streams.lock().clone()
    }

    /// Number of device listings served
    pub fn enumerations(&self) -> u64 {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl Default for MockMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for MockMediaDevices {
    fn supports_user_media(&self) -> bool {
        self.user_media_supported.load(Ordering::SeqCst)
    }

    fn supports_enumeration(&self) -> bool {
        self.enumeration_supported.load(Ordering::SeqCst)
    }

    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> QrCamResult<Arc<dyn MediaStream>> {
        self.requests.lock().push(constraints.clone());

        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        if !self.supports_user_media() {
            return Err(QrCamError::CameraNotSupported);
        }

        if let Some(device_id) = &constraints.device_id {
            let known = self
                .devices
                .lock()
                .iter()
                .any(|d| d.is_video_input() && &d.device_id == device_id);
            if !known {
                return Err(QrCamError::DeviceNotFound {
                    device_id: device_id.to_string(),
                });
            }
        }

        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        let stream = Arc::new(MockStream {
            id: format!("mock_stream_{}", n),
            device_id: constraints.device_id.clone(),
            active: AtomicBool::new(true),
        });
        self.streams.lock().push(stream.clone());
        Ok(stream)
    }

    async fn enumerate_devices(&self) -> QrCamResult<Vec<MediaDeviceInfo>> {
        if !self.supports_enumeration() {
            return Err(QrCamError::DeviceEnumerationUnsupported);
        }
        let failure = self.enumeration_failures.lock().pop_front();
        if let Some(reason) = failure {
            return Err(QrCamError::DeviceEnumerationFailed { reason });
        }
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.lock().clone())
    }
}

/// Video surface that paints a frame counter into every sampled buffer
///
/// Frame `n` fills the buffer with the grey level `n % 256`, so a decoder can tell
/// which copy it was handed.
pub struct MockVideoSurface {
    attached: watch::Sender<bool>,
    bound: Mutex<Option<Arc<dyn MediaStream>>>,
    frames: AtomicU64,
    fail_draws: AtomicBool,
}

impl MockVideoSurface {
    /// An attached surface with nothing bound
    pub fn new() -> Self {
        let (attached, _) = watch::channel(true);
        Self {
            attached,
            bound: Mutex::new(None),
            frames: AtomicU64::new(0),
            fail_draws: AtomicBool::new(false),
        }
    }

    /// Remove the surface from the document
    pub fn detach(&self) {
        self.attached.send_replace(false);
    }

    /// Put the surface back into the document
    pub fn attach(&self) {
        self.attached.send_replace(true);
    }

    /// Make frame copies fail or succeed
    pub fn set_fail_draws(&self, fail: bool) {
        self.fail_draws.store(fail, Ordering::SeqCst);
    }

    /// Frames copied so far
    pub fn frames_drawn(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// Identifier of the bound stream
    pub fn bound_stream_id(&self) -> Option<String> {
        self.bound.lock().as_ref().map(|s| s.id().to_string())
    }
}

impl Default for MockVideoSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSurface for MockVideoSurface {
    fn bind_stream(&self, stream: Arc<dyn MediaStream>) {
        *self.bound.lock() = Some(stream);
    }

    fn attachment(&self) -> watch::Receiver<bool> {
        self.attached.subscribe()
    }

    fn draw_frame(&self, target: &mut PixelBuffer) -> QrCamResult<()> {
        if self.fail_draws.load(Ordering::SeqCst) {
            return Err(QrCamError::FrameUnavailable {
                reason: "video not ready".to_string(),
            });
        }
        let active = self.bound.lock().as_ref().map(|s| s.is_active());
        match active {
            Some(true) => {}
            Some(false) => {
                return Err(QrCamError::FrameUnavailable {
                    reason: "bound stream stopped".to_string(),
                })
            }
            None => {
                return Err(QrCamError::FrameUnavailable {
                    reason: "no stream bound".to_string(),
                })
            }
        }

        let n = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        let level = (n % 256) as u8;
        target.fill([level, level, level, 255]);
        Ok(())
    }
}

/// Calls received by a [`RecordingView`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    /// `show_panel`
    ShowPanel(Panel),
    /// `set_error_message`
    ErrorMessage(String),
    /// `set_switch_control_visible`
    SwitchControl(bool),
}

/// Panel view that records every call
#[derive(Debug, Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().clone()
    }

    /// Panel of the latest `show_panel` call
    pub fn visible_panel(&self) -> Option<Panel> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            ViewCall::ShowPanel(panel) => Some(*panel),
            _ => None,
        })
    }

    /// Value of the latest `set_switch_control_visible` call
    pub fn switch_control_visible(&self) -> Option<bool> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            ViewCall::SwitchControl(visible) => Some(*visible),
            _ => None,
        })
    }
}

impl PanelView for RecordingView {
    fn show_panel(&self, panel: Panel) {
        self.calls.lock().push(ViewCall::ShowPanel(panel));
    }

    fn set_error_message(&self, message: &str) {
        self.calls.lock().push(ViewCall::ErrorMessage(message.to_string()));
    }

    fn set_switch_control_visible(&self, visible: bool) {
        self.calls.lock().push(ViewCall::SwitchControl(visible));
    }
}

/// One scripted decoder outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStep {
    /// Return this text
    Decode(String),
    /// Return this error
    Fail(DecodeError),
    /// Panic with this message
    Panic(String),
}

/// Decoder that plays back scripted outcomes, then reports `NotFound`
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    steps: Mutex<VecDeque<DecodeStep>>,
    seen: Mutex<Vec<u8>>,
}

impl ScriptedDecoder {
    /// Decoder that never finds a code
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder playing back `steps` in order
    pub fn with_steps(steps: impl IntoIterator<Item = DecodeStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Append a step
    pub fn push(&self, step: DecodeStep) {
        self.steps.lock().push_back(step);
    }

    /// Grey level of the first pixel of every frame submitted so far
    pub fn frames_seen(&self) -> Vec<u8> {
        self.seen.lock().clone()
    }

    /// Number of decode calls
    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

impl QrDecoder for ScriptedDecoder {
    fn decode(&self, frame: &PixelBuffer) -> Result<DecodedPayload, DecodeError> {
        self.seen.lock().push(frame.luma(0, 0));
        let step = self.steps.lock().pop_front();
        match step {
            Some(DecodeStep::Decode(text)) => Ok(DecodedPayload::from_text(text)),
            Some(DecodeStep::Fail(error)) => Err(error),
            Some(DecodeStep::Panic(message)) => panic!("{}", message),
            None => Err(DecodeError::NotFound),
        }
    }
}
