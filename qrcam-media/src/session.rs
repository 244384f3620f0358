//! Camera session lifecycle
//!
//! The session manager requests camera streams, binds the winning stream to the video
//! surface, and moves the display between its panels. Every request carries a
//! generation number; a stream that arrives for an outdated request is released on
//! the spot, so overlapping requests cannot leave two sessions behind.

use crate::display::DisplayController;
use crate::event::ScannerEvent;
use crate::registry::DeviceRegistry;
use crate::scheduler::ScanScheduler;
use parking_lot::Mutex;
use qrcam_core::{
    DeviceId, FacingMode, MediaDevices, MediaStream, Panel, QrCamError, QrCamResult,
    VideoConstraints, VideoSurface,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// When replaced or abandoned camera streams are stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamRelease {
    /// Stop the old stream once a new one is bound, and on scanner stop
    #[default]
    OnSwitchAndStop,
    /// Never stop streams; the host reclaims them
    Never,
}

/// What to do when the host has no camera acquisition API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedCamera {
    /// Show the error panel and still attempt the request
    #[default]
    AttemptAnyway,
    /// Show the error panel and give up
    FailFast,
}

/// Texts shown on the error panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelMessages {
    /// Shown when the host has no camera API
    pub camera_not_supported: String,
    /// Shown when a camera request fails
    pub camera_error: String,
}

impl Default for PanelMessages {
    fn default() -> Self {
        Self {
            camera_not_supported: "Camera not supported".to_string(),
            camera_error: "Error activating camera".to_string(),
        }
    }
}

/// Session manager behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Facing mode requested alongside any device constraint
    pub facing_mode: FacingMode,
    /// Stream release policy
    pub stream_release: StreamRelease,
    /// Missing camera API policy
    pub unsupported_camera: UnsupportedCamera,
    /// Error panel texts
    pub messages: PanelMessages,
}

/// The live connection to a camera
#[derive(Debug, Clone)]
pub struct CameraSession {
    /// Bound stream
    pub stream: Arc<dyn MediaStream>,
    /// Requested device, `None` for the default camera
    pub device_id: Option<DeviceId>,
    /// Request generation that produced the session
    pub generation: u64,
}

/// Owns the camera stream and drives the display through acquisition
pub struct SessionManager {
    devices: Arc<dyn MediaDevices>,
    surface: Arc<dyn VideoSurface>,
    display: Arc<DisplayController>,
    registry: Arc<DeviceRegistry>,
    scheduler: Arc<ScanScheduler>,
    policy: SessionPolicy,
    session: Mutex<Option<CameraSession>>,
    preferred: Mutex<Option<DeviceId>>,
    generation: AtomicU64,
    event_tx: broadcast::Sender<ScannerEvent>,
}

impl SessionManager {
    /// Create a manager without a session
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        surface: Arc<dyn VideoSurface>,
        display: Arc<DisplayController>,
        registry: Arc<DeviceRegistry>,
        scheduler: Arc<ScanScheduler>,
        policy: SessionPolicy,
        event_tx: broadcast::Sender<ScannerEvent>,
    ) -> Self {
        Self {
            devices,
            surface,
            display,
            registry,
            scheduler,
            policy,
            session: Mutex::new(None),
            preferred: Mutex::new(None),
            generation: AtomicU64::new(0),
            event_tx,
        }
    }

    /// Request a camera stream, optionally pinned to `preferred`
    ///
    /// On success the video panel is shown, the device list is fetched if it never
    /// was, the stream is bound and scanning (re)starts. On failure the error panel
    /// is shown and the error returned; nothing is retried. Without a camera API the
    /// panel keeps its "not supported" text and the call fails with
    /// [`QrCamError::CameraNotSupported`].
    pub async fn acquire(&self, preferred: Option<DeviceId>) -> QrCamResult<()> {
        let generation = self.reserve_request();
        self.acquire_reserved(generation, preferred).await
    }

    /// Take the generation number of a request that will run later
    ///
    /// Anything that supersedes the reservation before
    /// [`SessionManager::acquire_reserved`] runs, such as
    /// [`SessionManager::cancel_pending`], turns that request into a no-op.
    pub fn reserve_request(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run a request reserved with [`SessionManager::reserve_request`]
    pub async fn acquire_reserved(
        &self,
        generation: u64,
        preferred: Option<DeviceId>,
    ) -> QrCamResult<()> {
        if self.is_superseded(generation) {
            debug!(generation, "Camera request cancelled before it started");
            return Err(QrCamError::AcquisitionSuperseded { generation });
        }
        *self.preferred.lock() = preferred.clone();

        let unsupported = !self.devices.supports_user_media();
        if unsupported {
            warn!("Camera acquisition API unavailable");
            self.display
                .show_error(&self.policy.messages.camera_not_supported);
            if self.policy.unsupported_camera == UnsupportedCamera::FailFast {
                return Err(QrCamError::CameraNotSupported);
            }
        }

        let constraints = VideoConstraints::for_device(self.policy.facing_mode, preferred.clone());
        debug!(%constraints, generation, "Requesting camera");

        match self.devices.get_user_media(&constraints).await {
            Ok(stream) => self.accept_stream(stream, preferred, generation).await,
            Err(_) if self.is_superseded(generation) => {
                debug!(generation, "Ignoring failure of superseded camera request");
                Err(QrCamError::AcquisitionSuperseded { generation })
            }
            Err(error) if unsupported => {
                debug!(%constraints, "Camera request without camera API failed: {}", error);
                let _ = self.event_tx.send(ScannerEvent::CameraError {
                    message: self.policy.messages.camera_not_supported.clone(),
                    error: error.to_string(),
                });
                Err(QrCamError::CameraNotSupported)
            }
            Err(error) => {
                warn!(%constraints, "Error activating camera: {}", error);
                self.display.show_error(&self.policy.messages.camera_error);
                let _ = self.event_tx.send(ScannerEvent::CameraError {
                    message: self.policy.messages.camera_error.clone(),
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn accept_stream(
        &self,
        stream: Arc<dyn MediaStream>,
        device_id: Option<DeviceId>,
        generation: u64,
    ) -> QrCamResult<()> {
        if self.is_superseded(generation) {
            return self.discard(stream, generation);
        }

        self.display.activate(Panel::Video);

        if !self.registry.is_populated() {
            if let Err(e) = self.registry.refresh().await {
                debug!("Video inputs unavailable: {}", e);
            }
            if self.is_superseded(generation) {
                return self.discard(stream, generation);
            }
        }

        let previous = self.session.lock().replace(CameraSession {
            stream: stream.clone(),
            device_id: device_id.clone(),
            generation,
        });
        self.surface.bind_stream(stream.clone());

        if let Some(previous) = previous {
            if self.policy.stream_release == StreamRelease::OnSwitchAndStop
                && previous.stream.id() != stream.id()
            {
                self.stop_stream(previous.stream.as_ref());
            }
        }

        self.scheduler.start();

        info!(stream = stream.id(), device = ?device_id, "Camera acquired");
        let _ = self.event_tx.send(ScannerEvent::CameraAcquired {
            stream_id: stream.id().to_string(),
            device_id,
        });
        Ok(())
    }

    fn discard(&self, stream: Arc<dyn MediaStream>, generation: u64) -> QrCamResult<()> {
        debug!(generation, stream = stream.id(), "Releasing stream of superseded request");
        self.stop_stream(stream.as_ref());
        Err(QrCamError::AcquisitionSuperseded { generation })
    }

    fn stop_stream(&self, stream: &dyn MediaStream) {
        stream.stop();
        debug!(stream = stream.id(), "Camera stream released");
        let _ = self.event_tx.send(ScannerEvent::StreamReleased {
            stream_id: stream.id().to_string(),
        });
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Re-acquire with the video input after the selected one
    ///
    /// Returns the device that was requested. Fails with
    /// [`QrCamError::DevicesNotEnumerated`] before the first successful acquisition.
    pub async fn switch_device(&self) -> QrCamResult<DeviceId> {
        let current = self.selected_device();
        let next = self.registry.switch_to_next(current.as_ref())?;
        self.acquire(Some(next.clone())).await?;
        Ok(next)
    }

    /// Invalidate every request still in flight
    ///
    /// A stream that arrives for a cancelled request is released without being
    /// bound, and scanning is not restarted for it.
    pub fn cancel_pending(&self) {
        let generation = self.reserve_request();
        debug!(generation, "Pending camera requests cancelled");
    }

    /// Stop the bound stream and forget the session
    ///
    /// Returns whether there was a session to release.
    pub fn release(&self) -> bool {
        match self.session.lock().take() {
            Some(session) => {
                self.stop_stream(session.stream.as_ref());
                true
            }
            None => false,
        }
    }

    /// Device of the latest request
    pub fn selected_device(&self) -> Option<DeviceId> {
        self.preferred.lock().clone()
    }

    /// Whether a stream is bound
    pub fn has_session(&self) -> bool {
        self.session.lock().is_some()
    }

    /// The bound session
    pub fn session(&self) -> Option<CameraSession> {
        self.session.lock().clone()
    }

    /// Release policy in effect
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }
}
