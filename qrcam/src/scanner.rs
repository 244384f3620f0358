//! Scanner construction and control

use crate::config::ScannerConfig;
use qrcam_core::{
    DeviceDescriptor, DeviceId, HeadlessView, MediaDevices, Panel, PanelView, QrCamError,
    QrCamResult, VideoSurface,
};
use qrcam_media::{
    DecodeBridge, DecodeError, DeviceRegistry, DisplayController, ErrorCallback, QrDecoder,
    ScanCallbacks, ScanResult, ScanScheduler, ScanStats, ScannerEvent, SessionManager,
    StreamRelease, SuccessCallback,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Fluent builder wiring a scanner to its host
pub struct ScannerBuilder {
    config: ScannerConfig,
    devices: Option<Arc<dyn MediaDevices>>,
    surface: Option<Arc<dyn VideoSurface>>,
    view: Option<Arc<dyn PanelView>>,
    decoder: Option<Arc<dyn QrDecoder>>,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl ScannerBuilder {
    pub(crate) fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            devices: None,
            surface: None,
            view: None,
            decoder: None,
            on_success: None,
            on_error: None,
        }
    }

    /// Camera acquisition and device listing API (required)
    pub fn devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Video element the stream is shown in and sampled from (required)
    pub fn surface(mut self, surface: Arc<dyn VideoSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Panel view; a logging-only view is used when none is set
    pub fn view(mut self, view: Arc<dyn PanelView>) -> Self {
        self.view = Some(view);
        self
    }

    /// QR decoder (required)
    pub fn decoder(mut self, decoder: Arc<dyn QrDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Handler for decoded codes (required)
    pub fn on_scan_success(mut self, handler: impl Fn(ScanResult) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(handler));
        self
    }

    /// Handler for every unsuccessful scan cycle (required)
    pub fn on_scan_error(mut self, handler: impl Fn(DecodeError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Mount the panels and request the default camera in the background
    ///
    /// Returns as soon as the loading panel is shown; scanning starts once the camera
    /// is granted. Only configuration problems fail here. A camera that cannot be
    /// acquired leaves the scanner on its error panel; call [`QrScanner::reacquire`]
    /// or [`QrScanner::switch_camera`] to try again.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(self) -> QrCamResult<QrScanner> {
        self.config.validate()?;
        let devices = required(self.devices, "devices")?;
        let surface = required(self.surface, "surface")?;
        let decoder = required(self.decoder, "decoder")?;
        let on_success = required(self.on_success, "on_scan_success")?;
        let on_error = required(self.on_error, "on_scan_error")?;
        let view = self.view.unwrap_or_else(|| Arc::new(HeadlessView));

        let id = Uuid::new_v4();
        let (event_tx, _) = broadcast::channel(self.config.event_capacity);

        let display = Arc::new(DisplayController::new(view, event_tx.clone()));
        let registry = Arc::new(DeviceRegistry::new(
            devices.clone(),
            display.clone(),
            event_tx.clone(),
        ));
        let scheduler = Arc::new(ScanScheduler::new(
            self.config.scheduler_config(),
            surface.clone(),
            DecodeBridge::new(decoder),
            ScanCallbacks {
                on_success,
                on_error,
            },
            event_tx.clone(),
        ));
        let session = Arc::new(SessionManager::new(
            devices,
            surface,
            display.clone(),
            registry.clone(),
            scheduler.clone(),
            self.config.session_policy(),
            event_tx.clone(),
        ));

        info!(
            scanner = %id,
            width = self.config.width,
            height = self.config.height,
            "Starting QR scanner"
        );
        display.activate(Panel::Loading);

        let initial = session.clone();
        let generation = initial.reserve_request();
        tokio::spawn(async move {
            if let Err(e) = initial.acquire_reserved(generation, None).await {
                warn!(scanner = %id, "Camera unavailable: {}", e);
            }
        });

        Ok(QrScanner {
            inner: Arc::new(ScannerInner {
                id,
                config: self.config,
                display,
                registry,
                scheduler,
                session,
                event_tx,
            }),
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> QrCamResult<T> {
    value.ok_or_else(|| QrCamError::MissingConfiguration {
        field: field.to_string(),
    })
}

struct ScannerInner {
    id: Uuid,
    config: ScannerConfig,
    display: Arc<DisplayController>,
    registry: Arc<DeviceRegistry>,
    scheduler: Arc<ScanScheduler>,
    session: Arc<SessionManager>,
    event_tx: broadcast::Sender<ScannerEvent>,
}

impl ScannerInner {
    fn stop(&self) {
        self.session.cancel_pending();
        self.scheduler.stop();
        if self.config.stream_release == StreamRelease::OnSwitchAndStop {
            self.session.release();
        }
        info!(scanner = %self.id, "QR scanner stopped");
    }
}

/// A running QR scanner widget
#[derive(Clone)]
pub struct QrScanner {
    inner: Arc<ScannerInner>,
}

impl QrScanner {
    /// Halt future scan cycles
    ///
    /// Camera requests still in flight are cancelled, and a stream they deliver later
    /// is released unused. With [`StreamRelease::OnSwitchAndStop`] the bound camera
    /// stream is released too.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Control handle exposing only [`ScannerHandle::stop`]
    pub fn handle(&self) -> ScannerHandle {
        ScannerHandle {
            inner: self.inner.clone(),
        }
    }

    /// Move to the next camera, wrapping around
    pub async fn switch_camera(&self) -> QrCamResult<DeviceId> {
        self.inner.session.switch_device().await
    }

    /// Request the currently selected camera again
    pub async fn reacquire(&self) -> QrCamResult<()> {
        let selected = self.inner.session.selected_device();
        self.inner.session.acquire(selected).await
    }

    /// Scanner instance id
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Configuration in use
    pub fn config(&self) -> &ScannerConfig {
        &self.inner.config
    }

    /// Visible panel
    pub fn current_panel(&self) -> Panel {
        self.inner.display.current()
    }

    /// Text of the error panel
    pub fn error_message(&self) -> Option<String> {
        self.inner.display.error_message()
    }

    /// Whether the camera switch control is shown
    pub fn switch_control_visible(&self) -> bool {
        self.inner.display.switch_control_visible()
    }

    /// Whether a scan cycle is pending
    pub fn is_scanning(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    /// Known video inputs
    pub fn video_inputs(&self) -> Vec<DeviceDescriptor> {
        self.inner.registry.devices()
    }

    /// Device of the latest camera request, `None` for the default camera
    pub fn selected_device(&self) -> Option<DeviceId> {
        self.inner.session.selected_device()
    }

    /// Whether a camera stream is bound
    pub fn has_camera(&self) -> bool {
        self.inner.session.has_session()
    }

    /// Scan statistics
    pub fn stats(&self) -> ScanStats {
        self.inner.scheduler.stats()
    }

    /// Subscribe to scanner events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ScannerEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Statistics report tagged with this scanner's id
    #[cfg(feature = "diagnostics")]
    pub fn report(&self) -> qrcam_diagnostics::ScanReport {
        qrcam_diagnostics::ScanReport::from_stats(&self.stats()).with_scanner_id(self.inner.id)
    }
}

/// Control handle returned to the embedding page
#[derive(Clone)]
pub struct ScannerHandle {
    inner: Arc<ScannerInner>,
}

impl ScannerHandle {
    /// Halt future scan cycles
    pub fn stop(&self) {
        self.inner.stop();
    }
}
