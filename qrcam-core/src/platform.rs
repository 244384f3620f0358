//! Host platform seams
//!
//! The scanner never touches a camera, a document or a decoder directly. A host
//! (a browser binding, a native shell, or the mock used in tests) implements these
//! traits and hands them to the scanner at construction time.

use crate::constraints::VideoConstraints;
use crate::device::MediaDeviceInfo;
use crate::error::QrCamResult;
use crate::frame::PixelBuffer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Camera acquisition and device listing API of the host
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Whether the host can acquire a camera stream at all
    fn supports_user_media(&self) -> bool;

    /// Whether the host can list media devices
    fn supports_enumeration(&self) -> bool;

    /// Request a camera stream matching `constraints`
    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> QrCamResult<Arc<dyn MediaStream>>;

    /// List every media device the host knows about
    async fn enumerate_devices(&self) -> QrCamResult<Vec<MediaDeviceInfo>>;
}

/// A live camera stream handed out by [`MediaDevices::get_user_media`]
pub trait MediaStream: Send + Sync + fmt::Debug {
    /// Host identifier of the stream
    fn id(&self) -> &str;

    /// Stop every track of the stream, releasing the camera
    fn stop(&self);

    /// Whether the stream still holds the camera
    fn is_active(&self) -> bool;
}

/// The element that shows the live video and can be sampled
pub trait VideoSurface: Send + Sync {
    /// Make `stream` the source of the surface
    fn bind_stream(&self, stream: Arc<dyn MediaStream>);

    /// Subscribe to the surface's attached-to-document state
    fn attachment(&self) -> watch::Receiver<bool>;

    /// Whether the surface is currently attached
    fn is_attached(&self) -> bool {
        *self.attachment().borrow()
    }

    /// Copy the current video frame into `target`, scaled to its dimensions
    fn draw_frame(&self, target: &mut PixelBuffer) -> QrCamResult<()>;
}

/// The three mutually exclusive panels of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    /// Waiting for the camera
    Loading,
    /// Camera unavailable, shows a message
    Error,
    /// Live video with the switch control overlay
    Video,
}

impl Panel {
    /// Every panel, in mount order
    pub const ALL: [Panel; 3] = [Panel::Error, Panel::Loading, Panel::Video];

    /// Panel name
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Loading => "loading",
            Panel::Error => "error",
            Panel::Video => "video",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual side of the widget, applied by the host
pub trait PanelView: Send + Sync {
    /// Show `panel` and hide its siblings
    fn show_panel(&self, panel: Panel);

    /// Replace the error panel text
    fn set_error_message(&self, message: &str);

    /// Show or hide the camera switch control
    fn set_switch_control_visible(&self, visible: bool);
}

/// View that only logs, for hosts without a visual surface
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessView;

impl PanelView for HeadlessView {
    fn show_panel(&self, panel: Panel) {
        debug!(%panel, "Panel activated");
    }

    fn set_error_message(&self, message: &str) {
        debug!(text = message, "Error message set");
    }

    fn set_switch_control_visible(&self, visible: bool) {
        debug!(visible, "Switch control visibility changed");
    }
}
