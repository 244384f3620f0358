//! # qrcam - camera QR-code scanning widget
//!
//! qrcam drives a small scanning widget: it asks the host for a camera, shows a
//! loading, error or video panel, samples the live video at a fixed interval and
//! hands every frame to a QR decoder, reporting each outcome to your callbacks.
//!
//! The host (a browser binding, a native shell, a test) supplies the camera API,
//! the video surface, the panel view and the decoder through the traits in
//! [`qrcam_core`] and [`qrcam_media`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrcam::mock::{MockMediaDevices, MockVideoSurface, ScriptedDecoder};
//! use qrcam::{QrScanner, ScannerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), qrcam::QrCamError> {
//!     let scanner = QrScanner::builder(ScannerConfig::new(640, 480))
//!         .devices(Arc::new(MockMediaDevices::new()))
//!         .surface(Arc::new(MockVideoSurface::new()))
//!         .decoder(Arc::new(ScriptedDecoder::new()))
//!         .on_scan_success(|result| println!("Scanned: {:?}", result.text()))
//!         .on_scan_error(|_| {})
//!         .start()
//!         .await?;
//!
//!     let handle = scanner.handle();
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     handle.stop();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use qrcam_core::{
    DeviceDescriptor, DeviceId, DeviceKind, ErrorCategory, FacingMode, HeadlessView,
    MediaDeviceInfo, MediaDevices, MediaStream, Panel, PanelView, PixelBuffer, QrCamError,
    QrCamResult, VideoConstraints, VideoSurface,
};

pub use qrcam_media::{
    mock, DecodeError, DecodedPayload, PanelMessages, QrDecoder, ScanResult, ScanStats,
    ScannerEvent, StreamRelease, UnsupportedCamera,
};

#[cfg(feature = "rqrr")]
pub use qrcam_media::RqrrDecoder;

#[cfg(feature = "diagnostics")]
pub use qrcam_diagnostics::{DebugLogger, ScanHealth, ScanReport};

// Public API modules
pub mod config;
pub mod scanner;

// Re-export main API types
pub use config::{ScannerConfig, MAX_FRAME_DIMENSION};
pub use scanner::{QrScanner, ScannerBuilder, ScannerHandle};

impl QrScanner {
    /// Start building a scanner
    ///
    /// # Example
    /// ```rust,no_run
    /// use qrcam::{QrScanner, ScannerConfig};
    ///
    /// let builder = QrScanner::builder(ScannerConfig::new(320, 320));
    /// ```
    pub fn builder(config: ScannerConfig) -> ScannerBuilder {
        ScannerBuilder::new(config)
    }
}
