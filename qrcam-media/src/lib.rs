//! # qrcam media
//!
//! The moving parts of the scanner widget: which panel is visible, which cameras
//! exist, the live camera session, and the loop that samples frames and hands them
//! to a QR decoder.

#![warn(clippy::all)]

pub mod decode;
pub mod display;
pub mod event;
pub mod mock;
pub mod registry;
pub mod scheduler;
pub mod session;

// Re-export main types
pub use decode::{DecodeBridge, DecodeError, DecodedPayload, QrDecoder};
#[cfg(feature = "rqrr")]
pub use decode::RqrrDecoder;
pub use display::{DisplayController, PanelState};
pub use event::ScannerEvent;
pub use registry::{next_device_index, DeviceRegistry, MIN_DEVICES_FOR_SWITCH};
pub use scheduler::{
    ErrorCallback, ScanCallbacks, ScanResult, ScanScheduler, ScanSchedulerConfig, ScanStats,
    SchedulerState, SuccessCallback, DEFAULT_SCAN_INTERVAL,
};
pub use session::{
    CameraSession, PanelMessages, SessionManager, SessionPolicy, StreamRelease,
    UnsupportedCamera,
};
