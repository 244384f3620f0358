//! # qrcam core
//!
//! Shared building blocks for the qrcam scanner widget: the error type, device and
//! constraint descriptions, the reusable pixel buffer, and the traits a host platform
//! implements to give the scanner a camera, a video surface and a panel view.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod constraints;
pub mod device;
pub mod error;
pub mod frame;
pub mod platform;

pub use constraints::{FacingMode, VideoConstraints};
pub use device::{DeviceDescriptor, DeviceId, DeviceKind, MediaDeviceInfo};
pub use error::{ErrorCategory, QrCamError, QrCamResult};
pub use frame::PixelBuffer;
pub use platform::{HeadlessView, MediaDevices, MediaStream, Panel, PanelView, VideoSurface};
