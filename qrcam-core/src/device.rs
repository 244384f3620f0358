//! Media device descriptions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a media device as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of media device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Camera
    VideoInput,
    /// Microphone
    AudioInput,
    /// Speaker or headphones
    AudioOutput,
}

/// One entry of a host device listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    /// Device kind
    pub kind: DeviceKind,
    /// Device identifier
    pub device_id: DeviceId,
    /// Human readable label, may be empty before permission is granted
    pub label: String,
}

impl MediaDeviceInfo {
    /// Describe a camera
    pub fn video_input(device_id: impl Into<DeviceId>, label: impl Into<String>) -> Self {
        Self {
            kind: DeviceKind::VideoInput,
            device_id: device_id.into(),
            label: label.into(),
        }
    }

    /// Whether this entry is a camera
    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

/// A camera the registry can switch to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device identifier
    pub device_id: DeviceId,
    /// Display label
    pub label: String,
}

impl From<MediaDeviceInfo> for DeviceDescriptor {
    fn from(info: MediaDeviceInfo) -> Self {
        Self {
            device_id: info.device_id,
            label: info.label,
        }
    }
}
