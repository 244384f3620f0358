//! Configuration types and defaults

use qrcam_core::{FacingMode, QrCamError, QrCamResult};
use qrcam_media::{
    PanelMessages, ScanSchedulerConfig, SessionPolicy, StreamRelease, UnsupportedCamera,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted frame edge in pixels (8K UHD width)
pub const MAX_FRAME_DIMENSION: u32 = 7680;

fn default_scan_interval_ms() -> u64 {
    100
}

fn default_event_capacity() -> usize {
    100
}

/// Scanner configuration
///
/// `width` and `height` are required when deserializing; everything else has a
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Width of the video and of the sampled frame, in pixels
    pub width: u32,
    /// Height of the video and of the sampled frame, in pixels
    pub height: u32,
    /// Delay between scan cycles in milliseconds
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Facing mode requested from the camera
    #[serde(default)]
    pub facing_mode: FacingMode,
    /// When camera streams are stopped
    #[serde(default)]
    pub stream_release: StreamRelease,
    /// Behaviour on hosts without a camera API
    #[serde(default)]
    pub unsupported_camera: UnsupportedCamera,
    /// Error panel texts
    #[serde(default)]
    pub messages: PanelMessages,
    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl ScannerConfig {
    /// Configuration for a `width` x `height` widget with default settings
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scan_interval_ms: default_scan_interval_ms(),
            facing_mode: FacingMode::default(),
            stream_release: StreamRelease::default(),
            unsupported_camera: UnsupportedCamera::default(),
            messages: PanelMessages::default(),
            event_capacity: default_event_capacity(),
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> QrCamResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| QrCamError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> QrCamResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(QrCamError::InvalidConfiguration {
                message: "Invalid dimensions".to_string(),
            });
        }

        if self.width > MAX_FRAME_DIMENSION || self.height > MAX_FRAME_DIMENSION {
            return Err(QrCamError::InvalidConfiguration {
                message: format!(
                    "Dimensions {}x{} exceed {} pixels",
                    self.width, self.height, MAX_FRAME_DIMENSION
                ),
            });
        }

        if self.scan_interval_ms == 0 {
            return Err(QrCamError::InvalidConfiguration {
                message: "Scan interval must be > 0".to_string(),
            });
        }

        if self.event_capacity == 0 {
            return Err(QrCamError::InvalidConfiguration {
                message: "Event capacity must be > 0".to_string(),
            });
        }

        Ok(())
    }

    /// Delay between scan cycles
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    /// Set the delay between scan cycles, rounded up to whole milliseconds
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_micros().div_ceil(1000);
        self.scan_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub(crate) fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            facing_mode: self.facing_mode,
            stream_release: self.stream_release,
            unsupported_camera: self.unsupported_camera,
            messages: self.messages.clone(),
        }
    }

    pub(crate) fn scheduler_config(&self) -> ScanSchedulerConfig {
        ScanSchedulerConfig {
            width: self.width,
            height: self.height,
            interval: self.scan_interval(),
        }
    }
}
