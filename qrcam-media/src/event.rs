//! Scanner lifecycle events

use qrcam_core::{DeviceId, Panel};
use serde::Serialize;

/// Events broadcast while a scanner runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScannerEvent {
    /// The visible panel changed
    PanelChanged {
        /// Panel now visible
        panel: Panel,
    },
    /// A camera stream was acquired and bound
    CameraAcquired {
        /// Host stream identifier
        stream_id: String,
        /// Requested device, `None` for the default camera
        device_id: Option<DeviceId>,
    },
    /// Camera acquisition failed
    CameraError {
        /// Message shown to the user
        message: String,
        /// Underlying error
        error: String,
    },
    /// A camera stream was released
    StreamReleased {
        /// Host stream identifier
        stream_id: String,
    },
    /// Video inputs were listed
    DevicesEnumerated {
        /// Number of video inputs
        count: usize,
    },
    /// The scan loop was (re)started
    ScanStarted,
    /// The scan loop was stopped by the caller
    ScanStopped,
    /// The video surface left the document and the scan loop ended
    VideoDetached,
    /// A code was decoded
    CodeDetected {
        /// Cycle that produced the code
        cycle: u64,
        /// UTF-8 payload, if the payload is text
        text: Option<String>,
    },
    /// A scan cycle produced no code
    ScanFailed {
        /// Cycle number
        cycle: u64,
        /// Failure description
        error: String,
    },
}

impl ScannerEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ScannerEvent::PanelChanged { .. } => "panel_changed",
            ScannerEvent::CameraAcquired { .. } => "camera_acquired",
            ScannerEvent::CameraError { .. } => "camera_error",
            ScannerEvent::StreamReleased { .. } => "stream_released",
            ScannerEvent::DevicesEnumerated { .. } => "devices_enumerated",
            ScannerEvent::ScanStarted => "scan_started",
            ScannerEvent::ScanStopped => "scan_stopped",
            ScannerEvent::VideoDetached => "video_detached",
            ScannerEvent::CodeDetected { .. } => "code_detected",
            ScannerEvent::ScanFailed { .. } => "scan_failed",
        }
    }

    /// Check if this is a camera session event
    pub fn is_session_event(&self) -> bool {
        matches!(
            self,
            ScannerEvent::CameraAcquired { .. }
                | ScannerEvent::CameraError { .. }
                | ScannerEvent::StreamReleased { .. }
                | ScannerEvent::DevicesEnumerated { .. }
        )
    }

    /// Check if this is a scan loop event
    pub fn is_scan_event(&self) -> bool {
        matches!(
            self,
            ScannerEvent::ScanStarted
                | ScannerEvent::ScanStopped
                | ScannerEvent::VideoDetached
                | ScannerEvent::CodeDetected { .. }
                | ScannerEvent::ScanFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_groups() {
        let acquired = ScannerEvent::CameraAcquired {
            stream_id: "s0".to_string(),
            device_id: None,
        };
        assert!(acquired.is_session_event());
        assert!(!acquired.is_scan_event());

        let detected = ScannerEvent::CodeDetected {
            cycle: 3,
            text: Some("hello".to_string()),
        };
        assert!(detected.is_scan_event());
        assert_eq!(detected.event_type(), "code_detected");

        let panel = ScannerEvent::PanelChanged {
            panel: Panel::Video,
        };
        assert!(!panel.is_session_event());
        assert!(!panel.is_scan_event());
    }
}
