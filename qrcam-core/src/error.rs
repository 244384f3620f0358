//! Error types for the qrcam scanner

use thiserror::Error;

/// Main error type for scanner operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrCamError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// The host exposes no camera acquisition API
    #[error("Camera not supported")]
    CameraNotSupported,

    /// The user or host refused camera access
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Device not found error
    #[error("Device not found: {device_id}")]
    DeviceNotFound {
        /// Device identifier
        device_id: String,
    },

    /// No camera can satisfy the requested constraints
    #[error("Constraint cannot be satisfied: {constraint}")]
    ConstraintUnsatisfiable {
        /// Constraint description
        constraint: String,
    },

    /// Camera acquisition failed for another reason
    #[error("Camera acquisition failed: {reason}")]
    CameraAcquisition {
        /// Failure reason
        reason: String,
    },

    /// A newer acquisition request replaced this one before it completed
    #[error("Acquisition {generation} superseded by a newer request")]
    AcquisitionSuperseded {
        /// Generation of the superseded request
        generation: u64,
    },

    /// The host cannot list media devices
    #[error("Device enumeration not supported")]
    DeviceEnumerationUnsupported,

    /// Device enumeration failed
    #[error("Device enumeration failed: {reason}")]
    DeviceEnumerationFailed {
        /// Failure reason
        reason: String,
    },

    /// Device switching was requested before the first enumeration
    #[error("Video inputs have not been enumerated yet")]
    DevicesNotEnumerated,

    /// Enumeration returned no video inputs
    #[error("No video inputs available")]
    NoVideoInputs,

    /// The video surface could not provide a frame
    #[error("Frame unavailable: {reason}")]
    FrameUnavailable {
        /// Failure reason
        reason: String,
    },

    /// Invalid frame data error
    #[error("Invalid frame data: expected {expected} bytes, got {actual}")]
    InvalidFrameData {
        /// Expected data size
        expected: usize,
        /// Actual data size
        actual: usize,
    },

    /// Invalid state for operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },
}

/// Result type alias for scanner operations
pub type QrCamResult<T> = Result<T, QrCamError>;

impl QrCamError {
    /// Check if error is recoverable
    ///
    /// Recoverable errors can go away without user intervention on the host, e.g. by
    /// switching to another camera or retrying once the device list is known.
    pub fn is_recoverable(&self) -> bool {
        match self {
            QrCamError::DeviceNotFound { .. } => true,
            QrCamError::ConstraintUnsatisfiable { .. } => true,
            QrCamError::AcquisitionSuperseded { .. } => true,
            QrCamError::DevicesNotEnumerated => true,
            QrCamError::FrameUnavailable { .. } => true,
            QrCamError::CameraAcquisition { .. } => true,
            QrCamError::CameraNotSupported => false,
            QrCamError::PermissionDenied { .. } => false,
            QrCamError::DeviceEnumerationUnsupported => false,
            _ => false,
        }
    }

    /// Whether this error came out of a camera acquisition attempt
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            QrCamError::CameraNotSupported
                | QrCamError::PermissionDenied { .. }
                | QrCamError::DeviceNotFound { .. }
                | QrCamError::ConstraintUnsatisfiable { .. }
                | QrCamError::CameraAcquisition { .. }
        )
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            QrCamError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            QrCamError::MissingConfiguration { .. } => ErrorCategory::Configuration,
            QrCamError::CameraNotSupported => ErrorCategory::Platform,
            QrCamError::PermissionDenied { .. } => ErrorCategory::System,
            QrCamError::DeviceNotFound { .. } => ErrorCategory::Device,
            QrCamError::ConstraintUnsatisfiable { .. } => ErrorCategory::Device,
            QrCamError::CameraAcquisition { .. } => ErrorCategory::Device,
            QrCamError::AcquisitionSuperseded { .. } => ErrorCategory::State,
            QrCamError::DeviceEnumerationUnsupported => ErrorCategory::Platform,
            QrCamError::DeviceEnumerationFailed { .. } => ErrorCategory::Device,
            QrCamError::DevicesNotEnumerated => ErrorCategory::State,
            QrCamError::NoVideoInputs => ErrorCategory::Device,
            QrCamError::FrameUnavailable { .. } => ErrorCategory::Data,
            QrCamError::InvalidFrameData { .. } => ErrorCategory::Data,
            QrCamError::InvalidState { .. } => ErrorCategory::State,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (permissions, host refusals)
    System,
    /// Configuration and parameter errors
    Configuration,
    /// Platform capability errors
    Platform,
    /// Device and hardware errors
    Device,
    /// State management errors
    State,
    /// Frame data errors
    Data,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let denied = QrCamError::PermissionDenied {
            operation: "getUserMedia".to_string(),
        };
        assert_eq!(denied.category(), ErrorCategory::System);
        assert!(!denied.is_recoverable());
        assert!(denied.is_acquisition_failure());

        let superseded = QrCamError::AcquisitionSuperseded { generation: 3 };
        assert_eq!(superseded.category(), ErrorCategory::State);
        assert!(superseded.is_recoverable());
        assert!(!superseded.is_acquisition_failure());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            QrCamError::CameraNotSupported.to_string(),
            "Camera not supported"
        );
        let error = QrCamError::InvalidFrameData {
            expected: 1024,
            actual: 512,
        };
        assert_eq!(
            error.to_string(),
            "Invalid frame data: expected 1024 bytes, got 512"
        );
    }
}
