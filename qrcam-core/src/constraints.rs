//! Camera acquisition constraints

use crate::device::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, the usual choice for scanning codes
    #[default]
    Environment,
    /// Front camera
    User,
}

impl FacingMode {
    /// Host-level name of the facing mode
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// Video constraints passed to the host acquisition API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    /// Preferred facing mode
    pub facing_mode: FacingMode,
    /// Exact device to open, `None` lets the host pick
    pub device_id: Option<DeviceId>,
}

impl VideoConstraints {
    /// Constraints for an optional preferred device
    pub fn for_device(facing_mode: FacingMode, device_id: Option<DeviceId>) -> Self {
        Self {
            facing_mode,
            device_id,
        }
    }

    /// Whether the constraints pin a specific device
    pub fn is_exact(&self) -> bool {
        self.device_id.is_some()
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self::for_device(FacingMode::Environment, None)
    }
}

impl fmt::Display for VideoConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device_id {
            Some(id) => write!(
                f,
                "facingMode={} deviceId={{exact: {}}}",
                self.facing_mode.as_str(),
                id
            ),
            None => write!(f, "facingMode={}", self.facing_mode.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_face_environment() {
        let constraints = VideoConstraints::default();
        assert_eq!(constraints.facing_mode, FacingMode::Environment);
        assert!(!constraints.is_exact());
        assert_eq!(constraints.to_string(), "facingMode=environment");
    }

    #[test]
    fn test_exact_device_constraint() {
        let constraints =
            VideoConstraints::for_device(FacingMode::Environment, Some(DeviceId::new("cam-2")));
        assert!(constraints.is_exact());
        assert_eq!(
            constraints.to_string(),
            "facingMode=environment deviceId={exact: cam-2}"
        );
    }
}
