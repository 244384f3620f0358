//! Video input enumeration and cyclic device switching

use crate::display::DisplayController;
use crate::event::ScannerEvent;
use parking_lot::RwLock;
use qrcam_core::{DeviceDescriptor, DeviceId, MediaDevices, QrCamError, QrCamResult};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Fewest cameras for which switching makes sense
pub const MIN_DEVICES_FOR_SWITCH: usize = 2;

/// Index of the device after `current`, wrapping around
///
/// An absent or unknown `current` counts as index -1, so the first device is
/// chosen. Returns `None` for an empty list.
pub fn next_device_index(
    devices: &[DeviceDescriptor],
    current: Option<&DeviceId>,
) -> Option<usize> {
    if devices.is_empty() {
        return None;
    }
    let position = current.and_then(|id| devices.iter().rposition(|d| &d.device_id == id));
    Some(position.map_or(0, |index| (index + 1) % devices.len()))
}

/// Ordered list of the host's video inputs
pub struct DeviceRegistry {
    devices: Arc<dyn MediaDevices>,
    display: Arc<DisplayController>,
    event_tx: broadcast::Sender<ScannerEvent>,
    inputs: RwLock<Option<Vec<DeviceDescriptor>>>,
}

impl DeviceRegistry {
    /// Create an unpopulated registry
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        display: Arc<DisplayController>,
        event_tx: broadcast::Sender<ScannerEvent>,
    ) -> Self {
        Self {
            devices,
            display,
            event_tx,
            inputs: RwLock::new(None),
        }
    }

    /// List the host's video inputs and update the switch control
    ///
    /// Returns the number of video inputs found. Hosts that cannot list devices
    /// leave the registry populated with an empty list, so the listing is not
    /// attempted again; a failed listing leaves it unpopulated.
    pub async fn refresh(&self) -> QrCamResult<usize> {
        if !self.devices.supports_enumeration() {
            warn!("Device enumeration not supported, hiding switch control");
            self.display.set_switch_control_visible(false);
            *self.inputs.write() = Some(Vec::new());
            return Err(QrCamError::DeviceEnumerationUnsupported);
        }

        let listed = match self.devices.enumerate_devices().await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("Device enumeration failed: {}", e);
                self.display.set_switch_control_visible(false);
                return Err(e);
            }
        };

        let inputs: Vec<DeviceDescriptor> = listed
            .into_iter()
            .filter(|info| info.is_video_input())
            .map(DeviceDescriptor::from)
            .collect();
        let count = inputs.len();

        self.display
            .set_switch_control_visible(count >= MIN_DEVICES_FOR_SWITCH);
        *self.inputs.write() = Some(inputs);

        info!(count, "Video inputs enumerated");
        let _ = self.event_tx.send(ScannerEvent::DevicesEnumerated { count });
        Ok(count)
    }

    /// Identifier of the device following `current`
    pub fn switch_to_next(&self, current: Option<&DeviceId>) -> QrCamResult<DeviceId> {
        let inputs = self.inputs.read();
        let inputs = inputs.as_ref().ok_or(QrCamError::DevicesNotEnumerated)?;
        let index = next_device_index(inputs, current).ok_or(QrCamError::NoVideoInputs)?;

        let next = inputs[index].device_id.clone();
        debug!(from = ?current, to = %next, "Switching video input");
        Ok(next)
    }

    /// Whether a listing has been stored
    pub fn is_populated(&self) -> bool {
        self.inputs.read().is_some()
    }

    /// Stored video inputs, empty before the first listing
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.inputs.read().clone().unwrap_or_default()
    }

    /// Number of stored video inputs
    pub fn len(&self) -> usize {
        self.inputs.read().as_ref().map_or(0, Vec::len)
    }

    /// Whether no video inputs are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
