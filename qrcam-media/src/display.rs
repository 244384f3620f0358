//! Exclusive panel visibility
//!
//! The widget shows exactly one of its loading, error and video panels. The
//! controller keeps that choice as an explicit value and tells the host view about
//! every transition, so the visible panel never depends on how the host lays out
//! its elements.

use crate::event::ScannerEvent;
use parking_lot::RwLock;
use qrcam_core::{Panel, PanelView};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Visual state owned by the [`DisplayController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    /// The one visible panel
    pub visible: Panel,
    /// Text of the error panel
    pub error_message: Option<String>,
    /// Whether the camera switch control is shown
    pub switch_control_visible: bool,
}

impl PanelState {
    /// Transition to `panel` being the visible one
    pub fn activate(self, panel: Panel) -> Self {
        Self {
            visible: panel,
            ..self
        }
    }

    /// Whether `panel` is shown in this state
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.visible == panel
    }

    /// Visibility flag of every panel, in mount order
    pub fn visibility(&self) -> [(Panel, bool); 3] {
        Panel::ALL.map(|panel| (panel, self.is_visible(panel)))
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            visible: Panel::Loading,
            error_message: None,
            switch_control_visible: false,
        }
    }
}

/// Owns the panel state and forwards it to the host view
pub struct DisplayController {
    state: RwLock<PanelState>,
    view: Arc<dyn PanelView>,
    event_tx: broadcast::Sender<ScannerEvent>,
}

impl DisplayController {
    /// Create a controller showing the loading panel
    pub fn new(view: Arc<dyn PanelView>, event_tx: broadcast::Sender<ScannerEvent>) -> Self {
        Self {
            state: RwLock::new(PanelState::default()),
            view,
            event_tx,
        }
    }

    /// Make `panel` the only visible panel
    pub fn activate(&self, panel: Panel) {
        let previous = {
            let mut state = self.state.write();
            let previous = state.visible;
            let next = (*state).clone().activate(panel);
            *state = next;
            previous
        };

        self.view.show_panel(panel);
        if previous != panel {
            debug!(from = %previous, to = %panel, "Panel changed");
            let _ = self.event_tx.send(ScannerEvent::PanelChanged { panel });
        }
    }

    /// Set the error text and show the error panel
    pub fn show_error(&self, message: &str) {
        self.state.write().error_message = Some(message.to_string());
        self.view.set_error_message(message);
        self.activate(Panel::Error);
    }

    /// Show or hide the camera switch control
    pub fn set_switch_control_visible(&self, visible: bool) {
        self.state.write().switch_control_visible = visible;
        self.view.set_switch_control_visible(visible);
    }

    /// Currently visible panel
    pub fn current(&self) -> Panel {
        self.state.read().visible
    }

    /// Whether `panel` is visible
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.state.read().is_visible(panel)
    }

    /// Current error text
    pub fn error_message(&self) -> Option<String> {
        self.state.read().error_message.clone()
    }

    /// Whether the switch control is shown
    pub fn switch_control_visible(&self) -> bool {
        self.state.read().switch_control_visible
    }

    /// Snapshot of the whole panel state
    pub fn snapshot(&self) -> PanelState {
        self.state.read().clone()
    }
}
