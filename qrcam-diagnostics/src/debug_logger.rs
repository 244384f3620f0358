//! Structured logging setup

use qrcam_core::{QrCamError, QrCamResult};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Installs a `tracing` subscriber for scanner logs
#[derive(Debug, Clone)]
pub struct DebugLogger {
    filter: String,
    with_target: bool,
}

impl DebugLogger {
    /// Logger with the default filter
    pub fn new() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            with_target: true,
        }
    }

    /// Use `filter` when `RUST_LOG` is unset, e.g. `"qrcam_media=debug"`
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    /// Include the event target in every line
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Install the global subscriber
    ///
    /// Fails if the filter does not parse or a subscriber is already installed.
    pub fn init(&self) -> QrCamResult<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.filter).map_err(|e| {
                QrCamError::InvalidConfiguration {
                    message: format!("Invalid log filter '{}': {}", self.filter, e),
                }
            })?,
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.with_target)
            .try_init()
            .map_err(|e| QrCamError::InvalidState {
                message: format!("Logging already initialized: {}", e),
            })?;

        debug!(fallback = %self.filter, "Logging initialized");
        Ok(())
    }

    /// Initialize logging with the default filter
    pub fn init_logging() -> QrCamResult<()> {
        Self::new().init()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
