//! # qrcam diagnostics
//!
//! Logging setup and scan statistics reports for qrcam.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod scan_report;

// Re-export main types
pub use debug_logger::DebugLogger;
pub use scan_report::{ScanHealth, ScanReport};
