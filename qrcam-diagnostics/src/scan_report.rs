//! Scan statistics reports

use chrono::{DateTime, Utc};
use qrcam_media::ScanStats;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse condition of a scan loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanHealth {
    /// No cycle has run
    Idle,
    /// At least one code was decoded
    Detecting,
    /// Frames arrive but no code was read yet
    Searching,
    /// Most cycles fail before or inside the decoder
    Degraded,
}

/// Serializable summary of a scanner's statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Scanner the report belongs to
    pub scanner_id: Option<Uuid>,
    /// Cycles run
    pub cycles: u64,
    /// Cycles that decoded a code
    pub successes: u64,
    /// Cycles that found nothing readable
    pub failures: u64,
    /// Cycles without a frame
    pub frame_failures: u64,
    /// Cycles where the decoder faulted
    pub decoder_faults: u64,
    /// Loop starts
    pub starts: u64,
    /// Share of cycles that decoded a code (0.0 to 1.0)
    pub success_rate: f64,
    /// Time since the first start, in milliseconds
    pub uptime_ms: Option<i64>,
    /// Most recent decoded code
    pub last_success_at: Option<DateTime<Utc>>,
    /// Overall condition
    pub health: ScanHealth,
    /// When the report was built
    pub generated_at: DateTime<Utc>,
}

impl ScanReport {
    /// Build a report from a statistics snapshot
    pub fn from_stats(stats: &ScanStats) -> Self {
        Self::from_stats_at(stats, Utc::now())
    }

    /// Build a report as of `now`
    pub fn from_stats_at(stats: &ScanStats, now: DateTime<Utc>) -> Self {
        let success_rate = if stats.cycles == 0 {
            0.0
        } else {
            stats.successes as f64 / stats.cycles as f64
        };

        Self {
            scanner_id: None,
            cycles: stats.cycles,
            successes: stats.successes,
            failures: stats.failures,
            frame_failures: stats.frame_failures,
            decoder_faults: stats.decoder_faults,
            starts: stats.starts,
            success_rate,
            uptime_ms: stats
                .started_at
                .map(|started| (now - started).num_milliseconds()),
            last_success_at: stats.last_success_at,
            health: Self::health_of(stats),
            generated_at: now,
        }
    }

    /// Tag the report with a scanner id
    pub fn with_scanner_id(mut self, id: Uuid) -> Self {
        self.scanner_id = Some(id);
        self
    }

    fn health_of(stats: &ScanStats) -> ScanHealth {
        if stats.cycles == 0 {
            return ScanHealth::Idle;
        }
        let faults = stats.frame_failures + stats.decoder_faults;
        if faults * 2 > stats.cycles {
            ScanHealth::Degraded
        } else if stats.successes > 0 {
            ScanHealth::Detecting
        } else {
            ScanHealth::Searching
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
