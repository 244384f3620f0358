//! Periodic frame sampling and decoding
//!
//! The scheduler keeps at most one scan task alive. Each cycle waits the scan
//! interval, copies the current video frame into a buffer owned by the task, submits
//! it to the decoder and reports the outcome. Whatever the outcome, the next cycle
//! follows; the loop only ends on [`ScanScheduler::stop`], on a restart, or when the
//! video surface leaves the document.

use crate::decode::{DecodeBridge, DecodeError, DecodedPayload};
use crate::event::ScannerEvent;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use qrcam_core::{PixelBuffer, VideoSurface};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delay between scan cycles when none is configured
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// Called with every decoded code
pub type SuccessCallback = Arc<dyn Fn(ScanResult) + Send + Sync>;

/// Called with every unsuccessful scan cycle
pub type ErrorCallback = Arc<dyn Fn(DecodeError) + Send + Sync>;

/// Caller-supplied scan outcome handlers
#[derive(Clone)]
pub struct ScanCallbacks {
    /// Success handler
    pub on_success: SuccessCallback,
    /// Failure handler
    pub on_error: ErrorCallback,
}

impl ScanCallbacks {
    /// Bundle two handlers
    pub fn new(
        on_success: impl Fn(ScanResult) + Send + Sync + 'static,
        on_error: impl Fn(DecodeError) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_success: Arc::new(on_success),
            on_error: Arc::new(on_error),
        }
    }
}

/// A decoded code and the cycle that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Decoded content
    pub payload: DecodedPayload,
    /// Cycle number within the scan task, starting at 1
    pub cycle: u64,
    /// When the code was decoded
    pub detected_at: DateTime<Utc>,
}

impl ScanResult {
    /// Payload as text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        self.payload.as_str()
    }
}

/// Scan loop statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Cycles run
    pub cycles: u64,
    /// Cycles that decoded a code
    pub successes: u64,
    /// Cycles that found nothing readable
    pub failures: u64,
    /// Cycles where no frame could be copied
    pub frame_failures: u64,
    /// Cycles where the decoder faulted or panicked
    pub decoder_faults: u64,
    /// Times the loop was started
    pub starts: u64,
    /// First start
    pub started_at: Option<DateTime<Utc>>,
    /// Most recent decoded code
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No cycle pending
    Idle,
    /// A cycle is pending
    Scheduled,
}

/// Scan loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSchedulerConfig {
    /// Sampling width in pixels
    pub width: u32,
    /// Sampling height in pixels
    pub height: u32,
    /// Delay between cycles
    pub interval: Duration,
}

impl ScanSchedulerConfig {
    /// Configuration with the default interval
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

#[derive(Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

/// Owner of the single scan task
pub struct ScanScheduler {
    config: ScanSchedulerConfig,
    surface: Arc<dyn VideoSurface>,
    bridge: DecodeBridge,
    callbacks: ScanCallbacks,
    stats: Arc<RwLock<ScanStats>>,
    slot: Arc<Mutex<TimerSlot>>,
    event_tx: broadcast::Sender<ScannerEvent>,
}

impl ScanScheduler {
    /// Create an idle scheduler
    pub fn new(
        config: ScanSchedulerConfig,
        surface: Arc<dyn VideoSurface>,
        bridge: DecodeBridge,
        callbacks: ScanCallbacks,
        event_tx: broadcast::Sender<ScannerEvent>,
    ) -> Self {
        Self {
            config,
            surface,
            bridge,
            callbacks,
            stats: Arc::new(RwLock::new(ScanStats::default())),
            slot: Arc::new(Mutex::new(TimerSlot::default())),
            event_tx,
        }
    }

    /// Schedule the first cycle, replacing any pending one
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.handle.take() {
            previous.abort();
            debug!("Replaced pending scan cycle");
        }
        slot.generation += 1;
        let generation = slot.generation;

        let scan_loop = ScanLoop {
            config: self.config.clone(),
            surface: self.surface.clone(),
            bridge: self.bridge.clone(),
            callbacks: self.callbacks.clone(),
            stats: self.stats.clone(),
            slot: self.slot.clone(),
            event_tx: self.event_tx.clone(),
        };
        slot.handle = Some(tokio::spawn(scan_loop.run(generation)));
        drop(slot);

        {
            let mut stats = self.stats.write();
            stats.starts += 1;
            stats.started_at.get_or_insert_with(Utc::now);
        }

        debug!(interval = ?self.config.interval, "Scan loop started");
        let _ = self.event_tx.send(ScannerEvent::ScanStarted);
    }

    /// Cancel the pending cycle and go idle
    pub fn stop(&self) {
        let pending = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.handle.take()
        };
        if let Some(handle) = pending {
            handle.abort();
            info!("Scan loop stopped");
            let _ = self.event_tx.send(ScannerEvent::ScanStopped);
        }
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        match &self.slot.lock().handle {
            Some(handle) if !handle.is_finished() => SchedulerState::Scheduled,
            _ => SchedulerState::Idle,
        }
    }

    /// Whether a cycle is pending
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Scheduled
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Loop configuration
    pub fn config(&self) -> &ScanSchedulerConfig {
        &self.config
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.lock().handle.take() {
            handle.abort();
        }
    }
}

struct ScanLoop {
    config: ScanSchedulerConfig,
    surface: Arc<dyn VideoSurface>,
    bridge: DecodeBridge,
    callbacks: ScanCallbacks,
    stats: Arc<RwLock<ScanStats>>,
    slot: Arc<Mutex<TimerSlot>>,
    event_tx: broadcast::Sender<ScannerEvent>,
}

impl ScanLoop {
    async fn run(self, generation: u64) {
        let mut buffer = PixelBuffer::new(self.config.width, self.config.height);
        let mut attachment = self.surface.attachment();
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = wait_for_detach(&mut attachment) => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            if !*attachment.borrow() {
                break;
            }

            cycle += 1;
            self.run_cycle(cycle, &mut buffer);
        }

        self.finish_detached(generation, cycle);
    }

    fn run_cycle(&self, cycle: u64, buffer: &mut PixelBuffer) {
        let outcome = match self.surface.draw_frame(buffer) {
            Ok(()) => self.bridge.submit(buffer),
            Err(e) => Err(DecodeError::FrameUnavailable {
                reason: e.to_string(),
            }),
        };

        match outcome {
            Ok(payload) => {
                let result = ScanResult {
                    payload,
                    cycle,
                    detected_at: Utc::now(),
                };
                {
                    let mut stats = self.stats.write();
                    stats.cycles += 1;
                    stats.successes += 1;
                    stats.last_success_at = Some(result.detected_at);
                }

                info!(cycle, bytes = result.payload.len(), "QR code detected");
                let _ = self.event_tx.send(ScannerEvent::CodeDetected {
                    cycle,
                    text: result.text().map(str::to_string),
                });
                let on_success = &self.callbacks.on_success;
                guard_callback("on_scan_success", || on_success(result));
            }
            Err(error) => {
                {
                    let mut stats = self.stats.write();
                    stats.cycles += 1;
                    match &error {
                        DecodeError::FrameUnavailable { .. } => stats.frame_failures += 1,
                        DecodeError::Internal { .. } | DecodeError::Panicked { .. } => {
                            stats.decoder_faults += 1
                        }
                        DecodeError::NotFound | DecodeError::Malformed { .. } => {
                            stats.failures += 1
                        }
                    }
                }

                if error.is_expected() {
                    debug!(cycle, "{}", error);
                } else {
                    warn!(cycle, "Scan cycle failed: {}", error);
                }
                let _ = self.event_tx.send(ScannerEvent::ScanFailed {
                    cycle,
                    error: error.to_string(),
                });
                let on_error = &self.callbacks.on_error;
                guard_callback("on_scan_error", || on_error(error));
            }
        }
    }

    fn finish_detached(&self, generation: u64, cycles: u64) {
        {
            let mut slot = self.slot.lock();
            if slot.generation == generation {
                slot.handle = None;
            }
        }
        info!(cycles, "Video surface detached, scan loop ended");
        let _ = self.event_tx.send(ScannerEvent::VideoDetached);
    }
}

/// Resolves once the surface reports detached, or its sender is gone
async fn wait_for_detach(attachment: &mut watch::Receiver<bool>) {
    loop {
        if !*attachment.borrow_and_update() {
            return;
        }
        if attachment.changed().await.is_err() {
            return;
        }
    }
}

fn guard_callback(name: &str, callback: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!(callback = name, "Scan callback panicked");
    }
}
