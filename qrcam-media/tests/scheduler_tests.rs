//! Tests for the scan loop
//!
//! Time is paused in every test, so sleeps advance the clock deterministically and
//! the loop's 100 ms cycles land at exact instants.

use parking_lot::Mutex;
use qrcam_core::{MediaDevices, VideoConstraints, VideoSurface};
use qrcam_media::mock::{DecodeStep, MockMediaDevices, MockVideoSurface, ScriptedDecoder};
use qrcam_media::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

struct Rig {
    surface: Arc<MockVideoSurface>,
    decoder: Arc<ScriptedDecoder>,
    scheduler: ScanScheduler,
    successes: Arc<Mutex<Vec<ScanResult>>>,
    errors: Arc<Mutex<Vec<DecodeError>>>,
    events: broadcast::Receiver<ScannerEvent>,
}

async fn rig(steps: Vec<DecodeStep>) -> Rig {
    let devices = MockMediaDevices::new();
    let surface = Arc::new(MockVideoSurface::new());
    let stream = devices
        .get_user_media(&VideoConstraints::default())
        .await
        .unwrap();
    surface.bind_stream(stream);

    let decoder = Arc::new(ScriptedDecoder::with_steps(steps));
    let successes = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let (event_tx, events) = broadcast::channel(100);

    let on_success = successes.clone();
    let on_error = errors.clone();
    let callbacks = ScanCallbacks::new(
        move |result| on_success.lock().push(result),
        move |error| on_error.lock().push(error),
    );

    let scheduler = ScanScheduler::new(
        ScanSchedulerConfig::new(8, 8),
        surface.clone(),
        DecodeBridge::new(decoder.clone()),
        callbacks,
        event_tx,
    );

    Rig {
        surface,
        decoder,
        scheduler,
        successes,
        errors,
        events,
    }
}

fn drain(events: &mut broadcast::Receiver<ScannerEvent>) -> Vec<ScannerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

// ============================================================================
// RESCHEDULING TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reschedules_once_per_cycle_regardless_of_outcome() {
    let rig = rig(vec![
        DecodeStep::Decode("first".to_string()),
        DecodeStep::Fail(DecodeError::NotFound),
        DecodeStep::Panic("decoder blew up".to_string()),
        DecodeStep::Fail(DecodeError::Internal {
            reason: "bad state".to_string(),
        }),
        DecodeStep::Decode("second".to_string()),
    ])
    .await;

    rig.scheduler.start();
    sleep(Duration::from_millis(550)).await;

    assert_eq!(rig.decoder.calls(), 5);
    let successes = rig.successes.lock().clone();
    assert_eq!(successes.len(), 2);
    assert_eq!(successes[0].text(), Some("first"));
    assert_eq!(successes[0].cycle, 1);
    assert_eq!(successes[1].text(), Some("second"));
    assert_eq!(successes[1].cycle, 5);
    assert_eq!(rig.errors.lock().len(), 3);
    assert_eq!(rig.scheduler.state(), SchedulerState::Scheduled);

    let stats = rig.scheduler.stats();
    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.decoder_faults, 2);
    assert!(stats.last_success_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_panic_on_first_cycle_still_schedules_second() {
    let rig = rig(vec![
        DecodeStep::Panic("no finder patterns".to_string()),
        DecodeStep::Decode("payload".to_string()),
    ])
    .await;

    rig.scheduler.start();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(
        rig.errors.lock().clone(),
        vec![DecodeError::Panicked {
            message: "no finder patterns".to_string()
        }]
    );
    assert!(rig.successes.lock().is_empty());

    sleep(Duration::from_millis(100)).await;

    assert_eq!(rig.errors.lock().len(), 1);
    let successes = rig.successes.lock().clone();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].cycle, 2);
}

#[tokio::test(start_paused = true)]
async fn test_frame_is_copied_before_each_decode() {
    let rig = rig(Vec::new()).await;

    rig.scheduler.start();
    sleep(Duration::from_millis(350)).await;

    assert_eq!(rig.surface.frames_drawn(), 3);
    assert_eq!(rig.decoder.frames_seen(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_frame_failure_is_reported_and_rescheduled() {
    let rig = rig(Vec::new()).await;
    rig.surface.set_fail_draws(true);

    rig.scheduler.start();
    sleep(Duration::from_millis(250)).await;

    assert_eq!(rig.decoder.calls(), 0);
    let errors = rig.errors.lock().clone();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], DecodeError::FrameUnavailable { .. }));
    assert_eq!(rig.scheduler.stats().frame_failures, 2);

    rig.surface.set_fail_draws(false);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.decoder.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_callback_does_not_stop_loop() {
    let surface = Arc::new(MockVideoSurface::new());
    let stream = MockMediaDevices::new()
        .get_user_media(&VideoConstraints::default())
        .await
        .unwrap();
    surface.bind_stream(stream);
    let decoder = Arc::new(ScriptedDecoder::new());
    let (event_tx, _) = broadcast::channel(100);

    let scheduler = ScanScheduler::new(
        ScanSchedulerConfig::new(4, 4),
        surface,
        DecodeBridge::new(decoder.clone()),
        ScanCallbacks::new(|_| {}, |_| panic!("handler bug")),
        event_tx,
    );

    scheduler.start();
    sleep(Duration::from_millis(350)).await;

    assert_eq!(decoder.calls(), 3);
    assert!(scheduler.is_running());
}

// ============================================================================
// TIMER HANDLE TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_keeps_a_single_pending_cycle() {
    let rig = rig(Vec::new()).await;

    rig.scheduler.start();
    rig.scheduler.start();
    rig.scheduler.start();
    sleep(Duration::from_millis(350)).await;

    assert_eq!(rig.decoder.calls(), 3);
    assert_eq!(rig.scheduler.stats().starts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_next_cycle() {
    let mut rig = rig(Vec::new()).await;

    rig.scheduler.start();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(rig.decoder.calls(), 1);

    rig.scheduler.stop();
    assert_eq!(rig.scheduler.state(), SchedulerState::Idle);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.decoder.calls(), 1);

    let events = drain(&mut rig.events);
    assert_eq!(events.first(), Some(&ScannerEvent::ScanStarted));
    assert_eq!(events.last(), Some(&ScannerEvent::ScanStopped));
}

#[tokio::test(start_paused = true)]
async fn test_stop_when_idle_is_silent() {
    let mut rig = rig(Vec::new()).await;

    rig.scheduler.stop();

    assert_eq!(rig.scheduler.state(), SchedulerState::Idle);
    assert!(drain(&mut rig.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_after_stop_resumes() {
    let rig = rig(Vec::new()).await;

    rig.scheduler.start();
    rig.scheduler.stop();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(rig.decoder.calls(), 0);

    rig.scheduler.start();
    sleep(Duration::from_millis(250)).await;
    assert_eq!(rig.decoder.calls(), 2);
}

// ============================================================================
// DETACHMENT TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_detach_ends_loop_and_clears_handle() {
    let mut rig = rig(Vec::new()).await;

    rig.scheduler.start();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(rig.decoder.calls(), 1);

    rig.surface.detach();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.scheduler.state(), SchedulerState::Idle);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.decoder.calls(), 1);
    assert!(drain(&mut rig.events).contains(&ScannerEvent::VideoDetached));
}

#[tokio::test(start_paused = true)]
async fn test_start_on_detached_surface_runs_no_cycle() {
    let rig = rig(Vec::new()).await;
    rig.surface.detach();

    rig.scheduler.start();
    sleep(Duration::from_millis(500)).await;

    assert_eq!(rig.decoder.calls(), 0);
    assert!(!rig.scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_reattach_and_restart() {
    let rig = rig(Vec::new()).await;

    rig.scheduler.start();
    rig.surface.detach();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(rig.decoder.calls(), 0);

    rig.surface.attach();
    rig.scheduler.start();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(rig.decoder.calls(), 1);
}
