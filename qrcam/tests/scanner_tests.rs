//! End-to-end tests for the scanner facade

use qrcam::mock::{DecodeStep, MockMediaDevices, MockVideoSurface, RecordingView, ScriptedDecoder};
use qrcam::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

struct Host {
    devices: Arc<MockMediaDevices>,
    surface: Arc<MockVideoSurface>,
    view: Arc<RecordingView>,
    decoder: Arc<ScriptedDecoder>,
    codes: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<DecodeError>>>,
}

impl Host {
    fn new(devices: MockMediaDevices) -> Self {
        Self {
            devices: Arc::new(devices),
            surface: Arc::new(MockVideoSurface::new()),
            view: Arc::new(RecordingView::new()),
            decoder: Arc::new(ScriptedDecoder::new()),
            codes: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn builder(&self, config: ScannerConfig) -> ScannerBuilder {
        let codes = self.codes.clone();
        let errors = self.errors.clone();
        QrScanner::builder(config)
            .devices(self.devices.clone())
            .surface(self.surface.clone())
            .view(self.view.clone())
            .decoder(self.decoder.clone())
            .on_scan_success(move |result| {
                let text = result.text().unwrap_or_default().to_string();
                codes.lock().unwrap().push(text);
            })
            .on_scan_error(move |error| errors.lock().unwrap().push(error))
    }

    async fn start(&self) -> QrScanner {
        let scanner = self
            .builder(ScannerConfig::new(64, 48))
            .start()
            .await
            .unwrap();
        settle().await;
        scanner
    }
}

/// Let the background camera request finish; the clock is paused, so this only
/// advances it by a millisecond once every ready task has run.
async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// BUILDER TESTS
// ============================================================================

#[tokio::test]
async fn test_builder_requires_devices() {
    let result = QrScanner::builder(ScannerConfig::new(64, 48))
        .surface(Arc::new(MockVideoSurface::new()))
        .decoder(Arc::new(ScriptedDecoder::new()))
        .on_scan_success(|_| {})
        .on_scan_error(|_| {})
        .start()
        .await;

    match result {
        Err(QrCamError::MissingConfiguration { field }) => assert_eq!(field, "devices"),
        other => panic!("expected missing devices, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_builder_requires_callbacks() {
    let result = QrScanner::builder(ScannerConfig::new(64, 48))
        .devices(Arc::new(MockMediaDevices::new()))
        .surface(Arc::new(MockVideoSurface::new()))
        .decoder(Arc::new(ScriptedDecoder::new()))
        .on_scan_success(|_| {})
        .start()
        .await;

    assert!(matches!(
        result.err(),
        Some(QrCamError::MissingConfiguration { field }) if field == "on_scan_error"
    ));
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let host = Host::new(MockMediaDevices::new());
    let result = host.builder(ScannerConfig::new(0, 48)).start().await;

    assert!(matches!(
        result.err(),
        Some(QrCamError::InvalidConfiguration { .. })
    ));
    assert!(host.devices.requests().is_empty());
}

// ============================================================================
// SCANNING FLOW TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_shows_video_and_reports_codes() {
    let host = Host::new(MockMediaDevices::new());
    host.decoder.push(DecodeStep::Fail(DecodeError::NotFound));
    host.decoder
        .push(DecodeStep::Decode("https://example.com".to_string()));

    let scanner = host.start().await;
    assert_eq!(scanner.current_panel(), Panel::Video);
    assert_eq!(host.view.visible_panel(), Some(Panel::Video));
    assert!(scanner.is_scanning());
    assert!(scanner.has_camera());
    assert!(!scanner.switch_control_visible());
    assert_eq!(scanner.video_inputs().len(), 1);

    sleep(Duration::from_millis(250)).await;

    assert_eq!(*host.codes.lock().unwrap(), vec!["https://example.com"]);
    assert_eq!(*host.errors.lock().unwrap(), vec![DecodeError::NotFound]);
    // Scanning keeps going after a successful decode
    assert!(scanner.is_scanning());

    let stats = scanner.stats();
    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_camera_failure_still_returns_scanner() {
    let host = Host::new(MockMediaDevices::new());
    host.devices.fail_next(QrCamError::PermissionDenied {
        operation: "camera".to_string(),
    });

    let scanner = host.start().await;

    assert_eq!(scanner.current_panel(), Panel::Error);
    assert_eq!(
        scanner.error_message().as_deref(),
        Some("Error activating camera")
    );
    assert!(!scanner.is_scanning());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(host.decoder.calls(), 0);

    tokio_test::assert_ok!(scanner.reacquire().await);
    assert_eq!(scanner.current_panel(), Panel::Video);
    assert!(scanner.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_custom_error_message_from_config() {
    let host = Host::new(MockMediaDevices::new());
    host.devices.fail_next(QrCamError::CameraAcquisition {
        reason: "busy".to_string(),
    });
    let config = ScannerConfig::from_json(
        r#"{"width": 64, "height": 48, "messages": {"camera_error": "Kamera nicht verfügbar"}}"#,
    )
    .unwrap();

    let scanner = host.builder(config).start().await.unwrap();
    settle().await;

    assert_eq!(
        scanner.error_message().as_deref(),
        Some("Kamera nicht verfügbar")
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_camera_api_keeps_not_supported_message() {
    let host = Host::new(MockMediaDevices::new().without_user_media());

    let scanner = host.start().await;

    assert_eq!(scanner.current_panel(), Panel::Error);
    assert_eq!(
        scanner.error_message().as_deref(),
        Some("Camera not supported")
    );
    assert!(!scanner.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_start_returns_while_camera_request_pending() {
    let host = Host::new(MockMediaDevices::new());
    host.devices.delay_next(Duration::from_secs(60));

    let scanner = host
        .builder(ScannerConfig::new(64, 48))
        .start()
        .await
        .unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(scanner.current_panel(), Panel::Loading);
    assert!(!scanner.has_camera());
    assert!(!scanner.is_scanning());
    assert_eq!(host.devices.requests().len(), 1);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(scanner.current_panel(), Panel::Video);
    assert!(scanner.is_scanning());
}

// ============================================================================
// STOP TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_halts_scanning_and_releases_camera() {
    let host = Host::new(MockMediaDevices::new());
    let scanner = host.start().await;

    sleep(Duration::from_millis(150)).await;
    let calls = host.decoder.calls();
    assert_eq!(calls, 1);

    scanner.stop();
    assert!(!scanner.is_scanning());
    assert!(!scanner.has_camera());
    assert!(host.devices.streams().iter().all(|s| !s.is_active()));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(host.decoder.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_stream_when_release_disabled() {
    let host = Host::new(MockMediaDevices::new());
    let mut config = ScannerConfig::new(64, 48);
    config.stream_release = StreamRelease::Never;

    let scanner = host.builder(config).start().await.unwrap();
    settle().await;
    scanner.stop();

    assert!(!scanner.is_scanning());
    assert!(scanner.has_camera());
    assert!(host.devices.streams()[0].is_active());
}

#[tokio::test(start_paused = true)]
async fn test_handle_stops_scanner() {
    let host = Host::new(MockMediaDevices::new());
    let scanner = host.start().await;
    let handle = scanner.handle();

    handle.stop();
    handle.stop();

    assert!(!scanner.is_scanning());
    sleep(Duration::from_secs(1)).await;
    assert_eq!(host.decoder.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_camera_request_runs() {
    let host = Host::new(MockMediaDevices::new());
    let scanner = host
        .builder(ScannerConfig::new(64, 48))
        .start()
        .await
        .unwrap();

    scanner.handle().stop();
    sleep(Duration::from_secs(1)).await;

    assert!(host.devices.requests().is_empty());
    assert!(!scanner.has_camera());
    assert!(!scanner.is_scanning());
    assert_eq!(scanner.current_panel(), Panel::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_initial_request_releases_late_stream() {
    let host = Host::new(MockMediaDevices::new());
    host.devices.delay_next(Duration::from_millis(500));
    let scanner = host
        .builder(ScannerConfig::new(64, 48))
        .start()
        .await
        .unwrap();

    sleep(Duration::from_millis(10)).await;
    scanner.handle().stop();
    sleep(Duration::from_secs(1)).await;

    assert!(!scanner.is_scanning());
    assert!(!scanner.has_camera());
    let streams = host.devices.streams();
    assert_eq!(streams.len(), 1);
    assert!(!streams[0].is_active());
    assert_eq!(host.decoder.calls(), 0);
    assert_eq!(scanner.current_panel(), Panel::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_camera_switch_in_flight() {
    let host = Host::new(MockMediaDevices::with_video_inputs(&["A", "B"]));
    let scanner = host.start().await;
    host.devices.delay_next(Duration::from_millis(500));

    let (switched, _) = tokio::join!(scanner.switch_camera(), async {
        sleep(Duration::from_millis(10)).await;
        scanner.stop();
    });
    sleep(Duration::from_secs(1)).await;

    assert!(matches!(
        switched,
        Err(QrCamError::AcquisitionSuperseded { .. })
    ));
    assert!(!scanner.is_scanning());
    assert!(!scanner.has_camera());
    assert!(host.devices.streams().iter().all(|s| !s.is_active()));
    assert_eq!(host.decoder.calls(), 0);
}

// ============================================================================
// CAMERA SWITCH TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_switch_camera_cycles_devices() {
    let host = Host::new(MockMediaDevices::with_video_inputs(&["front", "back"]));
    let scanner = host.start().await;

    assert!(scanner.switch_control_visible());
    assert_eq!(scanner.selected_device(), None);

    assert_eq!(scanner.switch_camera().await.unwrap(), DeviceId::new("front"));
    assert_eq!(scanner.switch_camera().await.unwrap(), DeviceId::new("back"));
    assert_eq!(scanner.switch_camera().await.unwrap(), DeviceId::new("front"));
    assert_eq!(scanner.selected_device(), Some(DeviceId::new("front")));

    // Only the latest stream stays live
    let streams = host.devices.streams();
    assert_eq!(streams.len(), 4);
    assert_eq!(streams.iter().filter(|s| s.is_active()).count(), 1);
    assert!(scanner.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_events_follow_scanner_lifecycle() {
    let host = Host::new(MockMediaDevices::with_video_inputs(&["front", "back"]));
    let scanner = host.start().await;
    let mut events = scanner.subscribe_events();

    scanner.switch_camera().await.unwrap();
    scanner.stop();

    let mut session_events = Vec::new();
    let mut scan_events = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.is_session_event() {
            session_events.push(event.event_type());
        } else if event.is_scan_event() {
            scan_events.push(event.event_type());
        }
    }
    assert_eq!(
        session_events,
        vec!["stream_released", "camera_acquired", "stream_released"]
    );
    assert_eq!(scan_events, vec!["scan_started", "scan_stopped"]);
}

#[cfg(feature = "diagnostics")]
#[tokio::test(start_paused = true)]
async fn test_report_carries_scanner_id() {
    let host = Host::new(MockMediaDevices::new());
    host.decoder.push(DecodeStep::Decode("hello".to_string()));
    let scanner = host.start().await;

    sleep(Duration::from_millis(150)).await;
    let report = scanner.report();

    assert_eq!(report.scanner_id, Some(scanner.id()));
    assert_eq!(report.successes, 1);
    assert_eq!(report.health, ScanHealth::Detecting);
}
