//! Headless scanner example
//!
//! Runs the scanner against mock host objects: two cameras, a decoder that finds a
//! code on the third frame, and a camera switch halfway through.

use qrcam::mock::{DecodeStep, MockMediaDevices, MockVideoSurface, RecordingView, ScriptedDecoder};
use qrcam::{DebugLogger, DecodeError, QrScanner, ScannerConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    DebugLogger::new().with_filter("qrcam_media=debug,info").init()?;

    let devices = Arc::new(MockMediaDevices::with_video_inputs(&["front", "back"]));
    let decoder = Arc::new(ScriptedDecoder::with_steps([
        DecodeStep::Fail(DecodeError::NotFound),
        DecodeStep::Fail(DecodeError::NotFound),
        DecodeStep::Decode("https://example.com/ticket/42".to_string()),
    ]));

    println!("📷 Starting scanner...");
    let scanner = QrScanner::builder(ScannerConfig::new(320, 240))
        .devices(devices.clone())
        .surface(Arc::new(MockVideoSurface::new()))
        .view(Arc::new(RecordingView::new()))
        .decoder(decoder)
        .on_scan_success(|result| {
            println!("   ✅ Cycle {}: {:?}", result.cycle, result.text());
        })
        .on_scan_error(|error| {
            if !matches!(error, DecodeError::NotFound) {
                println!("   ⚠️  {}", error);
            }
        })
        .start()
        .await?;
    println!("   Panel: {} (waiting for camera)", scanner.current_panel());

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!(
        "   Panel: {}, cameras: {}, switch control: {}",
        scanner.current_panel(),
        scanner.video_inputs().len(),
        scanner.switch_control_visible()
    );

    tokio::time::sleep(Duration::from_millis(400)).await;

    let device = scanner.switch_camera().await?;
    println!("🔄 Switched to {}", device);

    tokio::time::sleep(Duration::from_millis(300)).await;

    let handle = scanner.handle();
    handle.stop();
    println!("🛑 Stopped, {} camera requests made", devices.requests().len());

    println!("{}", scanner.report().to_json()?);
    Ok(())
}
