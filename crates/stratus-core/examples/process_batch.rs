//! Example: Processing a Telemetry Batch
//!
//! This example runs a small batch of readings through the pipeline
//! against the in-memory backends, showing calibration, validation,
//! per-device deduplication, and fan-out.
//!
//! Run with: `cargo run --example process_batch`

use std::sync::Arc;

use stratus_core::Pipeline;
use stratus_core::memory::{MemoryCalibrationSource, MemorySink, MemoryStateStore};
use stratus_core::traits::{CalibrationSource, NotificationSink, StateStore};
use stratus_types::{CalibrationProfile, Reading};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let store = Arc::new(MemoryStateStore::new());
    let calibration = Arc::new(MemoryCalibrationSource::new());
    let sink = Arc::new(MemorySink::new());

    // One device carries a calibration profile; the other is uncalibrated.
    calibration
        .insert(
            "office-north",
            CalibrationProfile {
                temperature_slope: Some(1.02),
                temperature_intercept: Some(-0.3),
                ..Default::default()
            },
        )
        .await;

    let pipeline = Pipeline::new(
        Arc::clone(&store) as Arc<dyn StateStore>,
        Arc::clone(&calibration) as Arc<dyn CalibrationSource>,
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
    );

    let batch = vec![
        Reading::builder()
            .device_id("office-north")
            .temperature(21.4)
            .humidity(48.0)
            .sequence_id(1)
            .build(),
        // Out of range, will be dropped.
        Reading::builder()
            .device_id("glasshouse-2")
            .temperature(18.2)
            .humidity(150.0)
            .sequence_id(2)
            .build(),
        Reading::builder()
            .device_id("office-north")
            .temperature(21.9)
            .humidity(47.5)
            .sequence_id(3)
            .build(),
    ];

    println!("Processing batch of {} readings...", batch.len());
    let summary = pipeline.process_batch(&batch).await;

    println!();
    println!("Batch Summary:");
    println!("  Received:   {}", summary.received);
    println!("  Merged:     {}", summary.merged);
    println!("  Invalid:    {}", summary.invalid);
    println!("  Notified:   {}", summary.notified);

    println!();
    println!("Notifications delivered:");
    for payload in sink.payloads().await {
        println!("  {payload}");
    }

    Ok(())
}
