//! Ingest pipeline for Stratus device telemetry.
//!
//! This crate implements the ingest-calibrate-validate-merge-notify
//! pipeline: batches of raw readings are calibrated per device, checked
//! against physical ranges, durably merged into per-device state under
//! optimistic concurrency, and the final per-device states are fanned out
//! to downstream subscribers.
//!
//! # Components
//!
//! - [`CalibrationCache`]: one backing-store read per device per instance
//! - [`calibrate`]: pure linear correction with half-to-even rounding
//! - [`validate`]: pure physical range checks
//! - [`merge`]: versioned read-modify-write with jittered retry
//! - [`Pipeline`]: batch coordination, per-device deduplication, fan-out
//! - [`Notifier`]: best-effort JSON delivery to the external sink
//!
//! The durable stores and the notification transport are external
//! collaborators; [`traits`] defines the seams and [`memory`] provides
//! in-memory implementations for tests.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stratus_core::Pipeline;
//! use stratus_core::memory::{MemoryCalibrationSource, MemorySink, MemoryStateStore};
//! use stratus_core::traits::StateStore;
//! use stratus_types::Reading;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStateStore::new());
//!     let pipeline = Pipeline::new(
//!         Arc::clone(&store) as Arc<dyn StateStore>,
//!         Arc::new(MemoryCalibrationSource::new()),
//!         Arc::new(MemorySink::new()),
//!     );
//!
//!     let batch = vec![
//!         Reading::builder().device_id("office-north").temperature(21.4).build(),
//!     ];
//!     let summary = pipeline.process_batch(&batch).await;
//!     assert_eq!(summary.merged, 1);
//! }
//! ```

pub mod cache;
pub mod calibrate;
pub mod error;
pub mod memory;
pub mod merge;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod traits;
pub mod validate;

// Re-export the shared data model for convenience.
pub use stratus_types as types;

pub use cache::CalibrationCache;
pub use error::{Error, Result};
pub use merge::merge_reading;
pub use notify::{Notifier, NullSink};
pub use pipeline::{BatchSummary, Pipeline};
pub use retry::RetryPolicy;
pub use traits::{CalibrationSource, NotificationSink, StateStore};
pub use validate::RangeViolation;
