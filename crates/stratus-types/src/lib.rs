//! Platform-agnostic types for the Stratus telemetry pipeline.
//!
//! This crate provides the shared data model used by the ingest pipeline in
//! stratus-core and by any external collaborator that hands readings in or
//! consumes device state fan-out.
//!
//! # Features
//!
//! - [`Reading`]: one telemetry sample, tolerant of the wire spellings seen
//!   from field gateways
//! - [`CalibrationProfile`]: per-device linear correction
//! - [`DeviceState`]: the durable per-device record with its version token
//! - [`ParseError`]: error type for value construction
//!
//! Serde support is enabled by default and can be disabled with
//! `default-features = false`.

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{CalibrationProfile, DeviceState, Reading, ReadingBuilder, VersionToken};
