//! Error types for stratus-core.
//!
//! Errors are classified by how the pipeline reacts to them:
//!
//! | Error | Reaction |
//! |-------|----------|
//! | [`Error::Conflict`] | Retry the merge with backoff, up to the attempt cap |
//! | [`Error::Store`] | Treated like a conflict: retry with backoff |
//! | [`Error::RetriesExhausted`] | Reading abandoned, reported, batch continues |
//! | [`Error::Serialization`] | Notification skipped, reported, batch continues |
//! | [`Error::Sink`] | Notification lost, reported, batch continues |
//!
//! Nothing here is fatal to a batch: one reading's failure never aborts
//! processing of the rest of the batch.

use thiserror::Error;

/// Result type for stratus-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the telemetry pipeline.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A conditional write lost to a concurrent writer: the expected version
    /// token no longer matches the store's current token.
    #[error("Version conflict writing state for device {device_id}")]
    Conflict {
        /// The device whose write was rejected.
        device_id: String,
    },

    /// Transport or backing-store fault during a fetch or commit.
    #[error("Store fault during {operation}: {message}")]
    Store {
        /// The store operation that failed.
        operation: &'static str,
        /// Description from the backing store client.
        message: String,
    },

    /// Every merge attempt for a reading was exhausted without a successful
    /// commit.
    #[error("Merge abandoned for device {device_id} after {attempts} attempts")]
    RetriesExhausted {
        /// The device whose reading was abandoned.
        device_id: String,
        /// The attempt cap that was reached.
        attempts: u32,
    },

    /// Failed to serialize a device state for fan-out.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The notification sink rejected a payload.
    #[error("Notification sink failure: {0}")]
    Sink(String),
}
