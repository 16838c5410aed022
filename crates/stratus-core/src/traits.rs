//! Trait abstractions over the pipeline's external collaborators.
//!
//! The durable state store, the calibration source, and the notification
//! transport all live outside this crate. These traits are the seams: the
//! pipeline is written against them, and [`crate::memory`] provides
//! in-memory implementations for tests and examples.

use async_trait::async_trait;

use stratus_types::{CalibrationProfile, DeviceState, VersionToken};

use crate::error::Result;

/// Durable per-device state keyed by device identifier, with conditional
/// writes.
///
/// Correctness of the whole pipeline rests on `commit` honoring its
/// condition: no global lock exists anywhere, so two writers racing on the
/// same device are serialized purely by the version check.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the current state for a device, if any, together with its
    /// version token.
    async fn fetch(&self, device_id: &str) -> Result<Option<DeviceState>>;

    /// Conditionally write `state`.
    ///
    /// With `expected = None` this is an insert-if-absent create; with
    /// `Some(token)` it is a replace-if-version-matches update. Returns the
    /// freshly assigned token on success.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Conflict`] when the condition fails (stale token, or
    /// a record already exists on create); [`crate::Error::Store`] for
    /// transport faults.
    async fn commit(
        &self,
        state: &DeviceState,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken>;
}

/// Read-only calibration lookup by device identifier.
#[async_trait]
pub trait CalibrationSource: Send + Sync {
    /// Look up the calibration profile for a device. `None` means the
    /// device has no profile and should be left uncalibrated.
    async fn fetch(&self, device_id: &str) -> Result<Option<CalibrationProfile>>;
}

/// Downstream fan-out transport.
///
/// Receives one serialized device state per distinct device per batch.
/// Delivery is best-effort; the pipeline never retries a failed delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one serialized device state to subscribers.
    async fn deliver(&self, payload: &str) -> Result<()>;
}
