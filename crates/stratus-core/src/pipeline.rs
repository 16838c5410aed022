//! Batch coordinator: the ingest-calibrate-validate-merge-notify pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use stratus_types::{DeviceState, Reading};

use crate::cache::CalibrationCache;
use crate::calibrate;
use crate::merge;
use crate::notify::Notifier;
use crate::retry::RetryPolicy;
use crate::traits::{CalibrationSource, NotificationSink, StateStore};
use crate::validate;

/// Outcome counts for one processed batch.
///
/// `received` equals the sum of `missing_id`, `calibration_failed`,
/// `invalid`, `merged`, and `abandoned`. `notified` counts distinct
/// devices, not readings, so it is at most `merged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Readings handed in.
    pub received: usize,
    /// Dropped before any processing for lack of a device identifier.
    pub missing_id: usize,
    /// Dropped because the calibration lookup failed.
    pub calibration_failed: usize,
    /// Dropped by the range validator.
    pub invalid: usize,
    /// Successfully merged into the state store.
    pub merged: usize,
    /// Abandoned after exhausting merge retries.
    pub abandoned: usize,
    /// Distinct devices notified.
    pub notified: usize,
    /// Notifications that failed (reported, not retried).
    pub notify_failed: usize,
}

/// The ingest pipeline for one processing instance.
///
/// Owns the calibration cache (whose lifetime is thereby bound to the
/// instance) and the retry policy. The durable stores and the notification
/// transport are external collaborators behind traits.
///
/// Readings in a batch are processed strictly in the order received, one at
/// a time, which makes the single-writer-per-device requirement hold
/// trivially. The cost is that a reading sleeping in its retry loop delays
/// the readings after it in the same batch.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratus_core::{Pipeline, memory::{MemoryCalibrationSource, MemorySink, MemoryStateStore}};
/// use stratus_types::Reading;
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = Pipeline::new(
///     Arc::new(MemoryStateStore::new()),
///     Arc::new(MemoryCalibrationSource::new()),
///     Arc::new(MemorySink::new()),
/// );
///
/// let batch = vec![Reading::builder().device_id("d1").temperature(21.0).build()];
/// let summary = pipeline.process_batch(&batch).await;
/// assert_eq!(summary.merged, 1);
/// assert_eq!(summary.notified, 1);
/// # }
/// ```
pub struct Pipeline {
    store: Arc<dyn StateStore>,
    cache: CalibrationCache,
    notifier: Notifier,
    policy: RetryPolicy,
}

impl Pipeline {
    /// Create a pipeline over its three external collaborators, with the
    /// default retry policy.
    pub fn new(
        store: Arc<dyn StateStore>,
        calibration: Arc<dyn CalibrationSource>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            cache: CalibrationCache::new(calibration),
            notifier: Notifier::new(sink),
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The calibration cache, for explicit invalidation by a host that
    /// learns of profile changes out of band.
    pub fn calibration_cache(&self) -> &CalibrationCache {
        &self.cache
    }

    /// Process one batch of readings in the order received.
    ///
    /// Nothing in a batch is fatal: each reading either contributes a merge
    /// or is dropped and reported in the summary and the logs. After the
    /// last reading, each device's final merged state is fanned out exactly
    /// once: a device appearing twice in the batch is persisted twice but
    /// notified only with the later state.
    pub async fn process_batch(&self, readings: &[Reading]) -> BatchSummary {
        let mut summary = BatchSummary {
            received: readings.len(),
            ..Default::default()
        };
        // Last successful merge per device; drained once at batch end.
        let mut outcomes: BTreeMap<String, DeviceState> = BTreeMap::new();

        info!(count = readings.len(), "processing batch");

        for reading in readings {
            let Some(device_id) = reading.device_id.as_deref() else {
                warn!(
                    sequence_id = reading.sequence_id,
                    "dropping reading with no device id"
                );
                summary.missing_id += 1;
                continue;
            };

            let profile = match self.cache.get(device_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(device_id, error = %e, "calibration lookup failed, dropping reading");
                    summary.calibration_failed += 1;
                    continue;
                }
            };

            let mut calibrated = reading.clone();
            if let Some(profile) = &profile {
                calibrate::apply(&mut calibrated, profile);
            }

            if let Err(violation) = validate::validate(&calibrated) {
                warn!(device_id, %violation, "dropping out-of-range reading");
                summary.invalid += 1;
                continue;
            }

            match merge::merge_reading(self.store.as_ref(), &self.policy, device_id, &calibrated)
                .await
            {
                Ok(state) => {
                    debug!(device_id, update_count = state.update_count, "merged reading");
                    summary.merged += 1;
                    outcomes.insert(device_id.to_string(), state);
                }
                Err(e) => {
                    error!(device_id, error = %e, "abandoning reading");
                    summary.abandoned += 1;
                }
            }
        }

        for (device_id, state) in outcomes {
            match self.notifier.notify(&state).await {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    error!(device_id = %device_id, error = %e, "notification failed");
                    summary.notify_failed += 1;
                }
            }
        }

        info!(
            merged = summary.merged,
            notified = summary.notified,
            dropped = summary.missing_id + summary.calibration_failed + summary.invalid,
            abandoned = summary.abandoned,
            "batch complete"
        );
        summary
    }
}
