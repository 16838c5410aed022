//! Optimistic-concurrency merge of readings into device state.
//!
//! Each reading runs a `Fetch → Merge → Commit` sequence against the state
//! store. A commit lost to a concurrent writer, or a transport fault on
//! either store call, sends the loop back to `Fetch` after a jittered
//! backoff; after the policy's attempt cap the reading is abandoned.
//!
//! Nothing in this module locks anything. Concurrent writers on the same
//! device are serialized entirely by the store's conditional write.

use time::OffsetDateTime;
use tracing::{debug, warn};

use stratus_types::{DeviceState, Reading};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::traits::StateStore;

/// Merge one calibrated, validated reading into its device's durable state.
///
/// On success the returned [`DeviceState`] carries the store's freshly
/// assigned version token and an `update_count` exactly one higher than the
/// prior record (or 1 on first creation).
///
/// # Errors
///
/// [`Error::RetriesExhausted`] after `policy.max_attempts` failed attempts.
/// Conflicts and transport faults never surface directly; they only consume
/// attempts.
pub async fn merge_reading(
    store: &dyn StateStore,
    policy: &RetryPolicy,
    device_id: &str,
    reading: &Reading,
) -> Result<DeviceState> {
    for attempt in 1..=policy.max_attempts {
        match try_merge_once(store, device_id, reading).await {
            Ok(state) => {
                if attempt > 1 {
                    debug!(device_id, attempt, "merge succeeded after retries");
                }
                return Ok(state);
            }
            Err(e) if is_retryable(&e) => {
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        device_id,
                        attempt,
                        max_attempts = policy.max_attempts,
                        ?delay,
                        error = %e,
                        "merge attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::RetriesExhausted {
        device_id: device_id.to_string(),
        attempts: policy.max_attempts,
    })
}

/// One pass of the `Fetch → Merge → Commit` sequence.
async fn try_merge_once(
    store: &dyn StateStore,
    device_id: &str,
    reading: &Reading,
) -> Result<DeviceState> {
    let prior = store.fetch(device_id).await?;
    let now = OffsetDateTime::now_utc();

    let (mut candidate, expected) = match prior {
        Some(prior) => {
            let expected = prior.version_token;
            (DeviceState::merged(&prior, reading, now), Some(expected))
        }
        None => (DeviceState::first(device_id, reading, now), None),
    };

    let token = store.commit(&candidate, expected.as_ref()).await?;
    candidate.version_token = token;
    Ok(candidate)
}

/// Check if an error should send the merge loop back to `Fetch`.
fn is_retryable(error: &Error) -> bool {
    match error {
        // Lost the conditional write to a concurrent writer.
        Error::Conflict { .. } => true,
        // Transport faults get the same treatment as conflicts.
        Error::Store { .. } => true,
        _ => false,
    }
}
