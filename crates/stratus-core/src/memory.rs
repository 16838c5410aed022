//! In-memory backing stores for testing and examples.
//!
//! These honor the same contracts as real backends (the state store in
//! particular implements the conditional-write protocol faithfully) and
//! add failure injection so the retry and abandonment paths can be
//! exercised without real infrastructure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use stratus_types::{CalibrationProfile, DeviceState, VersionToken};

use crate::error::{Error, Result};
use crate::traits::{CalibrationSource, NotificationSink, StateStore};

/// Consume one unit from an injected-failure counter.
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// An in-memory [`StateStore`] honoring the conditional-write contract.
///
/// # Failure injection
///
/// [`fail_commits_with_conflict`](Self::fail_commits_with_conflict) and
/// [`fail_commits_with_fault`](Self::fail_commits_with_fault) make the next
/// *n* commits fail before the condition is even evaluated, which is how a
/// persistent concurrent writer or a flaky transport looks to the caller.
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, DeviceState>>,
    conflict_commits: AtomicU32,
    faulted_commits: AtomicU32,
    faulted_fetches: AtomicU32,
    commits: AtomicUsize,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` commits with [`Error::Conflict`].
    pub fn fail_commits_with_conflict(&self, n: u32) {
        self.conflict_commits.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` commits with a transport fault.
    pub fn fail_commits_with_fault(&self, n: u32) {
        self.faulted_commits.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` fetches with a transport fault.
    pub fn fail_fetches_with_fault(&self, n: u32) {
        self.faulted_fetches.store(n, Ordering::SeqCst);
    }

    /// Number of successful commits observed.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Read a device's state directly, bypassing failure injection.
    pub async fn get(&self, device_id: &str) -> Option<DeviceState> {
        self.states.read().await.get(device_id).cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn fetch(&self, device_id: &str) -> Result<Option<DeviceState>> {
        if take_one(&self.faulted_fetches) {
            return Err(Error::Store {
                operation: "fetch",
                message: "injected transport fault".to_string(),
            });
        }
        Ok(self.states.read().await.get(device_id).cloned())
    }

    async fn commit(
        &self,
        state: &DeviceState,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken> {
        if take_one(&self.conflict_commits) {
            return Err(Error::Conflict {
                device_id: state.device_id.clone(),
            });
        }
        if take_one(&self.faulted_commits) {
            return Err(Error::Store {
                operation: "commit",
                message: "injected transport fault".to_string(),
            });
        }

        let mut states = self.states.write().await;
        match (states.get(&state.device_id), expected) {
            // Insert-if-absent create.
            (None, None) => {}
            // Replace-if-version-matches update.
            (Some(current), Some(token)) if current.version_token == *token => {}
            _ => {
                return Err(Error::Conflict {
                    device_id: state.device_id.clone(),
                });
            }
        }

        let token = VersionToken::new();
        let mut stored = state.clone();
        stored.version_token = token;
        states.insert(stored.device_id.clone(), stored);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }
}

/// An in-memory [`CalibrationSource`] with a fetch counter.
#[derive(Default)]
pub struct MemoryCalibrationSource {
    profiles: RwLock<HashMap<String, CalibrationProfile>>,
    faulted_fetches: AtomicU32,
    fetches: AtomicUsize,
}

impl MemoryCalibrationSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile for a device.
    pub async fn insert(&self, device_id: &str, profile: CalibrationProfile) {
        self.profiles
            .write()
            .await
            .insert(device_id.to_string(), profile);
    }

    /// Fail the next `n` fetches with a transport fault.
    pub fn fail_fetches(&self, n: u32) {
        self.faulted_fetches.store(n, Ordering::SeqCst);
    }

    /// Number of fetches observed, failures included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalibrationSource for MemoryCalibrationSource {
    async fn fetch(&self, device_id: &str) -> Result<Option<CalibrationProfile>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.faulted_fetches) {
            return Err(Error::Store {
                operation: "fetch",
                message: "injected transport fault".to_string(),
            });
        }
        Ok(self.profiles.read().await.get(device_id).cloned())
    }
}

/// An in-memory [`NotificationSink`] that records delivered payloads.
#[derive(Default)]
pub struct MemorySink {
    payloads: RwLock<Vec<String>>,
    failures: AtomicU32,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` deliveries.
    pub fn fail_deliveries(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Payloads delivered so far, in order.
    pub async fn payloads(&self) -> Vec<String> {
        self.payloads.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn deliver(&self, payload: &str) -> Result<()> {
        if take_one(&self.failures) {
            return Err(Error::Sink("injected delivery failure".to_string()));
        }
        self.payloads.write().await.push(payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_types::Reading;
    use time::OffsetDateTime;

    fn state_for(device_id: &str) -> DeviceState {
        let reading = Reading::builder().device_id(device_id).temperature(20.0).build();
        DeviceState::first(device_id, &reading, OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn test_create_then_conditional_update() {
        let store = MemoryStateStore::new();
        let state = state_for("d1");

        let token = store.commit(&state, None).await.unwrap();
        assert_ne!(token, state.version_token);

        let mut update = store.get("d1").await.unwrap();
        update.update_count += 1;
        let new_token = store.commit(&update, Some(&token)).await.unwrap();
        assert_ne!(new_token, token);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_create_conflicts_when_record_exists() {
        let store = MemoryStateStore::new();
        let state = state_for("d1");
        store.commit(&state, None).await.unwrap();

        let result = store.commit(&state, None).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_conflicts_on_stale_token() {
        let store = MemoryStateStore::new();
        let state = state_for("d1");
        let stale = store.commit(&state, None).await.unwrap();

        // A concurrent writer bumps the version.
        let current = store.get("d1").await.unwrap();
        store
            .commit(&current, Some(&current.version_token))
            .await
            .unwrap();

        let result = store.commit(&state, Some(&stale)).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_injected_conflicts_are_consumed_in_order() {
        let store = MemoryStateStore::new();
        store.fail_commits_with_conflict(2);
        let state = state_for("d1");

        assert!(store.commit(&state, None).await.is_err());
        assert!(store.commit(&state, None).await.is_err());
        assert!(store.commit(&state, None).await.is_ok());
    }
}
