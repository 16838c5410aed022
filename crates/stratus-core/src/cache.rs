//! Memoizing per-instance calibration cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use stratus_types::CalibrationProfile;

use crate::error::Result;
use crate::traits::CalibrationSource;

/// Caches calibration lookups for the lifetime of a processing instance.
///
/// Both hits and misses are remembered, so each distinct device costs
/// exactly one backing-store read no matter how many batches the instance
/// processes. There is no TTL: a profile changed in the backing store after
/// being cached is served stale until the instance restarts or the entry is
/// explicitly [`invalidate`](Self::invalidate)d.
///
/// Lookup failures are *not* cached; the next reading for that device
/// retries the fetch.
pub struct CalibrationCache {
    source: Arc<dyn CalibrationSource>,
    entries: RwLock<HashMap<String, Option<CalibrationProfile>>>,
}

impl CalibrationCache {
    /// Create an empty cache over a calibration source.
    pub fn new(source: Arc<dyn CalibrationSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the profile for a device, fetching from the source on first
    /// use.
    ///
    /// # Errors
    ///
    /// Propagates the source's error when an uncached lookup fails.
    pub async fn get(&self, device_id: &str) -> Result<Option<CalibrationProfile>> {
        if let Some(entry) = self.entries.read().await.get(device_id) {
            return Ok(entry.clone());
        }

        let fetched = self.source.fetch(device_id).await?;
        debug!(device_id, found = fetched.is_some(), "cached calibration lookup");
        self.entries
            .write()
            .await
            .insert(device_id.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// Drop the cached entry for one device, forcing a re-fetch on its next
    /// lookup. Hook for a future TTL; the pipeline itself never calls this.
    pub async fn invalidate(&self, device_id: &str) {
        self.entries.write().await.remove(device_id);
    }

    /// Drop all cached entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached entries, misses included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCalibrationSource;

    #[tokio::test]
    async fn test_fetches_once_per_device() {
        let source = Arc::new(MemoryCalibrationSource::new());
        source
            .insert("d1", CalibrationProfile::identity())
            .await;
        let cache = CalibrationCache::new(Arc::clone(&source) as Arc<dyn CalibrationSource>);

        for _ in 0..5 {
            let profile = cache.get("d1").await.unwrap();
            assert_eq!(profile, Some(CalibrationProfile::identity()));
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_absence_is_cached_too() {
        let source = Arc::new(MemoryCalibrationSource::new());
        let cache = CalibrationCache::new(Arc::clone(&source) as Arc<dyn CalibrationSource>);

        assert_eq!(cache.get("unknown").await.unwrap(), None);
        assert_eq!(cache.get("unknown").await.unwrap(), None);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(MemoryCalibrationSource::new());
        let cache = CalibrationCache::new(Arc::clone(&source) as Arc<dyn CalibrationSource>);

        assert_eq!(cache.get("d1").await.unwrap(), None);
        source
            .insert("d1", CalibrationProfile::identity())
            .await;
        // Still the cached miss.
        assert_eq!(cache.get("d1").await.unwrap(), None);

        cache.invalidate("d1").await;
        assert_eq!(
            cache.get("d1").await.unwrap(),
            Some(CalibrationProfile::identity())
        );
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let source = Arc::new(MemoryCalibrationSource::new());
        source.fail_fetches(1);
        let cache = CalibrationCache::new(Arc::clone(&source) as Arc<dyn CalibrationSource>);

        assert!(cache.get("d1").await.is_err());
        assert!(cache.is_empty().await);
        // The injected failure is consumed; the retry succeeds and caches.
        assert_eq!(cache.get("d1").await.unwrap(), None);
        assert_eq!(cache.len().await, 1);
    }
}
