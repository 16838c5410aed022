//! Fan-out of merged device states to downstream subscribers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use stratus_types::DeviceState;

use crate::error::Result;
use crate::traits::NotificationSink;

/// Serializes merged device states and hands them to the external sink.
///
/// Delivery is best-effort: by the time a notification is attempted the
/// state is already durably committed, so a sink failure is reported by the
/// coordinator and otherwise ignored.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    /// Create a notifier over a sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Serialize `state` as JSON and deliver it once.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Serialization`] if the state cannot be encoded,
    /// or the sink's error. Neither is retried.
    pub async fn notify(&self, state: &DeviceState) -> Result<()> {
        let payload = serde_json::to_string(state)?;
        self.sink.deliver(&payload).await?;
        debug!(
            device_id = %state.device_id,
            update_count = state.update_count,
            "notified subscribers"
        );
        Ok(())
    }
}

/// Sink for deployments with no downstream subscribers configured.
///
/// Accepts and discards every payload, the same way an unset fan-out
/// endpoint behaves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn deliver(&self, _payload: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySink;
    use stratus_types::Reading;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_notify_delivers_json() {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(Arc::clone(&sink) as Arc<dyn NotificationSink>);

        let reading = Reading::builder().device_id("d1").temperature(21.5).build();
        let state = DeviceState::first("d1", &reading, OffsetDateTime::now_utc());
        notifier.notify(&state).await.unwrap();

        let payloads = sink.payloads().await;
        assert_eq!(payloads.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(value["deviceId"], "d1");
        assert_eq!(value["temperature"], 21.5);
        assert_eq!(value["updateCount"], 1);
    }

    #[tokio::test]
    async fn test_null_sink_accepts_everything() {
        let notifier = Notifier::new(Arc::new(NullSink));
        let reading = Reading::builder().device_id("d1").build();
        let state = DeviceState::first("d1", &reading, OffsetDateTime::now_utc());
        assert!(notifier.notify(&state).await.is_ok());
    }
}
