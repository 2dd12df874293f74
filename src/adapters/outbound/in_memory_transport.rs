use crate::common::{TrackingError, TrackingResult};
use crate::domains::subscription::{ChannelListener, ChannelTransport, EventCallback};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Registry = Arc<Mutex<HashMap<String, Vec<(Uuid, EventCallback)>>>>;

/// In-process pub/sub channel client, used by the demo binary and tests.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    registry: Registry,
    offline: Arc<Mutex<bool>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every `subscribe` fails.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    /// Delivers `payload` to every listener on `channel`; returns how many received it.
    pub fn publish(&self, channel: &str, payload: Value) -> usize {
        let callbacks: Vec<EventCallback> = match self.registry.lock() {
            Ok(registry) => registry
                .get(channel)
                .map(|listeners| listeners.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default(),
            Err(_) => return 0,
        };

        for callback in &callbacks {
            callback(payload.clone());
        }
        callbacks.len()
    }

    /// Publishes a raw JSON text frame as received from the wire.
    pub fn publish_str(&self, channel: &str, raw: &str) -> TrackingResult<usize> {
        let payload: Value = serde_json::from_str(raw)?;
        Ok(self.publish(channel, payload))
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.registry
            .lock()
            .map(|registry| registry.get(channel).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChannelTransport for InMemoryTransport {
    async fn subscribe(&self, channel: &str, on_event: EventCallback) -> TrackingResult<Box<dyn ChannelListener>> {
        if self.offline.lock().map(|flag| *flag).unwrap_or(false) {
            return Err(TrackingError::Transport(format!("channel {} unavailable", channel)));
        }

        let id = Uuid::new_v4();
        self.registry
            .lock()
            .map_err(|_| TrackingError::Transport("listener registry poisoned".to_string()))?
            .entry(channel.to_string())
            .or_default()
            .push((id, on_event));

        tracing::debug!(channel, listener = %id, "listener registered");
        Ok(Box::new(InMemoryListener {
            id,
            channel: channel.to_string(),
            registry: self.registry.clone(),
        }))
    }
}

struct InMemoryListener {
    id: Uuid,
    channel: String,
    registry: Registry,
}

impl ChannelListener for InMemoryListener {
    fn stop(&self) {
        if let Ok(mut registry) = self.registry.lock() {
            if let Some(listeners) = registry.get_mut(&self.channel) {
                listeners.retain(|(id, _)| *id != self.id);
                if listeners.is_empty() {
                    registry.remove(&self.channel);
                }
            }
        }
    }
}
