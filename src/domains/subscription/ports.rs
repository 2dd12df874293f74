use crate::common::TrackingResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Handle to one open channel listener. `stop` must tolerate repeated calls.
pub trait ChannelListener: Send + Sync {
    fn stop(&self);
}

/// Port onto the push-channel client.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn subscribe(&self, channel: &str, on_event: EventCallback) -> TrackingResult<Box<dyn ChannelListener>>;
}
