use super::ports::{ChannelListener, ChannelTransport, EventCallback};
use crate::domains::buffer::SharedEventBuffer;
use crate::domains::logger::DynLogger;
use crate::domains::tracking::parse_payload;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Subscribed,
    AlreadySubscribed,
    /// Open failed and was logged; nothing is recorded so the next focus retries.
    Failed,
}

struct ActiveSubscription {
    listener: Box<dyn ChannelListener>,
    accepting: Arc<AtomicBool>,
}

/// Keeps one channel subscription open while its screen has focus and feeds
/// translated payloads into the event buffer.
pub struct SubscriptionManager {
    transport: Arc<dyn ChannelTransport>,
    buffer: SharedEventBuffer,
    logger: DynLogger,
    channel: String,
    active: Option<ActiveSubscription>,
}

impl SubscriptionManager {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        buffer: SharedEventBuffer,
        logger: DynLogger,
        channel: String,
    ) -> Self {
        Self {
            transport,
            buffer,
            logger,
            channel,
            active: None,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    pub async fn focus_gained(&mut self) -> FocusOutcome {
        if self.active.is_some() {
            return FocusOutcome::AlreadySubscribed;
        }

        let accepting = Arc::new(AtomicBool::new(true));
        let callback = self.event_callback(accepting.clone());

        match self.transport.subscribe(&self.channel, callback).await {
            Ok(listener) => {
                self.logger.info(&format!("Subscribed to {}", self.channel));
                self.active = Some(ActiveSubscription { listener, accepting });
                FocusOutcome::Subscribed
            }
            Err(e) => {
                accepting.store(false, Ordering::SeqCst);
                self.logger
                    .error(&format!("Failed to subscribe to {}: {}", self.channel, e));
                FocusOutcome::Failed
            }
        }
    }

    /// Stops the listener and purges this channel's undelivered events. Safe to repeat.
    pub fn focus_lost(&mut self) {
        if let Some(active) = self.active.take() {
            active.accepting.store(false, Ordering::SeqCst);
            active.listener.stop();
            self.logger.info(&format!("Unsubscribed from {}", self.channel));
        }

        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear_stream(&self.channel);
        }
    }

    fn event_callback(&self, accepting: Arc<AtomicBool>) -> EventCallback {
        let buffer = self.buffer.clone();
        let stream_id = self.channel.clone();

        Arc::new(move |payload| {
            if !accepting.load(Ordering::SeqCst) {
                return;
            }
            match parse_payload(&stream_id, &payload, Utc::now()) {
                Ok(event) => {
                    if let Ok(mut buffer) = buffer.lock() {
                        buffer.add_event(event);
                    }
                }
                Err(e) => tracing::debug!(channel = %stream_id, error = %e, "dropping payload"),
            }
        })
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.focus_lost();
    }
}
