//! Coalescing event buffer.
//!
//! Raw movement events are collected per stream and released once per flush
//! window. Within a window only the most recent coordinate and the most recent
//! heading survive; windows and streams are released in arrival order.

use crate::common::{Coordinate, DomainEvent};
use crate::domains::tracking::MovementEvent;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// One delivery to the consumer: the coalesced state of a stream's window.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedEvent {
    pub stream_id: String,
    pub coordinate: Option<Coordinate>,
    pub heading: Option<f64>,
    /// Speed reported alongside the surviving coordinate.
    pub speed: Option<f64>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    /// Number of raw events folded into this delivery.
    pub coalesced: usize,
}

struct PendingStream {
    stream_id: String,
    events: Vec<MovementEvent>,
}

#[derive(Default)]
pub struct EventBuffer {
    pending: Vec<PendingStream>,
}

pub type SharedEventBuffer = Arc<Mutex<EventBuffer>>;

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedEventBuffer {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Events with neither coordinate nor heading are ignored.
    pub fn add_event(&mut self, event: MovementEvent) {
        if event.is_empty() {
            tracing::debug!(stream = %event.stream_id, "ignoring movement event without coordinate or heading");
            return;
        }

        match self.pending.iter_mut().find(|p| p.stream_id == event.stream_id) {
            Some(stream) => stream.events.push(event),
            None => self.pending.push(PendingStream {
                stream_id: event.stream_id.clone(),
                events: vec![event],
            }),
        }
    }

    pub fn clear_events(&mut self) {
        self.pending.clear();
    }

    pub fn clear_stream(&mut self, stream_id: &str) {
        self.pending.retain(|p| p.stream_id != stream_id);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|p| p.events.len()).sum()
    }

    /// Closes the current window and returns at most one delivery per stream.
    pub fn flush(&mut self) -> Vec<BufferedEvent> {
        self.pending
            .drain(..)
            .filter_map(|stream| coalesce(stream.stream_id, stream.events))
            .collect()
    }
}

fn coalesce(stream_id: String, mut events: Vec<MovementEvent>) -> Option<BufferedEvent> {
    // stable: equal timestamps keep arrival order
    events.sort_by_key(|e| e.created_at);

    let coalesced = events.len();
    let last = events.last()?;
    let latest_position = events.iter().rev().find(|e| e.coordinate.is_some());
    let latest_heading = events.iter().rev().find_map(|e| e.heading);

    for event in &events {
        tracing::debug!(
            stream = %stream_id,
            event_type = event.event_type(),
            created_at = %event.created_at,
            coordinate = ?event.coordinate,
            "buffered event"
        );
    }

    Some(BufferedEvent {
        coordinate: latest_position.and_then(|e| e.coordinate),
        speed: latest_position.and_then(|e| e.speed),
        heading: latest_heading,
        data: last.data.clone(),
        created_at: last.created_at,
        coalesced,
        stream_id,
    })
}

/// Drives `flush` from a fixed frame clock until `cancel` fires.
/// Each delivery is handed to `consumer` outside the buffer lock.
pub fn spawn_flush_loop<F>(
    buffer: SharedEventBuffer,
    interval: Duration,
    cancel: CancellationToken,
    mut consumer: F,
) -> JoinHandle<()>
where
    F: FnMut(BufferedEvent) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let deliveries = match buffer.lock() {
                        Ok(mut guard) => guard.flush(),
                        Err(_) => break,
                    };
                    for delivery in deliveries {
                        consumer(delivery);
                    }
                }
            }
        }
    })
}
