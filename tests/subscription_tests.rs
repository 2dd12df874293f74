use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_tracking::adapters::outbound::{init_noop_logger, InMemoryTransport};
use storefront_tracking::common::Coordinate;
use storefront_tracking::domains::buffer::{EventBuffer, SharedEventBuffer};
use storefront_tracking::domains::subscription::{FocusOutcome, MovementNotice, MovementObservers, SubscriptionManager};

const CHANNEL: &str = "vehicle.v_123";

fn subscription_for(transport: &InMemoryTransport) -> (SubscriptionManager, SharedEventBuffer) {
    let buffer = EventBuffer::shared();
    let manager = SubscriptionManager::new(
        Arc::new(transport.clone()),
        buffer.clone(),
        init_noop_logger(),
        CHANNEL.to_string(),
    );
    (manager, buffer)
}

fn location_payload(lng: f64, lat: f64) -> serde_json::Value {
    json!({
        "event": "location.updated",
        "data": { "location": { "type": "Point", "coordinates": [lng, lat] }, "heading": 90 },
        "created_at": "2024-05-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_double_focus_opens_one_subscription() {
    let transport = InMemoryTransport::new();
    let (mut manager, _) = subscription_for(&transport);

    assert_eq!(manager.focus_gained().await, FocusOutcome::Subscribed);
    assert_eq!(manager.focus_gained().await, FocusOutcome::AlreadySubscribed);

    assert!(manager.is_subscribed());
    assert_eq!(transport.subscriber_count(CHANNEL), 1);
}

#[tokio::test]
async fn test_failed_open_records_nothing_and_retries() {
    let transport = InMemoryTransport::new();
    transport.set_offline(true);
    let (mut manager, _) = subscription_for(&transport);

    assert_eq!(manager.focus_gained().await, FocusOutcome::Failed);
    assert!(!manager.is_subscribed());

    transport.set_offline(false);
    assert_eq!(manager.focus_gained().await, FocusOutcome::Subscribed);
    assert_eq!(transport.subscriber_count(CHANNEL), 1);
}

#[tokio::test]
async fn test_payloads_are_translated_into_buffer() {
    let transport = InMemoryTransport::new();
    let (mut manager, buffer) = subscription_for(&transport);
    manager.focus_gained().await;

    assert_eq!(transport.publish(CHANNEL, location_payload(-73.98, 40.74)), 1);

    let out = buffer.lock().unwrap().flush();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].stream_id, CHANNEL);
    assert_eq!(out[0].coordinate, Some(Coordinate::new(40.74, -73.98)));
    assert_eq!(out[0].heading, Some(90.0));
}

#[tokio::test]
async fn test_invalid_coordinates_are_dropped() {
    let transport = InMemoryTransport::new();
    let (mut manager, buffer) = subscription_for(&transport);
    manager.focus_gained().await;

    transport.publish(CHANNEL, json!({ "data": { "location": { "coordinates": ["east", 40.0] } } }));
    transport.publish(CHANNEL, json!({ "data": { "heading": "north" } }));

    assert!(!buffer.lock().unwrap().has_pending());
}

#[tokio::test]
async fn test_focus_lost_stops_listener_and_purges_pending() {
    let transport = InMemoryTransport::new();
    let (mut manager, buffer) = subscription_for(&transport);
    manager.focus_gained().await;
    transport.publish(CHANNEL, location_payload(-73.98, 40.74));
    assert!(buffer.lock().unwrap().has_pending());

    manager.focus_lost();
    manager.focus_lost();

    assert!(!manager.is_subscribed());
    assert_eq!(transport.subscriber_count(CHANNEL), 0);
    assert!(!buffer.lock().unwrap().has_pending());
    assert_eq!(transport.publish(CHANNEL, location_payload(-73.0, 40.0)), 0);

    assert_eq!(manager.focus_gained().await, FocusOutcome::Subscribed);
    assert_eq!(transport.subscriber_count(CHANNEL), 1);
}

#[tokio::test]
async fn test_dropping_manager_unsubscribes() {
    let transport = InMemoryTransport::new();
    {
        let (mut manager, _) = subscription_for(&transport);
        manager.focus_gained().await;
        assert_eq!(transport.subscriber_count(CHANNEL), 1);
    }
    assert_eq!(transport.subscriber_count(CHANNEL), 0);
}

#[test]
fn test_observers_receive_present_fields_only() {
    let positions = Arc::new(AtomicUsize::new(0));
    let headings = Arc::new(AtomicUsize::new(0));
    let notices: Arc<Mutex<Vec<MovementNotice>>> = Arc::new(Mutex::new(Vec::new()));

    let (p, h, n) = (positions.clone(), headings.clone(), notices.clone());
    let observers = MovementObservers::new()
        .on_position_change(move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        })
        .on_heading_change(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .on_movement(move |notice| n.lock().unwrap().push(notice.clone()));

    observers.notify(&MovementNotice {
        coordinates: Some(Coordinate::new(1.0, 2.0)),
        heading: None,
        duration: Some(Duration::from_millis(800)),
        data: json!({}),
    });
    observers.notify(&MovementNotice {
        coordinates: None,
        heading: Some(45.0),
        duration: None,
        data: json!({}),
    });

    assert_eq!(positions.load(Ordering::SeqCst), 1);
    assert_eq!(headings.load(Ordering::SeqCst), 1);
    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].duration, Some(Duration::from_millis(800)));
}
