use crate::common::{Coordinate, DomainEvent, TrackingError, TrackingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One push notification about a tracked entity. Either part may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementEvent {
    pub stream_id: String,
    pub coordinate: Option<Coordinate>,
    pub heading: Option<f64>,
    /// Ground speed in m/s when the publisher reports it.
    pub speed: Option<f64>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl MovementEvent {
    pub fn new(
        stream_id: &str,
        coordinate: Option<Coordinate>,
        heading: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            coordinate,
            heading,
            speed: None,
            data: Value::Null,
            created_at,
        }
    }

    pub fn position(stream_id: &str, coordinate: Coordinate, created_at: DateTime<Utc>) -> Self {
        Self::new(stream_id, Some(coordinate), None, created_at)
    }

    pub fn heading_only(stream_id: &str, heading: f64, created_at: DateTime<Utc>) -> Self {
        Self::new(stream_id, None, Some(heading), created_at)
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Carries neither a coordinate nor a heading.
    pub fn is_empty(&self) -> bool {
        self.coordinate.is_none() && self.heading.is_none()
    }
}

impl DomainEvent for MovementEvent {
    fn event_type(&self) -> &'static str {
        match (self.coordinate.is_some(), self.heading.is_some()) {
            (true, true) => "MovementUpdated",
            (true, false) => "PositionUpdated",
            (false, true) => "HeadingUpdated",
            (false, false) => "Empty",
        }
    }

    fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Translates a raw channel payload into a movement event, or `None` when
/// nothing usable remains. See [`parse_payload`].
pub fn translate_payload(stream_id: &str, payload: &Value, received_at: DateTime<Utc>) -> Option<MovementEvent> {
    parse_payload(stream_id, payload, received_at).ok()
}

/// Accepts either the bare movement object or the channel envelope
/// `{ "event": ..., "data": { ... }, "created_at": ... }`. Coordinates are read
/// from `location.coordinates` as `[longitude, latitude]`; non-finite values and
/// non-numeric headings are dropped.
pub fn parse_payload(stream_id: &str, payload: &Value, received_at: DateTime<Utc>) -> TrackingResult<MovementEvent> {
    if !payload.is_object() {
        return Err(TrackingError::InvalidPayload {
            reason: "payload is not an object".to_string(),
        });
    }

    let inner = match payload.get("data") {
        Some(data) if data.is_object() => data,
        _ => payload,
    };

    let coordinate = inner
        .get("location")
        .and_then(|location| location.get("coordinates"))
        .and_then(Value::as_array)
        .and_then(|pair| match pair.as_slice() {
            [lng, lat, ..] => Some(Coordinate::new(lat.as_f64()?, lng.as_f64()?)),
            _ => None,
        })
        .filter(Coordinate::is_finite);

    let heading = inner
        .get("heading")
        .and_then(Value::as_f64)
        .filter(|h| h.is_finite());

    let speed = inner
        .get("speed")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite());

    let created_at = payload
        .get("created_at")
        .or_else(|| inner.get("created_at"))
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(received_at);

    let event = MovementEvent {
        stream_id: stream_id.to_string(),
        coordinate,
        heading,
        speed,
        data: inner.clone(),
        created_at,
    };

    if event.is_empty() {
        return Err(TrackingError::InvalidPayload {
            reason: "no finite coordinate or numeric heading".to_string(),
        });
    }
    Ok(event)
}
