use chrono::{DateTime, Utc};

/// Something that happened to a single logical stream (one tracked entity).
pub trait DomainEvent: Send + Sync + Clone {
    fn event_type(&self) -> &'static str;
    fn stream_id(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
}
