use crate::common::Coordinate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Payload handed to `on_movement` once per delivered event.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementNotice {
    pub coordinates: Option<Coordinate>,
    pub heading: Option<f64>,
    /// Duration of the move animation that was started, if any.
    pub duration: Option<Duration>,
    pub data: Value,
}

pub type PositionObserver = Arc<dyn Fn(Coordinate) + Send + Sync>;
pub type HeadingObserver = Arc<dyn Fn(f64) + Send + Sync>;
pub type MovementObserver = Arc<dyn Fn(&MovementNotice) + Send + Sync>;

/// Fire-and-forget hooks for UI outside the marker (ETA labels and the like).
#[derive(Clone, Default)]
pub struct MovementObservers {
    on_position: Option<PositionObserver>,
    on_heading: Option<HeadingObserver>,
    on_movement: Vec<MovementObserver>,
}

impl MovementObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_position_change(mut self, f: impl Fn(Coordinate) + Send + Sync + 'static) -> Self {
        self.on_position = Some(Arc::new(f));
        self
    }

    pub fn on_heading_change(mut self, f: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_heading = Some(Arc::new(f));
        self
    }

    pub fn on_movement(mut self, f: impl Fn(&MovementNotice) + Send + Sync + 'static) -> Self {
        self.on_movement.push(Arc::new(f));
        self
    }

    pub fn notify(&self, notice: &MovementNotice) {
        if let (Some(f), Some(coordinate)) = (&self.on_position, notice.coordinates) {
            f(coordinate);
        }
        if let (Some(f), Some(heading)) = (&self.on_heading, notice.heading) {
            f(heading);
        }
        for f in &self.on_movement {
            f(notice);
        }
    }
}
