use super::interpolator::{MarkerFrame, MotionCommand, MotionInterpolator};
use super::readiness::MarkerReadiness;
use crate::common::Coordinate;
use crate::config::MotionConfig;
use crate::domains::buffer::BufferedEvent;
use crate::domains::tracking::TrackedEntity;
use std::time::Duration;
use tokio::time::Instant;

/// How long a move between two fixes should take.
///
/// Uses the reported speed when positive, otherwise the configured fallback
/// speed, clamped to the configured bounds. Without a previous fix the default
/// move duration applies.
pub fn movement_duration(
    previous: Option<Coordinate>,
    next: Coordinate,
    speed: Option<f64>,
    config: &MotionConfig,
) -> Duration {
    let Some(previous) = previous else {
        return config.move_duration();
    };

    let distance = previous.distance_meters(&next);
    let speed = match speed {
        Some(s) if s > 0.0 => s,
        _ if distance > 0.0 => config.fallback_speed_mps,
        _ => return config.move_duration(),
    };

    let millis = (distance / speed * 1000.0)
        .clamp(config.min_move_duration_ms as f64, config.max_move_duration_ms as f64);
    Duration::from_millis(millis.round() as u64)
}

/// One tracked entity as drawn on the map: settled state, animation and artwork readiness.
pub struct TrackingMarker {
    entity: TrackedEntity,
    motion: MotionInterpolator,
    readiness: MarkerReadiness,
    last_coordinate: Option<Coordinate>,
    config: MotionConfig,
}

impl TrackingMarker {
    pub fn new(entity: TrackedEntity, config: MotionConfig, now: Instant) -> Self {
        let motion = MotionInterpolator::new(
            entity.coordinate,
            entity.heading,
            now,
            config.move_duration(),
            config.rotation_duration(),
        );
        Self {
            last_coordinate: Some(entity.coordinate),
            readiness: MarkerReadiness::new(config.readiness_settle()),
            entity,
            motion,
            config,
        }
    }

    pub fn entity(&self) -> &TrackedEntity {
        &self.entity
    }

    pub fn readiness(&self) -> &MarkerReadiness {
        &self.readiness
    }

    pub fn readiness_mut(&mut self) -> &mut MarkerReadiness {
        &mut self.readiness
    }

    /// Turns a delivered event into motion commands, without applying them.
    pub fn plan(&self, event: &BufferedEvent) -> Vec<MotionCommand> {
        let mut commands = Vec::with_capacity(2);
        if let Some(target) = event.coordinate {
            let duration = movement_duration(self.last_coordinate, target, event.speed, &self.config);
            commands.push(MotionCommand::Move {
                target,
                duration: Some(duration),
            });
        }
        if let Some(heading) = event.heading {
            commands.push(MotionCommand::Rotate {
                heading,
                duration: None,
            });
        }
        commands
    }

    pub fn apply(&mut self, now: Instant, command: MotionCommand) {
        match command {
            MotionCommand::Move { target, .. } => {
                self.last_coordinate = Some(target);
                self.entity.settle(Some(target), None);
            }
            MotionCommand::Rotate { heading, .. } => {
                self.entity.settle(None, Some(heading));
            }
        }
        self.motion.apply(now, command);
    }

    pub fn move_to(&mut self, now: Instant, latitude: f64, longitude: f64, duration: Option<Duration>) {
        self.apply(
            now,
            MotionCommand::Move {
                target: Coordinate::new(latitude, longitude),
                duration,
            },
        );
    }

    pub fn rotate_to(&mut self, now: Instant, heading: f64, duration: Option<Duration>) {
        self.apply(now, MotionCommand::Rotate { heading, duration });
    }

    /// Forget the previous fix so the next move uses the default duration.
    pub fn reset_motion_history(&mut self) {
        self.last_coordinate = None;
    }

    pub fn frame(&mut self, now: Instant) -> MarkerFrame {
        self.readiness.tick(now);
        self.motion.sample(now)
    }

    pub fn motion(&self) -> &MotionInterpolator {
        &self.motion
    }
}
