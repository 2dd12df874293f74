use crate::common::{normalize_heading, shortest_angular_delta, Coordinate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

pub trait Lerp: Copy {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Coordinate {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Coordinate::lerp(self, other, t)
    }
}

/// Linear animation from `from` to `to` starting at `started_at`.
#[derive(Debug, Clone, Copy)]
struct Tween<T: Lerp> {
    from: T,
    to: T,
    started_at: Instant,
    duration: Duration,
}

impl<T: Lerp> Tween<T> {
    fn settled(value: T, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            started_at: now,
            duration: Duration::ZERO,
        }
    }

    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn value_at(&self, now: Instant) -> T {
        let t = self.progress(now);
        if t >= 1.0 {
            self.to
        } else {
            self.from.lerp(&self.to, t)
        }
    }

    /// Starts a new leg from wherever the current one is at `now`.
    fn retarget(&mut self, now: Instant, to: T, duration: Duration) {
        self.from = self.value_at(now);
        self.to = to;
        self.started_at = now;
        self.duration = duration;
    }
}

/// Imperative motion request for one marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    Move {
        target: Coordinate,
        duration: Option<Duration>,
    },
    Rotate {
        heading: f64,
        duration: Option<Duration>,
    },
}

/// What the marker should draw at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerFrame {
    pub coordinate: Coordinate,
    /// Normalized to `[0, 360)`.
    pub heading: f64,
    pub animating: bool,
}

/// Animated position and heading of one tracked entity.
///
/// The heading is carried as an unbounded, accumulating value so that a turn
/// through north keeps its direction; it is only wrapped by [`Self::rendered_heading`].
/// Inputs are assumed finite, callers filter before issuing commands.
#[derive(Debug, Clone)]
pub struct MotionInterpolator {
    position: Tween<Coordinate>,
    rotation: Tween<f64>,
    move_duration: Duration,
    rotation_duration: Duration,
}

impl MotionInterpolator {
    pub fn new(
        coordinate: Coordinate,
        heading: f64,
        now: Instant,
        move_duration: Duration,
        rotation_duration: Duration,
    ) -> Self {
        Self {
            position: Tween::settled(coordinate, now),
            rotation: Tween::settled(heading, now),
            move_duration,
            rotation_duration,
        }
    }

    pub fn move_to(&mut self, now: Instant, latitude: f64, longitude: f64, duration: Option<Duration>) {
        let duration = duration.unwrap_or(self.move_duration);
        self.position
            .retarget(now, Coordinate::new(latitude, longitude), duration);
    }

    /// Returns the signed rotation that was scheduled.
    pub fn rotate_to(&mut self, now: Instant, heading: f64, duration: Option<Duration>) -> f64 {
        let duration = duration.unwrap_or(self.rotation_duration);
        let current = self.rotation.value_at(now);
        let delta = shortest_angular_delta(current, heading);
        self.rotation.retarget(now, current + delta, duration);
        delta
    }

    pub fn apply(&mut self, now: Instant, command: MotionCommand) {
        match command {
            MotionCommand::Move { target, duration } => {
                self.move_to(now, target.latitude, target.longitude, duration)
            }
            MotionCommand::Rotate { heading, duration } => {
                self.rotate_to(now, heading, duration);
            }
        }
    }

    pub fn coordinate_at(&self, now: Instant) -> Coordinate {
        self.position.value_at(now)
    }

    /// Unwrapped heading; may lie outside `[0, 360)`.
    pub fn accumulated_heading_at(&self, now: Instant) -> f64 {
        self.rotation.value_at(now)
    }

    pub fn rendered_heading(&self, now: Instant) -> f64 {
        normalize_heading(self.rotation.value_at(now))
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.position.progress(now) < 1.0 || self.rotation.progress(now) < 1.0
    }

    pub fn sample(&self, now: Instant) -> MarkerFrame {
        MarkerFrame {
            coordinate: self.coordinate_at(now),
            heading: self.rendered_heading(now),
            animating: self.is_animating(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpolator(now: Instant, heading: f64) -> MotionInterpolator {
        MotionInterpolator::new(
            Coordinate::new(0.0, 0.0),
            heading,
            now,
            Duration::from_millis(1000),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_move_reaches_target_linearly() {
        let t0 = Instant::now();
        let mut motion = interpolator(t0, 0.0);
        motion.move_to(t0, 1.0, 2.0, None);

        let half = motion.coordinate_at(t0 + Duration::from_millis(500));
        assert!((half.latitude - 0.5).abs() < 1e-9);
        assert!((half.longitude - 1.0).abs() < 1e-9);
        assert_eq!(motion.coordinate_at(t0 + Duration::from_millis(1000)), Coordinate::new(1.0, 2.0));
        assert!(!motion.is_animating(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_retarget_starts_from_in_flight_value() {
        let t0 = Instant::now();
        let mut motion = interpolator(t0, 0.0);
        motion.move_to(t0, 1.0, 0.0, None);

        let mid = t0 + Duration::from_millis(500);
        motion.move_to(mid, 0.0, 0.0, None);

        // no snap at the moment of retargeting
        let at_mid = motion.coordinate_at(mid);
        assert!((at_mid.latitude - 0.5).abs() < 1e-9);
        let later = motion.coordinate_at(mid + Duration::from_millis(500));
        assert!((later.latitude - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_keeps_accumulating_past_north() {
        let t0 = Instant::now();
        let mut motion = interpolator(t0, 350.0);
        let delta = motion.rotate_to(t0, 10.0, None);

        assert_eq!(delta, 20.0);
        assert_eq!(motion.accumulated_heading_at(t0 + Duration::from_millis(500)), 370.0);
        assert_eq!(motion.rendered_heading(t0 + Duration::from_millis(500)), 10.0);
    }

    #[test]
    fn test_zero_duration_settles_immediately() {
        let t0 = Instant::now();
        let mut motion = interpolator(t0, 0.0);
        motion.apply(
            t0,
            MotionCommand::Rotate {
                heading: 90.0,
                duration: Some(Duration::ZERO),
            },
        );
        assert_eq!(motion.rendered_heading(t0), 90.0);
    }
}
