use super::ports::{Camera, CameraUpdate, FitOptions, MapSurface};
use super::region::bounding_region_with;
use super::throttle::Throttle;
use crate::common::{zoom_level, Coordinate, EdgePadding, Region, TrackingResult};
use crate::config::CameraConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Last known viewport. Bearing only ever comes from querying the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraState {
    pub region: Option<Region>,
    pub camera: Option<Camera>,
}

impl CameraState {
    pub fn zoom_level(&self) -> Option<f64> {
        self.camera
            .and_then(|c| c.zoom)
            .or_else(|| self.region.map(|r| r.zoom_level()))
    }

    pub fn bearing(&self) -> Option<f64> {
        self.camera.map(|c| c.heading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraWrite {
    FitToCoordinates {
        points: Vec<Coordinate>,
        options: FitOptions,
    },
    AnimateCamera {
        camera: CameraUpdate,
        duration: Duration,
    },
    AnimateToRegion {
        region: Region,
        duration: Duration,
    },
}

impl CameraWrite {
    pub async fn execute(&self, map: &dyn MapSurface) -> TrackingResult<()> {
        match self {
            CameraWrite::FitToCoordinates { points, options } => map.fit_to_coordinates(points, *options).await,
            CameraWrite::AnimateCamera { camera, duration } => map.animate_camera(*camera, *duration).await,
            CameraWrite::AnimateToRegion { region, duration } => map.animate_to_region(*region, *duration).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowDecision {
    Write(CameraWrite),
    Throttled,
    /// The user zoomed out; single follow waits for `resume_follow`.
    Suspended,
    InvalidCoordinate,
    /// The surface rejected the write; the next eligible tick tries again.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramingMode {
    /// Keep both the moving entity and a fixed destination in view.
    Dual { destination: Coordinate },
    /// Recenter on the moving entity at the last known span.
    Single,
}

pub struct CameraFollowController {
    map: Arc<dyn MapSurface>,
    config: CameraConfig,
    throttle: Throttle,
    destination: Option<Coordinate>,
    state: CameraState,
    span: f64,
    following: bool,
    rotate_with_heading: bool,
}

impl CameraFollowController {
    pub fn new(map: Arc<dyn MapSurface>, config: CameraConfig) -> Self {
        Self {
            throttle: Throttle::new(config.follow_throttle()),
            span: config.default_span_degrees,
            map,
            config,
            destination: None,
            state: CameraState::default(),
            following: true,
            rotate_with_heading: false,
        }
    }

    pub fn with_destination(mut self, destination: Option<Coordinate>) -> Self {
        self.set_destination(destination);
        self
    }

    /// A destination with non-finite coordinates is treated as absent.
    pub fn set_destination(&mut self, destination: Option<Coordinate>) {
        self.destination = destination.filter(Coordinate::is_finite);
    }

    /// Rotate the map with the entity's heading instead of keeping the user's bearing.
    pub fn set_rotate_with_heading(&mut self, enabled: bool) {
        self.rotate_with_heading = enabled;
    }

    pub fn framing_mode(&self) -> FramingMode {
        match self.destination {
            Some(destination) => FramingMode::Dual { destination },
            None => FramingMode::Single,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn resume_follow(&mut self) {
        self.following = true;
        self.throttle.reset();
    }

    pub fn map(&self) -> Arc<dyn MapSurface> {
        self.map.clone()
    }

    /// Decides the camera write for one delivered movement, consuming the throttle slot.
    pub fn plan(&mut self, now: Instant, coordinate: Coordinate, heading: Option<f64>) -> FollowDecision {
        if !coordinate.is_finite() {
            return FollowDecision::InvalidCoordinate;
        }

        let mode = self.framing_mode();
        if mode == FramingMode::Single && !self.following {
            return FollowDecision::Suspended;
        }

        if !self.throttle.try_acquire(now) {
            return FollowDecision::Throttled;
        }

        let write = match mode {
            FramingMode::Dual { destination } => CameraWrite::FitToCoordinates {
                points: vec![coordinate, destination],
                options: FitOptions {
                    edge_padding: EdgePadding::uniform(self.config.edge_padding_px),
                    animated: true,
                },
            },
            FramingMode::Single => match self.state.camera {
                Some(previous) => CameraWrite::AnimateCamera {
                    camera: CameraUpdate {
                        center: coordinate,
                        heading: match heading {
                            Some(h) if self.rotate_with_heading => h,
                            _ => previous.heading,
                        },
                        pitch: previous.pitch,
                        zoom: previous.zoom,
                    },
                    duration: self.config.follow_animation(),
                },
                None => CameraWrite::AnimateToRegion {
                    region: Region::around(coordinate, self.span),
                    duration: self.config.region_animation(),
                },
            },
        };

        FollowDecision::Write(write)
    }

    pub async fn on_movement(&mut self, now: Instant, coordinate: Coordinate, heading: Option<f64>) -> FollowDecision {
        let decision = self.plan(now, coordinate, heading);
        if let FollowDecision::Write(write) = &decision {
            if let Err(e) = write.execute(self.map.as_ref()).await {
                tracing::debug!(error = %e, "camera follow write rejected");
                return FollowDecision::Failed(e.to_string());
            }
            if let CameraWrite::AnimateToRegion { region, .. } = write {
                self.state.region = Some(*region);
            }
        }
        decision
    }

    /// Static framing of two fixed points, e.g. a food truck and the customer.
    pub async fn frame_pair(&mut self, a: Coordinate, b: Coordinate) -> FollowDecision {
        if !a.is_finite() || !b.is_finite() {
            return FollowDecision::InvalidCoordinate;
        }

        let region = bounding_region_with(a, b, &self.config);
        let write = CameraWrite::AnimateToRegion {
            region,
            duration: self.config.region_animation(),
        };
        match write.execute(self.map.as_ref()).await {
            Ok(()) => {
                self.state.region = Some(region);
                self.span = region.latitude_delta;
                FollowDecision::Write(write)
            }
            Err(e) => {
                tracing::debug!(error = %e, "static framing rejected");
                FollowDecision::Failed(e.to_string())
            }
        }
    }

    /// Records the viewport after a user gesture and suspends follow when the
    /// user zoomed out to city level.
    pub fn on_region_change_complete(&mut self, camera: Option<Camera>, region: Region) {
        self.state.region = Some(region);
        self.span = region.latitude_delta;
        if let Some(camera) = camera {
            self.state.camera = Some(camera);
        }

        if self.zoomed_out_to_city_level(camera, region) {
            self.following = false;
        }
    }

    fn zoomed_out_to_city_level(&self, camera: Option<Camera>, region: Region) -> bool {
        match camera.and_then(|c| c.zoom) {
            Some(zoom) => zoom <= self.config.follow_disable_zoom,
            None => region.latitude_delta >= self.config.follow_disable_latitude_delta,
        }
    }

    pub fn zoom_level(&self) -> f64 {
        self.state.zoom_level().unwrap_or_else(|| zoom_level(self.span))
    }
}
