use crate::common::{Coordinate, Region, TrackingError, TrackingResult};
use crate::domains::camera::{Camera, CameraUpdate, FitOptions, MapSurface};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    AnimateToRegion(Region, Duration),
    AnimateCamera(CameraUpdate, Duration),
    FitToCoordinates(Vec<Coordinate>, FitOptions),
    GetCamera,
}

struct SurfaceState {
    mounted: bool,
    camera: Camera,
    calls: Vec<MapCall>,
}

/// Headless map surface that applies camera writes to an in-memory camera and
/// records every call. Unmounted surfaces reject all calls.
#[derive(Clone)]
pub struct RecordingMapSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl RecordingMapSurface {
    pub fn new(camera: Camera) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                mounted: true,
                camera,
                calls: Vec::new(),
            })),
        }
    }

    pub fn unmounted(camera: Camera) -> Self {
        let surface = Self::new(camera);
        surface.set_mounted(false);
        surface
    }

    pub fn set_mounted(&self, mounted: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.mounted = mounted;
        }
    }

    /// Simulates the user rotating the map.
    pub fn set_heading(&self, heading: f64) {
        if let Ok(mut state) = self.state.lock() {
            state.camera.heading = heading;
        }
    }

    pub fn camera(&self) -> Option<Camera> {
        self.state.lock().ok().map(|state| state.camera)
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.state.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    /// Calls that moved the camera, excluding queries.
    pub fn writes(&self) -> Vec<MapCall> {
        self.calls()
            .into_iter()
            .filter(|call| *call != MapCall::GetCamera)
            .collect()
    }

    fn record<T>(&self, call: MapCall, apply: impl FnOnce(&mut Camera) -> T) -> TrackingResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TrackingError::MapSurface("surface state poisoned".to_string()))?;
        if !state.mounted {
            return Err(TrackingError::MapSurface("map view not mounted".to_string()));
        }
        state.calls.push(call);
        Ok(apply(&mut state.camera))
    }
}

#[async_trait]
impl MapSurface for RecordingMapSurface {
    async fn animate_to_region(&self, region: Region, duration: Duration) -> TrackingResult<()> {
        self.record(MapCall::AnimateToRegion(region, duration), |camera| {
            camera.center = region.center();
            camera.zoom = Some(region.zoom_level());
        })
    }

    async fn animate_camera(&self, update: CameraUpdate, duration: Duration) -> TrackingResult<()> {
        self.record(MapCall::AnimateCamera(update, duration), |camera| {
            camera.center = update.center;
            camera.heading = update.heading;
            if update.zoom.is_some() {
                camera.zoom = update.zoom;
            }
            if update.pitch.is_some() {
                camera.pitch = update.pitch;
            }
        })
    }

    async fn fit_to_coordinates(&self, points: &[Coordinate], options: FitOptions) -> TrackingResult<()> {
        self.record(MapCall::FitToCoordinates(points.to_vec(), options), |camera| {
            if let [first, rest @ ..] = points {
                let (mut lat, mut lng) = (first.latitude, first.longitude);
                for p in rest {
                    lat += p.latitude;
                    lng += p.longitude;
                }
                let n = points.len() as f64;
                camera.center = Coordinate::new(lat / n, lng / n);
            }
        })
    }

    async fn get_camera(&self) -> TrackingResult<Camera> {
        self.record(MapCall::GetCamera, |camera| *camera)
    }
}
