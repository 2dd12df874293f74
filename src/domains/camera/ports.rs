use crate::common::{Coordinate, EdgePadding, Region, TrackingResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Camera as reported by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Coordinate,
    pub heading: f64,
    pub pitch: Option<f64>,
    pub zoom: Option<f64>,
}

/// Programmatic camera move. `None` fields keep whatever the surface has.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraUpdate {
    pub center: Coordinate,
    pub heading: f64,
    pub pitch: Option<f64>,
    pub zoom: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub edge_padding: EdgePadding,
    pub animated: bool,
}

/// Port onto the native map view. Every call may fail while the view is not mounted.
#[async_trait]
pub trait MapSurface: Send + Sync {
    async fn animate_to_region(&self, region: Region, duration: Duration) -> TrackingResult<()>;
    async fn animate_camera(&self, camera: CameraUpdate, duration: Duration) -> TrackingResult<()>;
    async fn fit_to_coordinates(&self, points: &[Coordinate], options: FitOptions) -> TrackingResult<()>;
    async fn get_camera(&self) -> TrackingResult<Camera>;
}
