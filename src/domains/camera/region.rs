use crate::common::{Coordinate, Region};
use crate::config::CameraConfig;

/// Smallest padded region containing both points, used for static framing.
///
/// Each span is `(max - min) * padding`, never smaller than `min_span`.
pub fn bounding_region(a: Coordinate, b: Coordinate, padding: f64, min_span: f64) -> Region {
    let min_lat = a.latitude.min(b.latitude);
    let max_lat = a.latitude.max(b.latitude);
    let min_lng = a.longitude.min(b.longitude);
    let max_lng = a.longitude.max(b.longitude);

    Region {
        latitude: (min_lat + max_lat) / 2.0,
        longitude: (min_lng + max_lng) / 2.0,
        latitude_delta: ((max_lat - min_lat) * padding).max(min_span),
        longitude_delta: ((max_lng - min_lng) * padding).max(min_span),
    }
}

pub fn bounding_region_with(a: Coordinate, b: Coordinate, config: &CameraConfig) -> Region {
    bounding_region(a, b, config.region_padding, config.min_span_degrees)
}
