use crate::common::{normalize_heading, Coordinate, TrackingError, TrackingResult};
use crate::config::ChannelConfig;
use serde::{Deserialize, Serialize};

/// Bundled artwork used when a vehicle has no avatar of its own.
pub const DEFAULT_VEHICLE_IMAGE: &str = "vehicles/light_commercial_van.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Driver,
    Vehicle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    Remote(String),
    Bundled(String),
}

impl ImageSource {
    pub fn for_avatar(avatar_url: Option<&str>) -> Self {
        match avatar_url {
            Some(url) if !url.trim().is_empty() => ImageSource::Remote(url.to_string()),
            _ => ImageSource::Bundled(DEFAULT_VEHICLE_IMAGE.to_string()),
        }
    }
}

/// A driver or vehicle whose position is shown live on the map.
/// `coordinate` and `heading` hold the latest settled target, not the animated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: String,
    pub kind: EntityKind,
    pub coordinate: Coordinate,
    pub heading: f64,
    pub image: ImageSource,
}

impl TrackedEntity {
    pub fn new(
        id: String,
        kind: EntityKind,
        coordinate: Coordinate,
        heading: f64,
        image: ImageSource,
    ) -> TrackingResult<Self> {
        if !coordinate.is_finite() {
            return Err(TrackingError::InvalidCoordinate {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }

        let heading = if heading.is_finite() {
            normalize_heading(heading)
        } else {
            0.0
        };

        Ok(Self {
            id,
            kind,
            coordinate,
            heading,
            image,
        })
    }

    /// Push channel this entity's movements are published on, e.g. `vehicle.v_123`.
    pub fn channel_name(&self, config: &ChannelConfig) -> String {
        let prefix = match self.kind {
            EntityKind::Driver => &config.driver_prefix,
            EntityKind::Vehicle => &config.vehicle_prefix,
        };
        format!("{}.{}", prefix, self.id)
    }

    /// Records a new settled target. Only the parts given are touched.
    pub fn settle(&mut self, coordinate: Option<Coordinate>, heading: Option<f64>) {
        if let Some(coordinate) = coordinate {
            self.coordinate = coordinate;
        }
        if let Some(heading) = heading.filter(|h| h.is_finite()) {
            self.heading = normalize_heading(heading);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truck() -> TrackedEntity {
        TrackedEntity::new(
            "v_1".to_string(),
            EntityKind::Vehicle,
            Coordinate::new(1.0, 103.0),
            350.0,
            ImageSource::for_avatar(None),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_finite_initial_coordinate() {
        let result = TrackedEntity::new(
            "d_1".to_string(),
            EntityKind::Driver,
            Coordinate::new(f64::NAN, 103.0),
            0.0,
            ImageSource::for_avatar(None),
        );
        assert!(matches!(result, Err(TrackingError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_heading_only_settle_keeps_coordinate() {
        let mut entity = truck();
        entity.settle(None, Some(370.0));
        assert_eq!(entity.coordinate, Coordinate::new(1.0, 103.0));
        assert_eq!(entity.heading, 10.0);
    }

    #[test]
    fn test_channel_name_uses_kind_prefix() {
        let entity = truck();
        assert_eq!(entity.channel_name(&ChannelConfig::default()), "vehicle.v_1");
    }

    #[test]
    fn test_blank_avatar_falls_back_to_bundled_image() {
        assert_eq!(
            ImageSource::for_avatar(Some("  ")),
            ImageSource::Bundled(DEFAULT_VEHICLE_IMAGE.to_string())
        );
        assert_eq!(
            ImageSource::for_avatar(Some("https://cdn.example.com/truck.png")),
            ImageSource::Remote("https://cdn.example.com/truck.png".to_string())
        );
    }
}
