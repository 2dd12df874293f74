use crate::common::Coordinate;
use crate::config::OriginConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OriginKind {
    /// A mobile origin; its vehicle is tracked live.
    FoodTruck { vehicle_id: Option<String> },
    StoreLocation { store_location_id: String },
    Place,
}

/// Concrete start point of a tracked route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub id: String,
    pub kind: OriginKind,
    pub name: Option<String>,
    pub coordinate: Coordinate,
}

impl Origin {
    pub fn is_food_truck(&self) -> bool {
        matches!(self.kind, OriginKind::FoodTruck { .. })
    }

    /// Vehicle to subscribe to when the origin moves.
    pub fn tracked_vehicle_id(&self) -> Option<&str> {
        match &self.kind {
            OriginKind::FoodTruck { vehicle_id } => vehicle_id.as_deref(),
            _ => None,
        }
    }

    /// Whether this origin already answers to `identifier`.
    pub fn matches(&self, identifier: &str) -> bool {
        if self.id == identifier {
            return true;
        }
        matches!(&self.kind, OriginKind::StoreLocation { store_location_id } if store_location_id == identifier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OriginReference {
    Resolved(Origin),
    Identifier(String),
}

impl From<Origin> for OriginReference {
    fn from(origin: Origin) -> Self {
        OriginReference::Resolved(origin)
    }
}

impl From<&str> for OriginReference {
    fn from(id: &str) -> Self {
        OriginReference::Identifier(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginClass {
    FoodTruck,
    StoreLocation,
    Unknown,
}

impl OriginClass {
    pub fn classify(identifier: &str, config: &OriginConfig) -> Self {
        if identifier.starts_with(&config.food_truck_prefix) {
            OriginClass::FoodTruck
        } else if identifier.starts_with(&config.store_location_prefix) {
            OriginClass::StoreLocation
        } else {
            OriginClass::Unknown
        }
    }
}

/// Resolution lifecycle. Failure settles as ready-with-no-data.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionState {
    Idle,
    Resolving { identifier: String },
    Ready(Origin),
    Failed { identifier: String, reason: String },
}

impl ResolutionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResolutionState::Ready(_) | ResolutionState::Failed { .. })
    }

    pub fn origin(&self) -> Option<&Origin> {
        match self {
            ResolutionState::Ready(origin) => Some(origin),
            _ => None,
        }
    }

    pub fn shows_loading_overlay(&self) -> bool {
        matches!(self, ResolutionState::Resolving { .. })
    }

    pub fn can_render_origin_marker(&self) -> bool {
        matches!(self, ResolutionState::Ready(_))
    }

    /// Route line needs both ends, so only a resolved origin qualifies.
    pub fn can_render_route(&self) -> bool {
        matches!(self, ResolutionState::Ready(origin) if origin.coordinate.is_finite())
    }

    pub fn shows_empty_state(&self) -> bool {
        matches!(self, ResolutionState::Failed { .. })
    }
}
