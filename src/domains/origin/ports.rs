use super::types::Origin;
use crate::common::TrackingResult;
use async_trait::async_trait;

/// Food truck lookups, backed by a local cache and the storefront API.
#[async_trait]
pub trait FoodTruckRepository: Send + Sync {
    /// Local cache only; never performs I/O.
    fn cached(&self, id: &str) -> Option<Origin>;
    async fn find_food_truck(&self, id: &str) -> TrackingResult<Origin>;
}

#[async_trait]
pub trait StoreLocationRepository: Send + Sync {
    async fn find_store_location(&self, id: &str) -> TrackingResult<Origin>;
}
