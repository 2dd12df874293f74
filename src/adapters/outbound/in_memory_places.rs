use crate::common::{TrackingError, TrackingResult};
use crate::domains::origin::{FoodTruckRepository, Origin, StoreLocationRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Food trucks split into a local cache and a "remote" set that counts lookups.
#[derive(Clone, Default)]
pub struct InMemoryFoodTruckRepository {
    cache: Arc<Mutex<HashMap<String, Origin>>>,
    remote: Arc<Mutex<HashMap<String, Origin>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryFoodTruckRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self, origin: Origin) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(origin.id.clone(), origin);
        }
    }

    pub fn publish(&self, origin: Origin) {
        if let Ok(mut remote) = self.remote.lock() {
            remote.insert(origin.id.clone(), origin);
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodTruckRepository for InMemoryFoodTruckRepository {
    fn cached(&self, id: &str) -> Option<Origin> {
        self.cache.lock().ok()?.get(id).cloned()
    }

    async fn find_food_truck(&self, id: &str) -> TrackingResult<Origin> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let found = self
            .remote
            .lock()
            .map_err(|_| TrackingError::Lookup("food truck store poisoned".to_string()))?
            .get(id)
            .cloned();

        let origin = found.ok_or_else(|| TrackingError::NotFound { id: id.to_string() })?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(origin.id.clone(), origin.clone());
        }
        Ok(origin)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStoreLocationRepository {
    locations: Arc<Mutex<HashMap<String, Origin>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryStoreLocationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, store_location_id: &str, origin: Origin) {
        if let Ok(mut locations) = self.locations.lock() {
            locations.insert(store_location_id.to_string(), origin);
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreLocationRepository for InMemoryStoreLocationRepository {
    async fn find_store_location(&self, id: &str) -> TrackingResult<Origin> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.locations
            .lock()
            .map_err(|_| TrackingError::Lookup("store location store poisoned".to_string()))?
            .get(id)
            .cloned()
            .ok_or_else(|| TrackingError::NotFound { id: id.to_string() })
    }
}
