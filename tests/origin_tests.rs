use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_tracking::adapters::outbound::{
    init_noop_logger, InMemoryFoodTruckRepository, InMemoryStoreLocationRepository,
};
use storefront_tracking::common::{Coordinate, TrackingError, TrackingResult};
use storefront_tracking::config::OriginConfig;
use storefront_tracking::domains::origin::{
    FoodTruckRepository, Origin, OriginKind, OriginReference, OriginResolver, ResolutionState,
};
use tokio::sync::Notify;

fn food_truck(id: &str) -> Origin {
    Origin {
        id: id.to_string(),
        kind: OriginKind::FoodTruck {
            vehicle_id: Some("v_9".to_string()),
        },
        name: Some("Taco Truck".to_string()),
        coordinate: Coordinate::new(40.74, -73.99),
    }
}

fn store(id: &str, store_location_id: &str) -> Origin {
    Origin {
        id: id.to_string(),
        kind: OriginKind::StoreLocation {
            store_location_id: store_location_id.to_string(),
        },
        name: Some("Downtown".to_string()),
        coordinate: Coordinate::new(40.71, -74.0),
    }
}

fn resolver(
    food_trucks: &InMemoryFoodTruckRepository,
    stores: &InMemoryStoreLocationRepository,
) -> OriginResolver {
    OriginResolver::new(
        Arc::new(food_trucks.clone()),
        Arc::new(stores.clone()),
        init_noop_logger(),
        OriginConfig::default(),
    )
}

/// Holds every lookup until released.
struct GatedFoodTrucks {
    gate: Arc<Notify>,
    lookups: AtomicUsize,
}

#[async_trait]
impl FoodTruckRepository for GatedFoodTrucks {
    fn cached(&self, _id: &str) -> Option<Origin> {
        None
    }

    async fn find_food_truck(&self, id: &str) -> TrackingResult<Origin> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(food_truck(id))
    }
}

#[tokio::test]
async fn test_pending_identifier_is_looked_up_once() {
    let gate = Arc::new(Notify::new());
    let food_trucks = Arc::new(GatedFoodTrucks {
        gate: gate.clone(),
        lookups: AtomicUsize::new(0),
    });
    let resolver = OriginResolver::new(
        food_trucks.clone(),
        Arc::new(InMemoryStoreLocationRepository::new()),
        init_noop_logger(),
        OriginConfig::default(),
    );

    let first = resolver.resolve(Some(OriginReference::from("food_truck_1")));
    let second = async {
        tokio::task::yield_now().await;
        assert!(resolver.is_loading());
        let state = resolver.resolve(Some(OriginReference::from("food_truck_1"))).await;
        gate.notify_one();
        state
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(food_trucks.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(
        second,
        ResolutionState::Resolving {
            identifier: "food_truck_1".to_string()
        }
    );
    assert_eq!(first, ResolutionState::Ready(food_truck("food_truck_1")));
    assert!(resolver.is_ready());
}

#[tokio::test]
async fn test_cached_food_truck_resolves_without_lookup() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    food_trucks.cache(food_truck("food_truck_42"));
    let seen: Arc<Mutex<Vec<ResolutionState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new())
        .with_observer(move |state| sink.lock().unwrap().push(state.clone()));

    let state = resolver.resolve(Some("food_truck_42".into())).await;

    assert_eq!(food_trucks.lookups(), 0);
    assert!(state.origin().map(Origin::is_food_truck).unwrap_or(false));
    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .all(|s| !matches!(s, ResolutionState::Resolving { .. })));
}

#[tokio::test]
async fn test_remote_food_truck_passes_through_resolving() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    food_trucks.publish(food_truck("food_truck_7"));
    let seen: Arc<Mutex<Vec<ResolutionState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new())
        .with_observer(move |state| sink.lock().unwrap().push(state.clone()));

    resolver.resolve(Some("food_truck_7".into())).await;
    resolver.resolve(Some("food_truck_7".into())).await;

    assert_eq!(food_trucks.lookups(), 1);
    let seen = seen.lock().unwrap();
    assert!(seen[0].shows_loading_overlay());
    assert!(seen[1].can_render_route());
    assert_eq!(resolver.origin().map(|o| o.id), Some("food_truck_7".to_string()));
}

#[tokio::test]
async fn test_failed_lookup_settles_ready_without_origin() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new());

    let state = resolver.resolve(Some("food_truck_404".into())).await;

    assert!(matches!(state, ResolutionState::Failed { .. }));
    assert!(resolver.is_ready());
    assert!(!resolver.is_loading());
    assert!(state.shows_empty_state());
    assert!(!state.can_render_origin_marker());

    // not retried on this screen
    resolver.resolve(Some("food_truck_404".into())).await;
    assert_eq!(food_trucks.lookups(), 1);
}

#[tokio::test]
async fn test_store_location_resolves_and_matches_by_store_id() {
    let stores = InMemoryStoreLocationRepository::new();
    stores.insert("store_location_7", store("place_7", "store_location_7"));
    let resolver = resolver(&InMemoryFoodTruckRepository::new(), &stores);

    let state = resolver.resolve(Some("store_location_7".into())).await;
    assert_eq!(state, ResolutionState::Ready(store("place_7", "store_location_7")));
    assert!(!state.origin().unwrap().is_food_truck());

    resolver.resolve(Some("store_location_7".into())).await;
    assert_eq!(stores.lookups(), 1);
}

#[tokio::test]
async fn test_unrecognized_identifier_fails_without_io() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    let stores = InMemoryStoreLocationRepository::new();
    let resolver = resolver(&food_trucks, &stores);

    let state = resolver.resolve(Some("warehouse_3".into())).await;

    assert!(matches!(state, ResolutionState::Failed { .. }));
    assert_eq!(food_trucks.lookups() + stores.lookups(), 0);
}

#[tokio::test]
async fn test_resolved_origin_and_initial_origin_need_no_lookup() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    let stores = InMemoryStoreLocationRepository::new();

    let resolver = resolver(&food_trucks, &stores).with_initial(store("place_1", "store_location_1"));
    assert_eq!(
        resolver.resolve(None).await,
        ResolutionState::Ready(store("place_1", "store_location_1"))
    );

    let direct = food_truck("food_truck_5");
    assert_eq!(
        resolver.resolve(Some(direct.clone().into())).await,
        ResolutionState::Ready(direct)
    );
    assert_eq!(food_trucks.lookups() + stores.lookups(), 0);
}

#[tokio::test]
async fn test_missing_reference_without_initial_fails() {
    let resolver = resolver(&InMemoryFoodTruckRepository::new(), &InMemoryStoreLocationRepository::new());
    assert!(resolver.resolve(None).await.shows_empty_state());
    assert!(resolver.is_ready());
}

#[test]
fn test_not_found_error_names_identifier() {
    let e = TrackingError::NotFound {
        id: "food_truck_1".to_string(),
    };
    assert!(e.to_string().contains("food_truck_1"));
}

#[tokio::test]
async fn test_newer_reference_wins_over_pending_lookup() {
    let gate = Arc::new(Notify::new());
    let food_trucks = Arc::new(GatedFoodTrucks {
        gate: gate.clone(),
        lookups: AtomicUsize::new(0),
    });
    let resolver = OriginResolver::new(
        food_trucks,
        Arc::new(InMemoryStoreLocationRepository::new()),
        init_noop_logger(),
        OriginConfig::default(),
    );

    let first = resolver.resolve(Some(OriginReference::from("food_truck_1")));
    let second = async {
        tokio::task::yield_now().await;
        let state = resolver.resolve(Some(OriginReference::from("place_9"))).await;
        gate.notify_one();
        state
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(&second, ResolutionState::Failed { identifier, .. } if identifier == "place_9"));
    assert_eq!(resolver.state(), second);
    assert_eq!(first, second);
    assert!(resolver.origin().is_none());
}

#[tokio::test]
async fn test_returning_to_an_identifier_yields_its_own_origin() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    food_trucks.publish(food_truck("food_truck_1"));
    food_trucks.publish(food_truck("food_truck_2"));
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new());

    resolver.resolve(Some("food_truck_1".into())).await;
    resolver.resolve(Some("food_truck_2".into())).await;
    let again = resolver.resolve(Some("food_truck_1".into())).await;

    assert_eq!(again, ResolutionState::Ready(food_truck("food_truck_1")));
    assert_eq!(resolver.origin().map(|o| o.id), Some("food_truck_1".to_string()));
    assert_eq!(food_trucks.lookups(), 2);
}

#[tokio::test]
async fn test_failed_identifier_keeps_its_failure_after_switching_away() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    food_trucks.publish(food_truck("food_truck_2"));
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new());

    resolver.resolve(Some("food_truck_404".into())).await;
    resolver.resolve(Some("food_truck_2".into())).await;
    let again = resolver.resolve(Some("food_truck_404".into())).await;

    assert!(matches!(&again, ResolutionState::Failed { identifier, .. } if identifier == "food_truck_404"));
    assert_eq!(food_trucks.lookups(), 2);
}

#[tokio::test]
async fn test_failure_after_success_clears_current_origin() {
    let food_trucks = InMemoryFoodTruckRepository::new();
    food_trucks.publish(food_truck("food_truck_1"));
    let resolver = resolver(&food_trucks, &InMemoryStoreLocationRepository::new());

    resolver.resolve(Some("food_truck_1".into())).await;
    assert!(resolver.origin().is_some());

    let state = resolver.resolve(Some("food_truck_404".into())).await;
    assert!(state.shows_empty_state());
    assert!(resolver.origin().is_none());
}
