use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storefront_tracking::adapters::outbound::{
    init_configured_logger, InMemoryFoodTruckRepository, InMemoryStoreLocationRepository, InMemoryTransport,
    RecordingMapSurface,
};
use storefront_tracking::application::{load_config, next_frame, SessionOptions, SessionPorts, TrackingSession};
use storefront_tracking::common::Coordinate;
use storefront_tracking::domains::camera::Camera;
use storefront_tracking::domains::origin::{Origin, OriginKind, OriginReference, OriginResolver, ResolutionState};
use storefront_tracking::domains::subscription::MovementObservers;
use storefront_tracking::domains::tracking::{EntityKind, ImageSource, TrackedEntity};

const DEMO_TRUCK: &str = "food_truck_42";
const DEMO_VEHICLE: &str = "v_42";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // No `log` bridge: fast_log owns the `log` facade when a log file is configured.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting storefront tracking demo");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "tracking.toml".to_string());
    let config = load_config(Some(config_path.as_str()))?;
    info!(
        flush_ms = config.buffer.flush_interval_ms,
        throttle_ms = config.camera.follow_throttle_ms,
        "Configuration loaded"
    );

    let logger = init_configured_logger(config.logging.file.as_deref());

    // Route origin: a food truck already in the local cache.
    let food_trucks = Arc::new(InMemoryFoodTruckRepository::new());
    food_trucks.cache(Origin {
        id: DEMO_TRUCK.to_string(),
        kind: OriginKind::FoodTruck {
            vehicle_id: Some(DEMO_VEHICLE.to_string()),
        },
        name: Some("Taco Truck".to_string()),
        coordinate: Coordinate::new(40.7411, -73.9897),
    });
    let resolver = OriginResolver::new(
        food_trucks,
        Arc::new(InMemoryStoreLocationRepository::new()),
        logger.clone(),
        config.origin.clone(),
    )
    .with_observer(|state| tracing::debug!(?state, "origin resolution"));

    let origin = match resolver.resolve(Some(OriginReference::from(DEMO_TRUCK))).await {
        ResolutionState::Ready(origin) => origin,
        other => {
            warn!(?other, "origin unavailable, nothing to track");
            return Ok(());
        }
    };
    let destination = Coordinate::new(40.7484, -73.9857);

    let transport = Arc::new(InMemoryTransport::new());
    let map = Arc::new(RecordingMapSurface::new(Camera {
        center: origin.coordinate,
        heading: 0.0,
        pitch: Some(0.0),
        zoom: Some(15.0),
    }));

    let vehicle_id = origin.tracked_vehicle_id().unwrap_or(DEMO_VEHICLE).to_string();
    let entity = TrackedEntity::new(
        vehicle_id,
        EntityKind::Vehicle,
        origin.coordinate,
        0.0,
        ImageSource::for_avatar(None),
    )?;

    let observers = MovementObservers::new().on_movement(move |notice| {
        if let Some(position) = notice.coordinates {
            info!(
                remaining_m = position.distance_meters(&destination).round(),
                duration_ms = notice.duration.map(|d| d.as_millis() as u64),
                "truck moved"
            );
        }
    });

    let mut session = TrackingSession::new(
        entity,
        config.clone(),
        SessionPorts {
            transport: transport.clone(),
            map: map.clone(),
            logger: logger.clone(),
        },
        SessionOptions {
            destination: Some(destination),
            observers,
            rotate_with_heading: false,
        },
    );

    session
        .pipeline()
        .lock()
        .await
        .camera_mut()
        .frame_pair(origin.coordinate, destination)
        .await;

    session.focus_gained().await;
    let mut frames = session.frames();
    if let Ok(frame) = next_frame(&mut frames).await {
        tracing::debug!(animating = frame.animating, "frame clock running");
    }

    let channel = session.channel().to_string();
    let publisher = tokio::spawn(simulate_route(transport, channel, origin.coordinate, destination));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = publisher => info!("Route complete"),
    }

    // let the last window drain
    tokio::time::sleep(Duration::from_millis(config.motion.max_move_duration_ms.min(1000))).await;

    let frame = session.latest_frame();
    info!(
        latitude = frame.coordinate.latitude,
        longitude = frame.coordinate.longitude,
        heading = frame.heading,
        camera_writes = map.writes().len(),
        "Final marker frame"
    );

    session.shutdown().await;
    Ok(())
}

/// Publishes a jittered straight-line route, several fixes per frame window now and then.
async fn simulate_route(transport: Arc<InMemoryTransport>, channel: String, from: Coordinate, to: Coordinate) {
    const STEPS: usize = 40;
    let mut previous = from;

    for step in 1..=STEPS {
        let t = step as f64 / STEPS as f64;
        let (jitter_lat, jitter_lng, burst) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(-0.00005..0.00005),
                rng.gen_range(-0.00005..0.00005),
                rng.gen_range(1..=3usize),
            )
        };
        let next = Coordinate::new(
            from.latitude + (to.latitude - from.latitude) * t + jitter_lat,
            from.longitude + (to.longitude - from.longitude) * t + jitter_lng,
        );
        let heading = (next.longitude - previous.longitude)
            .atan2(next.latitude - previous.latitude)
            .to_degrees();

        for _ in 0..burst {
            transport.publish(
                &channel,
                json!({
                    "event": "location.updated",
                    "data": {
                        "location": { "type": "Point", "coordinates": [next.longitude, next.latitude] },
                        "heading": heading,
                        "speed": 8.5
                    },
                    "created_at": Utc::now().to_rfc3339()
                }),
            );
        }

        previous = next;
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}
