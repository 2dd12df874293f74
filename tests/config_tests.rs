use std::time::Duration;
use storefront_tracking::application::load_config;
use storefront_tracking::config::Config;
use tempfile::tempdir;

#[test]
fn test_defaults_match_frame_and_follow_cadence() {
    let config = Config::default();
    assert_eq!(config.buffer.flush_interval(), Duration::from_millis(16));
    assert_eq!(config.motion.move_duration(), Duration::from_millis(1000));
    assert_eq!(config.camera.follow_throttle(), Duration::from_millis(250));
    assert_eq!(config.camera.follow_animation(), Duration::from_millis(280));
    assert_eq!(config.camera.edge_padding_px, 50.0);
    assert_eq!(config.channel.vehicle_prefix, "vehicle");
    assert_eq!(config.origin.food_truck_prefix, "food_truck");
    assert!(config.logging.file.is_none());
}

#[tokio::test]
async fn test_partial_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracking.toml");
    std::fs::write(
        &path,
        r#"
[camera]
follow_throttle_ms = 400

[logging]
file = "logs/tracking.log"
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.camera.follow_throttle_ms, 400);
    assert_eq!(config.camera.follow_animation_ms, 280);
    assert_eq!(config.motion.max_move_duration_ms, 5000);
    assert_eq!(config.logging.file.as_deref(), Some("logs/tracking.log"));
}

#[tokio::test]
async fn test_missing_file_is_an_error_for_from_file() {
    let dir = tempdir().unwrap();
    assert!(Config::from_file(dir.path().join("absent.toml")).await.is_err());
}

#[test]
fn test_layered_loading_with_file_and_environment() {
    let dir = tempdir().unwrap();

    let defaults = load_config(Some(dir.path().join("absent.toml").to_str().unwrap())).unwrap();
    assert_eq!(defaults.buffer.flush_interval_ms, 16);

    let path = dir.path().join("tracking.toml");
    std::fs::write(&path, "[motion]\nfallback_speed_mps = 12.5\n").unwrap();
    std::env::set_var("TRACKING__CAMERA__FOLLOW_DISABLE_ZOOM", "11");
    let layered = Config::load_layered(Some(&path));
    std::env::remove_var("TRACKING__CAMERA__FOLLOW_DISABLE_ZOOM");

    let layered = layered.unwrap();
    assert_eq!(layered.motion.fallback_speed_mps, 12.5);
    assert_eq!(layered.camera.follow_disable_zoom, 11.0);
    assert_eq!(layered.camera.follow_throttle_ms, 250);
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[tokio::test]
async fn test_zero_flush_interval_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracking.toml");
    std::fs::write(&path, "[buffer]\nflush_interval_ms = 0\n").unwrap();

    let err = Config::from_file(&path).await.unwrap_err();
    assert!(err.to_string().contains("flush_interval_ms"));
    assert!(Config::load_layered(Some(&path)).is_err());
}

#[test]
fn test_degenerate_camera_values_are_rejected() {
    let mut config = Config::default();
    config.camera.bearing_poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.camera.region_padding = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.camera.min_span_degrees = -0.005;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.motion.min_move_duration_ms = 6000;
    assert!(config.validate().is_err());
}

#[test]
fn test_interval_accessors_never_return_zero() {
    let mut config = Config::default();
    config.buffer.flush_interval_ms = 0;
    config.camera.bearing_poll_interval_ms = 0;
    assert_eq!(config.buffer.flush_interval(), Duration::from_millis(1));
    assert_eq!(config.camera.bearing_poll_interval(), Duration::from_millis(1));
}
