use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub buffer: BufferConfig,
    pub motion: MotionConfig,
    pub camera: CameraConfig,
    pub channel: ChannelConfig,
    pub origin: OriginConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Flush cadence; one display frame by default.
    pub flush_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub move_duration_ms: u64,
    pub rotation_duration_ms: u64,
    pub min_move_duration_ms: u64,
    pub max_move_duration_ms: u64,
    /// Assumed speed (m/s) when an event carries none.
    pub fallback_speed_mps: f64,
    pub readiness_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub follow_throttle_ms: u64,
    pub follow_animation_ms: u64,
    pub region_animation_ms: u64,
    pub region_padding: f64,
    pub min_span_degrees: f64,
    pub edge_padding_px: f64,
    pub default_span_degrees: f64,
    pub follow_disable_zoom: f64,
    pub follow_disable_latitude_delta: f64,
    pub bearing_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub driver_prefix: String,
    pub vehicle_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    pub food_truck_prefix: String,
    pub store_location_prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, domain log lines are also written here through fast_log.
    pub file: Option<String>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Layers an optional TOML file under `TRACKING__*` environment overrides,
    /// e.g. `TRACKING__CAMERA__FOLLOW_THROTTLE_MS=400`.
    pub fn load_layered<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("TRACKING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall a clock or collapse a region.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.buffer.flush_interval_ms > 0, "buffer.flush_interval_ms must be positive");
        ensure!(
            self.camera.bearing_poll_interval_ms > 0,
            "camera.bearing_poll_interval_ms must be positive"
        );
        ensure!(
            self.camera.region_padding.is_finite() && self.camera.region_padding > 0.0,
            "camera.region_padding must be positive, got {}",
            self.camera.region_padding
        );
        ensure!(
            self.camera.min_span_degrees.is_finite() && self.camera.min_span_degrees > 0.0,
            "camera.min_span_degrees must be positive, got {}",
            self.camera.min_span_degrees
        );
        ensure!(
            self.camera.default_span_degrees.is_finite() && self.camera.default_span_degrees > 0.0,
            "camera.default_span_degrees must be positive, got {}",
            self.camera.default_span_degrees
        );
        ensure!(
            self.motion.min_move_duration_ms <= self.motion.max_move_duration_ms,
            "motion.min_move_duration_ms exceeds motion.max_move_duration_ms"
        );
        ensure!(
            self.motion.fallback_speed_mps.is_finite() && self.motion.fallback_speed_mps > 0.0,
            "motion.fallback_speed_mps must be positive"
        );
        Ok(())
    }
}

impl BufferConfig {
    /// Never zero; a zero period would panic the interval clock.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

impl MotionConfig {
    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }

    pub fn rotation_duration(&self) -> Duration {
        Duration::from_millis(self.rotation_duration_ms)
    }

    pub fn readiness_settle(&self) -> Duration {
        Duration::from_millis(self.readiness_settle_ms)
    }
}

impl CameraConfig {
    pub fn follow_throttle(&self) -> Duration {
        Duration::from_millis(self.follow_throttle_ms)
    }

    pub fn follow_animation(&self) -> Duration {
        Duration::from_millis(self.follow_animation_ms)
    }

    pub fn region_animation(&self) -> Duration {
        Duration::from_millis(self.region_animation_ms)
    }

    pub fn bearing_poll_interval(&self) -> Duration {
        Duration::from_millis(self.bearing_poll_interval_ms.max(1))
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 16,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_duration_ms: 1000,
            rotation_duration_ms: 500,
            min_move_duration_ms: 100,
            max_move_duration_ms: 5000,
            fallback_speed_mps: 10.0,
            readiness_settle_ms: 250,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_throttle_ms: 250,
            follow_animation_ms: 280,
            region_animation_ms: 500,
            region_padding: 1.4,
            min_span_degrees: 0.005,
            edge_padding_px: 50.0,
            default_span_degrees: 0.005,
            follow_disable_zoom: 12.0,
            follow_disable_latitude_delta: 0.15,
            bearing_poll_interval_ms: 16,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            driver_prefix: "driver".to_string(),
            vehicle_prefix: "vehicle".to_string(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            food_truck_prefix: "food_truck".to_string(),
            store_location_prefix: "store_location".to_string(),
        }
    }
}
