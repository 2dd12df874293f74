use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Map surface error: {0}")]
    MapSurface(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Not found: {id}")]
    NotFound { id: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type TrackingResult<T> = Result<T, TrackingError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
