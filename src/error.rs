//! Error types for YantraIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// YantraIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (sysfs, i2c-dev, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad, missing or out-of-range request field
    #[error("{0}")]
    InvalidArgument(String),

    /// Sensor did not answer within its bound
    #[error("Device timeout: {0}")]
    DeviceTimeout(&'static str),

    /// Measurement outside the sensor's physical range
    #[error("Reading out of range: {distance_cm:.2} cm")]
    OutOfRange {
        /// Raw distance that was rejected
        distance_cm: f32,
    },

    /// Hardware interface missing or failed to initialize
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Hardware reported an error during an operation
    #[error("Device error: {0}")]
    Device(String),

    /// Malformed HTTP request
    #[error("Bad request: {0}")]
    Http(String),

    /// Request body larger than the configured limit
    #[error("Request body of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error was caused by the caller rather than the device
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::Http(_) | Error::PayloadTooLarge { .. }
        )
    }
}
