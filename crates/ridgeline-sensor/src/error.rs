//! Error types for sensor operations.

/// Result type alias for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;

/// Errors that can occur during sensor driver operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// Discovery found no usable fingerprint devices.
    #[error("no fingerprint devices found")]
    NoDevicesFound,

    /// The requested device is not present.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Device is not connected or has been disconnected.
    #[error("device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation was issued while the device is in the wrong mode.
    #[error("operation {operation} invalid while {state}")]
    InvalidOperation { operation: String, state: String },

    /// Device communication error.
    #[error("communication error: {message}")]
    Communication { message: String },

    /// Device initialization failed.
    #[error("initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl SensorError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }
}

/// Discovery failures keep their fatal identity; everything else collapses
/// into the recoverable sensor bucket.
impl From<SensorError> for ridgeline_core::Error {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::NoDevicesFound => ridgeline_core::Error::NoDevicesFound,
            SensorError::DeviceNotFound(id) => ridgeline_core::Error::DeviceNotFound(id),
            other => ridgeline_core::Error::Sensor(other.to_string()),
        }
    }
}
