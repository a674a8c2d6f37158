use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Device / startup errors
    #[error("no fingerprint devices found")]
    NoDevicesFound,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("missing device handle")]
    MissingDeviceHandle,

    #[error("sensor error: {0}")]
    Sensor(String),

    // Session errors
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("enrollment failed: {0}")]
    EnrollFailed(String),

    #[error("enrollment timed out after {seconds}s")]
    EnrollTimeout { seconds: u64 },

    // Registry errors
    #[error("user not found: {0}")]
    UserNotFound(String),

    // Persistence errors
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Control plane
    #[error("reader controller is no longer running")]
    ControllerGone,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error is fatal at startup (the process must not continue).
    ///
    /// Only device discovery failures fall in this class; everything else is
    /// recoverable and surfaced to the caller that triggered it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NoDevicesFound | Error::DeviceNotFound(_) | Error::MissingDeviceHandle
        )
    }
}
