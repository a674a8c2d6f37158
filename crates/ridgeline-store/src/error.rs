//! Error types for registry persistence.

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or mutating the registry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No user with the given id exists in the registry.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The document could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The document could not be written to disk.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ridgeline_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(id) => ridgeline_core::Error::UserNotFound(id),
            other => ridgeline_core::Error::Persistence(other.to_string()),
        }
    }
}
