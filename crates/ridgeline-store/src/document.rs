//! Registry document model.

use chrono::{DateTime, Utc};
use ridgeline_core::{FingerprintTemplate, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fully-enrolled user as persisted in the registry document.
///
/// A record only comes into existence when its enrollment completed, so every
/// persisted record carries a fingerprint; there are no partial records.
/// `data` holds arbitrary caller-supplied metadata and is the only mutable
/// field; the fingerprint never changes after enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolledUser {
    /// System-generated unique identifier.
    pub id: UserId,

    /// Arbitrary caller-supplied metadata (name, badge number, ...).
    pub data: Value,

    /// Biometric template produced by the sensor during enrollment.
    pub fingerprint: FingerprintTemplate,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Record last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EnrolledUser {
    /// Create a record with fresh timestamps.
    pub fn new(id: UserId, data: Value, fingerprint: FingerprintTemplate) -> Self {
        let now = Utc::now();
        Self {
            id,
            data,
            fingerprint,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The single persisted registry document.
///
/// Holds the ordered user collection; any other top-level fields present in
/// the file are captured in `extra` and survive load/save cycles untouched,
/// keeping the document forward-compatible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Enrolled users, in enrollment order.
    #[serde(default)]
    pub users: Vec<EnrolledUser>,

    /// Forward-compatible fields written by other (newer) versions.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
