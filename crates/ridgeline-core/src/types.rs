use std::fmt;

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Opaque unique user identifier.
///
/// Generated by the system when an enrollment completes; callers never supply
/// one. The wire representation is a 32-character lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        UserId(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier string (lookups, deserialized records).
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

/// Opaque biometric template blob produced by the sensor driver.
///
/// Immutable once created. The format is device-specific and not
/// interchangeable between scanner vendors; this type never inspects the
/// bytes beyond comparing them.
///
/// # Security
///
/// Templates are biometric credentials: comparison is constant-time to avoid
/// timing side channels, and `Debug` output redacts the bytes.
#[derive(Clone, Eq)]
pub struct FingerprintTemplate(Vec<u8>);

impl FingerprintTemplate {
    /// Wrap raw template bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        FingerprintTemplate(bytes.into())
    }

    /// Get the raw template bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the template in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the template is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Constant-time comparison implementation for FingerprintTemplate
///
/// This prevents timing attacks by ensuring comparison takes the same time
/// regardless of where the byte sequences differ.
impl PartialEq for FingerprintTemplate {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for FingerprintTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FingerprintTemplate({} bytes)", self.0.len())
    }
}

/// Templates travel as base64 strings in the registry document and the API.
impl Serialize for FingerprintTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(&self.0))
    }
}

impl<'de> Deserialize<'de> for FingerprintTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded)
            .map(FingerprintTemplate)
            .map_err(serde::de::Error::custom)
    }
}
