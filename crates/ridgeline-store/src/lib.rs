//! Persisted user registry for the ridgeline fingerprint service.
//!
//! The registry is a single JSON document: an ordered collection of enrolled
//! users plus arbitrary forward-compatible fields. It is loaded once at
//! startup (a missing or corrupt file yields an empty registry, never a
//! startup failure) and rewritten wholesale after every mutation.
//!
//! # Consistency
//!
//! Every mutation primitive persists synchronously before returning and rolls
//! the in-memory document back if the write fails, so memory and disk never
//! diverge: a caller that sees `Ok` knows the mutation is on disk, and a
//! caller that sees `Err` knows nothing changed.
//!
//! # Examples
//!
//! ```no_run
//! use ridgeline_core::{FingerprintTemplate, UserId};
//! use ridgeline_store::{EnrolledUser, JsonStore};
//! use serde_json::json;
//!
//! # fn example() -> ridgeline_store::StoreResult<()> {
//! let mut store = JsonStore::open("./db.json");
//!
//! let user = EnrolledUser::new(
//!     UserId::generate(),
//!     json!({"name": "Alice"}),
//!     FingerprintTemplate::new(vec![1, 2, 3]),
//! );
//! store.add(user)?;
//!
//! assert_eq!(store.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod store;

pub use document::{EnrolledUser, RegistryDocument};
pub use error::{StoreError, StoreResult};
pub use store::JsonStore;
