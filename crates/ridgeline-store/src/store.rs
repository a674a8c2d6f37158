//! JSON-file backed registry store.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use ridgeline_core::{FingerprintTemplate, UserId};
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{EnrolledUser, RegistryDocument};
use crate::error::{StoreError, StoreResult};

/// Path-configured registry store with synchronous whole-document writes.
///
/// Mutation primitives (`add`, `update_data`, `remove`) persist before
/// returning; a failed write rolls the in-memory document back and surfaces
/// the error, so the caller never observes memory and disk disagreeing.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    doc: RegistryDocument,
}

impl JsonStore {
    /// Open the registry at `path`.
    ///
    /// A missing file starts an empty registry silently; an unreadable or
    /// corrupt file starts an empty registry with a warning. Neither is fatal.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(path = %path.display(), %err, "corrupt registry document, starting empty");
                    RegistryDocument::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry document yet, starting empty");
                RegistryDocument::default()
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot read registry document, starting empty");
                RegistryDocument::default()
            }
        };

        Self { path, doc }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of enrolled users.
    pub fn len(&self) -> usize {
        self.doc.users.len()
    }

    /// Whether the registry holds no users.
    pub fn is_empty(&self) -> bool {
        self.doc.users.is_empty()
    }

    /// All users in enrollment order.
    pub fn users(&self) -> &[EnrolledUser] {
        &self.doc.users
    }

    /// Look up a user by id.
    pub fn get(&self, id: &str) -> Option<&EnrolledUser> {
        self.doc.users.iter().find(|user| user.id.as_str() == id)
    }

    /// Ordered `(id, template)` snapshot for arming an identify session.
    ///
    /// The position of each entry is the index the driver reports back on a
    /// match, so a callback index must always be resolved against the exact
    /// snapshot that armed its session.
    pub fn gallery(&self) -> Vec<(UserId, FingerprintTemplate)> {
        self.doc
            .users
            .iter()
            .map(|user| (user.id.clone(), user.fingerprint.clone()))
            .collect()
    }

    /// Append a newly-enrolled user and persist.
    ///
    /// # Errors
    ///
    /// Returns the write error with the in-memory document rolled back; the
    /// registry is unchanged in that case.
    pub fn add(&mut self, user: EnrolledUser) -> StoreResult<()> {
        self.doc.users.push(user);
        if let Err(err) = self.save() {
            self.doc.users.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Replace a user's metadata (the fingerprint is untouched) and persist.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown id, or the write error with the
    /// previous metadata restored.
    pub fn update_data(&mut self, id: &str, data: Value) -> StoreResult<EnrolledUser> {
        let index = self
            .doc
            .users
            .iter()
            .position(|user| user.id.as_str() == id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;

        let user = &mut self.doc.users[index];
        let previous_data = std::mem::replace(&mut user.data, data);
        let previous_updated_at = user.updated_at;
        user.updated_at = Utc::now();

        if let Err(err) = self.save() {
            let user = &mut self.doc.users[index];
            user.data = previous_data;
            user.updated_at = previous_updated_at;
            return Err(err);
        }

        Ok(self.doc.users[index].clone())
    }

    /// Remove a user and persist.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown id, or the write error with the
    /// record reinserted at its original position.
    pub fn remove(&mut self, id: &str) -> StoreResult<EnrolledUser> {
        let index = self
            .doc
            .users
            .iter()
            .position(|user| user.id.as_str() == id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;

        let user = self.doc.users.remove(index);

        if let Err(err) = self.save() {
            self.doc.users.insert(index, user);
            return Err(err);
        }

        Ok(user)
    }

    /// Rewrite the whole document to disk.
    pub fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(&self.doc)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
