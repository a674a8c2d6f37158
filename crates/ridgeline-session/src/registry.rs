//! Public registry API surface.
//!
//! [`Registry`] is the handle the transport layer (and tests) talk to. Every
//! operation is forwarded as a command to the controller actor and answered
//! over a oneshot channel, which serializes all mutations through a single
//! writer: a second `add_user` issued while an enrollment is in flight simply
//! queues behind it.

use ridgeline_core::{Error, FingerprintTemplate, Result, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::controller::Command;
use crate::events::{EventBus, ReaderEvent};

/// A user record as returned by the public API.
///
/// The fingerprint template is sensitive: it is only populated when the
/// caller explicitly asked for it, and an absent template is omitted from the
/// serialized form entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// System-generated unique identifier.
    pub id: UserId,

    /// Caller-supplied metadata.
    pub data: Value,

    /// Biometric template; present only when explicitly requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<FingerprintTemplate>,

    /// Record creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Record last modification timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserView {
    /// Build a view of a stored record, filtering the template per
    /// `include_fingerprint`.
    pub fn from_record(record: &ridgeline_store::EnrolledUser, include_fingerprint: bool) -> Self {
        Self {
            id: record.id.clone(),
            data: record.data.clone(),
            fingerprint: include_fingerprint.then(|| record.fingerprint.clone()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Cloneable handle to a running reader controller.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: mpsc::Sender<Command>,
    events: EventBus,
}

impl Registry {
    pub(crate) fn new(commands: mpsc::Sender<Command>, events: EventBus) -> Self {
        Self { commands, events }
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the id is unknown; `ControllerGone` if the
    /// controller task has stopped.
    pub async fn get_user(&self, id: &str, include_fingerprint: bool) -> Result<UserView> {
        let (reply, response) = oneshot::channel();
        self.send(Command::GetUser {
            id: id.to_string(),
            include_fingerprint,
            reply,
        })
        .await?;
        response.await.map_err(|_| Error::ControllerGone)?
    }

    /// All users in store order.
    pub async fn users(&self, include_fingerprint: bool) -> Result<Vec<UserView>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::ListUsers {
            include_fingerprint,
            reply,
        })
        .await?;
        response.await.map_err(|_| Error::ControllerGone)
    }

    /// Enroll a new user with the given metadata.
    ///
    /// Resolves once the enrollment transaction completes: the sensor
    /// captured a template and the record was persisted, or the transaction
    /// failed and the registry is untouched. Concurrent calls queue FIFO.
    ///
    /// # Errors
    ///
    /// `EnrollFailed` / `EnrollTimeout` on transaction failure,
    /// `Persistence` if the completed record could not be written.
    pub async fn add_user(&self, data: Value) -> Result<UserView> {
        let (reply, response) = oneshot::channel();
        self.send(Command::AddUser { data, reply }).await?;
        response.await.map_err(|_| Error::ControllerGone)?
    }

    /// Replace a user's metadata. The fingerprint is untouched.
    pub async fn update_user(&self, id: &str, data: Value) -> Result<UserView> {
        let (reply, response) = oneshot::channel();
        self.send(Command::UpdateUser {
            id: id.to_string(),
            data,
            reply,
        })
        .await?;
        response.await.map_err(|_| Error::ControllerGone)?
    }

    /// Remove a user and drop their template from the active match set.
    pub async fn delete_user(&self, id: &str) -> Result<UserView> {
        let (reply, response) = oneshot::channel();
        self.send(Command::DeleteUser {
            id: id.to_string(),
            reply,
        })
        .await?;
        response.await.map_err(|_| Error::ControllerGone)?
    }

    /// Subscribe to reader events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ControllerGone)
    }
}
