//! Reader controller: the single authority over the sensor device.
//!
//! The controller is an actor that owns the device handle, the persisted
//! registry, the session state machine and the event bus. It runs one loop
//! that races the active identify session against its command mailbox, so at
//! any instant exactly one sensor operation is outstanding and every mutation
//! observes the strict `stop identify → act → persist → restart identify`
//! ordering as straight-line code; there are no locks, and there is no
//! second writer to race against.
//!
//! ```text
//! Registry ──commands──►┌──────────────────┐──events──► EventBus
//! (HTTP, tests)         │ ReaderController │
//!                       │  SessionMachine  │◄─callbacks─ SensorDevice
//!                       │  JsonStore       │
//!                       └──────────────────┘
//! ```
//!
//! Commands queue FIFO in the mailbox: a second `add_user` issued while an
//! enrollment is in flight waits its turn instead of interleaving.

use std::time::Duration;

use ridgeline_core::constants::DEFAULT_ENROLL_TIMEOUT_SECS;
use ridgeline_core::{Error, FingerprintTemplate, Result, UserId};
use ridgeline_sensor::{EnrollProgress, IdentifyOutcome, SensorDevice};
use ridgeline_store::{EnrolledUser, JsonStore};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::events::{EventBus, ReaderEvent};
use crate::registry::{Registry, UserView};
use crate::state::{SessionMachine, SessionState};

/// Mailbox depth for queued registry commands.
const COMMAND_CAPACITY: usize = 32;

/// Registry operation forwarded to the controller actor.
#[derive(Debug)]
pub(crate) enum Command {
    GetUser {
        id: String,
        include_fingerprint: bool,
        reply: oneshot::Sender<Result<UserView>>,
    },
    ListUsers {
        include_fingerprint: bool,
        reply: oneshot::Sender<Vec<UserView>>,
    },
    AddUser {
        data: Value,
        reply: oneshot::Sender<Result<UserView>>,
    },
    UpdateUser {
        id: String,
        data: Value,
        reply: oneshot::Sender<Result<UserView>>,
    },
    DeleteUser {
        id: String,
        reply: oneshot::Sender<Result<UserView>>,
    },
}

/// Tunables for the reader controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Overall deadline for one enroll transaction. Expiry aborts the
    /// transaction, leaves the registry untouched and resumes identify.
    pub enroll_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enroll_timeout: Duration::from_secs(DEFAULT_ENROLL_TIMEOUT_SECS),
        }
    }
}

/// The sensor session controller actor.
///
/// Constructed together with its [`Registry`] handle; consumed by
/// [`run`](ReaderController::run), which is typically spawned:
///
/// ```no_run
/// use ridgeline_sensor::MockSensor;
/// use ridgeline_session::ReaderController;
/// use ridgeline_store::JsonStore;
///
/// # async fn example() {
/// let (sensor, _handle) = MockSensor::new();
/// let store = JsonStore::open("./db.json");
///
/// let (controller, registry) = ReaderController::new(sensor, store);
/// tokio::spawn(controller.run());
///
/// let users = registry.users(false).await.unwrap();
/// # }
/// ```
pub struct ReaderController<D: SensorDevice> {
    device: D,
    store: JsonStore,
    machine: SessionMachine,
    events: EventBus,
    commands: mpsc::Receiver<Command>,
    /// Ids of the gallery snapshot the active identify session was armed
    /// with, index-aligned with what the device reports back.
    snapshot: Vec<UserId>,
    config: ControllerConfig,
}

impl<D: SensorDevice> ReaderController<D> {
    /// Create a controller with default configuration.
    pub fn new(device: D, store: JsonStore) -> (Self, Registry) {
        Self::with_config(device, store, ControllerConfig::default())
    }

    /// Create a controller with explicit configuration.
    pub fn with_config(
        device: D,
        store: JsonStore,
        config: ControllerConfig,
    ) -> (Self, Registry) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let events = EventBus::new();

        let controller = Self {
            device,
            store,
            machine: SessionMachine::new(),
            events: events.clone(),
            commands: command_rx,
            snapshot: Vec::new(),
            config,
        };

        (controller, Registry::new(command_tx, events))
    }

    /// Run the controller until every [`Registry`] handle is dropped.
    ///
    /// Identification starts immediately and re-arms after every sensor
    /// callback; it only pauses inside the critical section of a mutation or
    /// after a device failure (a later mutation re-arms it).
    ///
    /// # Errors
    ///
    /// Returns an error only if the very first identify arm fails; after
    /// startup, device errors are logged and retried, never propagated.
    pub async fn run(mut self) -> Result<()> {
        self.start_identify().await?;

        loop {
            if self.machine.current() == SessionState::Identifying {
                tokio::select! {
                    command = self.commands.recv() => match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    },
                    outcome = self.device.identify_event() => {
                        self.handle_identify_outcome(outcome).await;
                    }
                }
            } else {
                match self.commands.recv().await {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                }
            }
        }

        self.stop_identify().await;
        debug!("all registry handles dropped, controller stopping");
        Ok(())
    }

    /// Arm an identify session against the current user set.
    ///
    /// Legal only from `Idle`. On device refusal the session falls back to
    /// `Idle` and the error is surfaced.
    async fn start_identify(&mut self) -> Result<()> {
        self.machine.transition_to(SessionState::Identifying)?;

        let gallery = self.store.gallery();
        let (ids, templates): (Vec<UserId>, Vec<FingerprintTemplate>) =
            gallery.into_iter().unzip();

        if let Err(err) = self.device.identify_start(templates).await {
            self.machine.transition_to(SessionState::Idle)?;
            self.snapshot.clear();
            return Err(err.into());
        }

        debug!(candidates = ids.len(), "identify session armed");
        self.snapshot = ids;
        Ok(())
    }

    /// Stop the active identify session, if any. Idempotent: from `Idle`
    /// this does nothing, so mutations can call it defensively.
    async fn stop_identify(&mut self) {
        if self.machine.current() != SessionState::Identifying {
            return;
        }

        if let Err(err) = self.device.identify_stop().await {
            warn!(%err, "identify stop reported an error");
        }
        // The session is gone either way; record it.
        self.machine
            .transition_to(SessionState::Idle)
            .expect("Identifying -> Idle is always legal");
        self.snapshot.clear();
    }

    /// Stop-and-restart so the next session sees a fresh gallery snapshot.
    ///
    /// Device refusal pauses identification until the next mutation re-arms
    /// it; it never brings the controller down.
    async fn rearm_identify(&mut self) {
        self.stop_identify().await;
        if let Err(err) = self.start_identify().await {
            warn!(%err, "could not re-arm identify, pausing identification");
        }
    }

    async fn handle_identify_outcome(
        &mut self,
        outcome: ridgeline_sensor::Result<IdentifyOutcome>,
    ) {
        match outcome {
            Ok(IdentifyOutcome::Matched { index }) => {
                self.report_match(index);
                self.rearm_identify().await;
            }
            Ok(outcome) => {
                debug!(tag = outcome.tag(), "identify pass ended without a match");
                self.rearm_identify().await;
            }
            Err(err) => {
                warn!(%err, "identify session error, pausing identification");
                self.stop_identify().await;
            }
        }
    }

    /// Resolve a matched index against the snapshot that armed the session
    /// (never against the current store order) and announce the match.
    fn report_match(&self, index: usize) {
        let Some(user_id) = self.snapshot.get(index) else {
            warn!(index, "driver reported an index outside the armed gallery");
            return;
        };

        let Some(record) = self.store.get(user_id.as_str()) else {
            warn!(user = %user_id, "matched user no longer in registry");
            return;
        };

        info!(user = %record.id, "identify succeeded");
        self.events.publish(ReaderEvent::Identify {
            user_id: record.id.clone(),
            user_data: record.data.clone(),
        });
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::GetUser {
                id,
                include_fingerprint,
                reply,
            } => {
                let result = self
                    .store
                    .get(&id)
                    .map(|record| UserView::from_record(record, include_fingerprint))
                    .ok_or(Error::UserNotFound(id));
                let _ = reply.send(result);
            }
            Command::ListUsers {
                include_fingerprint,
                reply,
            } => {
                let users = self
                    .store
                    .users()
                    .iter()
                    .map(|record| UserView::from_record(record, include_fingerprint))
                    .collect();
                let _ = reply.send(users);
            }
            Command::AddUser { data, reply } => {
                let result = self.enroll_user(data).await;
                let _ = reply.send(result);
            }
            Command::UpdateUser { id, data, reply } => {
                let result = self.update_user(&id, data).await;
                let _ = reply.send(result);
            }
            Command::DeleteUser { id, reply } => {
                let result = self.delete_user(&id).await;
                let _ = reply.send(result);
            }
        }
    }

    /// Drive one enrollment transaction to completion or failure.
    ///
    /// The registry is mutated at most once, only on terminal success, and
    /// identification resumes whatever the outcome.
    async fn enroll_user(&mut self, data: Value) -> Result<UserView> {
        self.stop_identify().await;
        self.machine.transition_to(SessionState::Enrolling)?;

        let captured = self.drive_enroll().await;

        // The device session ends before the registry is touched, so a crash
        // between the two cannot leave a half-open sensor transaction.
        if let Err(err) = self.device.enroll_stop().await {
            warn!(%err, "enroll stop reported an error");
        }
        self.machine
            .transition_to(SessionState::Idle)
            .expect("Enrolling -> Idle is always legal");

        let outcome = match captured {
            Ok(template) => self.persist_enrollment(data, template),
            Err(err) => {
                warn!(%err, "enrollment did not complete");
                Err(err)
            }
        };

        self.rearm_identify().await;
        outcome
    }

    /// Wait out the enroll callback sequence under the configured deadline.
    ///
    /// Intermediate stages have no observable effect; only a terminal
    /// callback (or the deadline) ends the wait.
    async fn drive_enroll(&mut self) -> Result<FingerprintTemplate> {
        self.device.enroll_start().await.map_err(Error::from)?;

        let deadline = tokio::time::Instant::now() + self.config.enroll_timeout;
        loop {
            let progress = tokio::time::timeout_at(deadline, self.device.enroll_event())
                .await
                .map_err(|_| Error::EnrollTimeout {
                    seconds: self.config.enroll_timeout.as_secs(),
                })?
                .map_err(Error::from)?;

            match progress {
                EnrollProgress::Completed { template } => return Ok(template),
                EnrollProgress::Failed { message } => return Err(Error::EnrollFailed(message)),
                EnrollProgress::StagePassed => debug!("enroll stage captured"),
                EnrollProgress::Retry { message } => debug!(%message, "enroll stage retry"),
            }
        }
    }

    fn persist_enrollment(
        &mut self,
        data: Value,
        template: FingerprintTemplate,
    ) -> Result<UserView> {
        let record = EnrolledUser::new(UserId::generate(), data, template);
        let view = UserView::from_record(&record, false);

        self.store.add(record.clone())?;

        info!(user = %record.id, "user enrolled");
        self.events.publish(ReaderEvent::UserAdd {
            user_id: record.id,
            user_data: record.data,
        });
        Ok(view)
    }

    async fn update_user(&mut self, id: &str, data: Value) -> Result<UserView> {
        self.stop_identify().await;

        let outcome = match self.store.update_data(id, data) {
            Ok(record) => {
                info!(user = %record.id, "user updated");
                self.events.publish(ReaderEvent::UserUpdate {
                    user_id: record.id.clone(),
                    user_data: record.data.clone(),
                });
                Ok(UserView::from_record(&record, false))
            }
            Err(err) => Err(err.into()),
        };

        self.rearm_identify().await;
        outcome
    }

    async fn delete_user(&mut self, id: &str) -> Result<UserView> {
        self.stop_identify().await;

        let outcome = match self.store.remove(id) {
            Ok(record) => {
                info!(user = %record.id, "user deleted");
                self.events.publish(ReaderEvent::UserDelete {
                    user_id: record.id.clone(),
                });
                Ok(UserView::from_record(&record, false))
            }
            Err(err) => Err(err.into()),
        };

        // Restart drops the deleted template from the active match set.
        self.rearm_identify().await;
        outcome
    }
}
