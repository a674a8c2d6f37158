//! Session core of the ridgeline fingerprint service.
//!
//! This crate arbitrates between the sensor's two mutually-exclusive
//! operating modes (continuous identification and one-shot enrollment)
//! while keeping the persisted user registry consistent with what the device
//! reports.
//!
//! # Architecture
//!
//! - [`SessionMachine`]: validated tri-state (`Idle` / `Identifying` /
//!   `Enrolling`); every mode change passes through it.
//! - [`ReaderController`]: actor owning the device handle, the store, the
//!   state machine and the event bus; processes registry commands strictly
//!   sequentially and keeps the identify loop re-armed.
//! - [`Registry`]: the cloneable public CRUD handle used by the transport
//!   layer; mutations queue FIFO through the controller mailbox.
//! - [`EventBus`] / [`ReaderEvent`]: broadcast notifications (`identify`,
//!   `user-add`, `user-update`, `user-delete`) with no backpressure.
//!
//! # Example
//!
//! ```no_run
//! use ridgeline_sensor::MockSensor;
//! use ridgeline_session::ReaderController;
//! use ridgeline_store::JsonStore;
//! use serde_json::json;
//!
//! # async fn example() -> ridgeline_core::Result<()> {
//! let (sensor, _sensor_handle) = MockSensor::new();
//! let store = JsonStore::open("./db.json");
//!
//! let (controller, registry) = ReaderController::new(sensor, store);
//! tokio::spawn(controller.run());
//!
//! let created = registry.add_user(json!({"name": "Alice"})).await?;
//! println!("enrolled {}", created.id);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod events;
pub mod registry;
pub mod state;

pub use controller::{ControllerConfig, ReaderController};
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus, ReaderEvent};
pub use registry::{Registry, UserView};
pub use state::{SessionMachine, SessionState, StateTransition};
