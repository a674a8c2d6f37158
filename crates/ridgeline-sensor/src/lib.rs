//! Sensor driver abstraction layer for the ridgeline fingerprint service.
//!
//! This crate defines the contract between the session core and the physical
//! fingerprint sensor: device discovery, an opaque device handle, and the
//! asynchronous start/stop primitives for the two sensor operating modes
//! (identification against a template gallery, and one-shot enrollment).
//!
//! # Design Philosophy
//!
//! - **Async-first**: all device I/O uses native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT), no `async_trait` macro.
//! - **Closed callback vocabulary**: driver callbacks are surfaced as the
//!   [`IdentifyOutcome`] and [`EnrollProgress`] enums. Message tags outside
//!   the known set land in the retry bucket; an unknown driver message is
//!   never a hard error.
//! - **One result per wait**: [`SensorDevice::identify_event`] and
//!   [`SensorDevice::enroll_event`] each resolve exactly one driver callback,
//!   so the caller owns the restart/continue policy.
//!
//! # Mock Implementation
//!
//! Real sensor bindings are gated behind the (currently empty) `hardware-*`
//! feature flags. The [`MockSensor`] simulates a scanner for development and
//! testing: a [`MockSensorHandle`] queues finger touches programmatically and
//! the device resolves them against the active identify gallery or enroll
//! transaction.
//!
//! ```
//! use ridgeline_core::FingerprintTemplate;
//! use ridgeline_sensor::{IdentifyOutcome, MockSensor, SensorDevice};
//!
//! #[tokio::main]
//! async fn main() -> ridgeline_sensor::Result<()> {
//!     let (mut sensor, handle) = MockSensor::new();
//!
//!     let template = FingerprintTemplate::new(vec![1, 2, 3, 4]);
//!     sensor.identify_start(vec![template.clone()]).await?;
//!
//!     handle.touch(template).await?;
//!     let outcome = sensor.identify_event().await?;
//!     assert!(matches!(outcome, IdentifyOutcome::Matched { index: 0 }));
//!
//!     sensor.identify_stop().await?;
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::AnySensorDevice;
pub use error::{Result, SensorError};
pub use mock::{MockSensor, MockSensorDriver, MockSensorHandle};
pub use traits::{EnrollProgress, IdentifyOutcome, SensorDevice, SensorDriver};
pub use types::DeviceInfo;
