//! Mock fingerprint sensor for testing and development.
//!
//! This module simulates a fingerprint scanner that can be driven
//! programmatically without physical hardware: a [`MockSensorHandle`] queues
//! finger touches (or driver faults), and the [`MockSensor`] resolves each
//! touch against whatever session is active: gallery matching during
//! identify, stage counting during enroll.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ridgeline_core::FingerprintTemplate;
use tokio::sync::mpsc;

use crate::devices::AnySensorDevice;
use crate::error::{Result, SensorError};
use crate::traits::{EnrollProgress, IdentifyOutcome, SensorDevice, SensorDriver};
use crate::types::DeviceInfo;

/// Default enroll stage count for the mock sensor.
///
/// Real scanners typically require several touches per enrollment; the mock
/// defaults to one so tests stay short. Use [`MockSensor::with_stages`] to
/// simulate multi-stage hardware.
pub const DEFAULT_ENROLL_STAGES: u8 = 1;

const DEFAULT_SENSOR_NAME: &str = "Mock Fingerprint Sensor";

/// A simulated finger-on-scanner event queued by the handle.
#[derive(Debug, Clone)]
enum Touch {
    /// A finger with the given template touched the scanner.
    Print(FingerprintTemplate),

    /// The driver reported the given message tag instead of a capture.
    Fault(String),
}

/// Active mode of the mock device.
#[derive(Debug)]
enum Mode {
    Idle,
    Identify { gallery: Vec<FingerprintTemplate> },
    Enroll { stages_done: u8 },
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Identify { .. } => "Identifying",
            Mode::Enroll { .. } => "Enrolling",
        }
    }
}

/// Counters shared with the handle for test assertions.
#[derive(Debug, Default)]
struct Counters {
    identify_sessions: u64,
    enroll_sessions: u64,
    last_gallery_len: usize,
}

/// Mock fingerprint sensor.
///
/// # Examples
///
/// ```
/// use ridgeline_core::FingerprintTemplate;
/// use ridgeline_sensor::{IdentifyOutcome, MockSensor, SensorDevice};
///
/// #[tokio::main]
/// async fn main() -> ridgeline_sensor::Result<()> {
///     let (mut sensor, handle) = MockSensor::new();
///
///     let enrolled = FingerprintTemplate::new(vec![1, 2, 3]);
///     sensor.identify_start(vec![enrolled.clone()]).await?;
///
///     handle.touch(enrolled).await?;
///     assert!(sensor.identify_event().await?.is_match());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSensor {
    touch_rx: mpsc::Receiver<Touch>,
    mode: Mode,
    stages_required: u8,
    name: String,
    counters: Arc<Mutex<Counters>>,
}

impl MockSensor {
    /// Create a mock sensor with the default name and single-stage enrollment.
    pub fn new() -> (Self, MockSensorHandle) {
        Self::with_options(DEFAULT_SENSOR_NAME, DEFAULT_ENROLL_STAGES)
    }

    /// Create a mock sensor with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockSensorHandle) {
        Self::with_options(name, DEFAULT_ENROLL_STAGES)
    }

    /// Create a mock sensor that requires `stages` touches per enrollment.
    pub fn with_stages(stages: u8) -> (Self, MockSensorHandle) {
        Self::with_options(DEFAULT_SENSOR_NAME, stages)
    }

    /// Create a mock sensor with a custom name and enroll stage count.
    pub fn with_options(name: impl Into<String>, stages: u8) -> (Self, MockSensorHandle) {
        let name = name.into();
        let (touch_tx, touch_rx) = mpsc::channel(32);
        let counters = Arc::new(Mutex::new(Counters::default()));

        let sensor = Self {
            touch_rx,
            mode: Mode::Idle,
            stages_required: stages.max(1),
            name: name.clone(),
            counters: Arc::clone(&counters),
        };

        let handle = MockSensorHandle {
            touch_tx,
            counters,
            name,
        };

        (sensor, handle)
    }

    async fn next_touch(&mut self) -> Result<Touch> {
        self.touch_rx
            .recv()
            .await
            .ok_or_else(|| SensorError::disconnected(self.name.clone()))
    }

    fn require_idle(&self, operation: &str) -> Result<()> {
        match self.mode {
            Mode::Idle => Ok(()),
            _ => Err(SensorError::invalid_operation(operation, self.mode.name())),
        }
    }
}

impl SensorDevice for MockSensor {
    async fn identify_start(&mut self, gallery: Vec<FingerprintTemplate>) -> Result<()> {
        self.require_idle("identify_start")?;

        {
            let mut counters = self.counters.lock().expect("counter lock poisoned");
            counters.identify_sessions += 1;
            counters.last_gallery_len = gallery.len();
        }

        self.mode = Mode::Identify { gallery };
        Ok(())
    }

    async fn identify_event(&mut self) -> Result<IdentifyOutcome> {
        if !matches!(self.mode, Mode::Identify { .. }) {
            return Err(SensorError::invalid_operation(
                "identify_event",
                self.mode.name(),
            ));
        }

        let touch = self.next_touch().await?;
        let Mode::Identify { gallery } = &self.mode else {
            unreachable!("mode checked above");
        };

        Ok(match touch {
            Touch::Print(template) => {
                // Template comparison is constant-time (FingerprintTemplate::eq)
                match gallery.iter().position(|candidate| *candidate == template) {
                    Some(index) => IdentifyOutcome::Matched { index },
                    None => IdentifyOutcome::NotMatched,
                }
            }
            Touch::Fault(message) => IdentifyOutcome::from_callback(&message, None),
        })
    }

    async fn identify_stop(&mut self) -> Result<()> {
        if matches!(self.mode, Mode::Identify { .. }) {
            self.mode = Mode::Idle;
        }
        Ok(())
    }

    async fn enroll_start(&mut self) -> Result<()> {
        self.require_idle("enroll_start")?;

        self.counters
            .lock()
            .expect("counter lock poisoned")
            .enroll_sessions += 1;

        self.mode = Mode::Enroll { stages_done: 0 };
        Ok(())
    }

    async fn enroll_event(&mut self) -> Result<EnrollProgress> {
        if !matches!(self.mode, Mode::Enroll { .. }) {
            return Err(SensorError::invalid_operation(
                "enroll_event",
                self.mode.name(),
            ));
        }

        let touch = self.next_touch().await?;
        let Mode::Enroll { stages_done } = &mut self.mode else {
            unreachable!("mode checked above");
        };

        Ok(match touch {
            Touch::Print(template) => {
                *stages_done += 1;
                if *stages_done >= self.stages_required {
                    EnrollProgress::Completed { template }
                } else {
                    EnrollProgress::StagePassed
                }
            }
            Touch::Fault(message) => EnrollProgress::from_callback(&message, None),
        })
    }

    async fn enroll_stop(&mut self) -> Result<()> {
        if matches!(self.mode, Mode::Enroll { .. }) {
            self.mode = Mode::Idle;
        }
        Ok(())
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Fingerprint Sensor v1.0")
            .with_firmware_version("1.0.0"))
    }
}

/// Handle for driving a mock sensor from tests or an emulator shell.
///
/// Cloneable; all clones feed the same device.
#[derive(Debug, Clone)]
pub struct MockSensorHandle {
    touch_tx: mpsc::Sender<Touch>,
    counters: Arc<Mutex<Counters>>,
    name: String,
}

impl MockSensorHandle {
    /// Simulate a finger with the given template touching the scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor has been dropped.
    pub async fn touch(&self, template: FingerprintTemplate) -> Result<()> {
        self.touch_tx
            .send(Touch::Print(template))
            .await
            .map_err(|_| SensorError::disconnected(self.name.clone()))
    }

    /// Simulate the driver reporting `message` instead of a capture.
    ///
    /// The message is classified by the active session: for example
    /// `identify-failed` becomes a session-ending identify error, while an
    /// unrecognized tag becomes a retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor has been dropped.
    pub async fn fault(&self, message: impl Into<String>) -> Result<()> {
        self.touch_tx
            .send(Touch::Fault(message.into()))
            .await
            .map_err(|_| SensorError::disconnected(self.name.clone()))
    }

    /// Number of identify sessions armed so far.
    pub fn identify_sessions(&self) -> u64 {
        self.counters
            .lock()
            .expect("counter lock poisoned")
            .identify_sessions
    }

    /// Number of enroll transactions armed so far.
    pub fn enroll_sessions(&self) -> u64 {
        self.counters
            .lock()
            .expect("counter lock poisoned")
            .enroll_sessions
    }

    /// Gallery size of the most recently armed identify session.
    pub fn last_gallery_len(&self) -> usize {
        self.counters
            .lock()
            .expect("counter lock poisoned")
            .last_gallery_len
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Mock sensor driver: a fixed device list whose handles are retained for
/// later retrieval, so tests and the emulated server can drive devices they
/// did not open themselves.
#[derive(Debug)]
pub struct MockSensorDriver {
    devices: Vec<String>,
    stages: u8,
    handles: Mutex<HashMap<String, MockSensorHandle>>,
}

impl MockSensorDriver {
    /// Create a driver exposing the default device.
    pub fn new() -> Self {
        Self::with_devices(vec![
            ridgeline_core::constants::DEFAULT_DEVICE_ID.to_string(),
        ])
    }

    /// Create a driver exposing the given device identifiers.
    pub fn with_devices(devices: Vec<String>) -> Self {
        Self {
            devices,
            stages: DEFAULT_ENROLL_STAGES,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Require `stages` touches per enrollment on devices opened later.
    pub fn with_stages(mut self, stages: u8) -> Self {
        self.stages = stages;
        self
    }

    /// Get the drive handle of an opened device.
    pub fn handle_for(&self, device_id: &str) -> Option<MockSensorHandle> {
        self.handles
            .lock()
            .expect("handle lock poisoned")
            .get(device_id)
            .cloned()
    }
}

impl Default for MockSensorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for MockSensorDriver {
    fn discover_devices(&self) -> Result<Vec<String>> {
        if self.devices.is_empty() {
            return Err(SensorError::NoDevicesFound);
        }
        Ok(self.devices.clone())
    }

    fn open_device(&self, device_id: &str) -> Result<AnySensorDevice> {
        if !self.devices.iter().any(|d| d == device_id) {
            return Err(SensorError::DeviceNotFound(device_id.to_string()));
        }

        let (sensor, handle) = MockSensor::with_options(device_id, self.stages);
        self.handles
            .lock()
            .expect("handle lock poisoned")
            .insert(device_id.to_string(), handle);

        Ok(AnySensorDevice::Mock(sensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(bytes: &[u8]) -> FingerprintTemplate {
        FingerprintTemplate::new(bytes.to_vec())
    }

    #[tokio::test]
    async fn test_identify_match_returns_snapshot_index() {
        let (mut sensor, handle) = MockSensor::new();

        let gallery = vec![template(&[1]), template(&[2]), template(&[3])];
        sensor.identify_start(gallery).await.unwrap();

        handle.touch(template(&[2])).await.unwrap();
        let outcome = sensor.identify_event().await.unwrap();
        assert_eq!(outcome, IdentifyOutcome::Matched { index: 1 });
    }

    #[tokio::test]
    async fn test_identify_unknown_finger() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.identify_start(vec![template(&[1])]).await.unwrap();
        handle.touch(template(&[9])).await.unwrap();

        assert_eq!(
            sensor.identify_event().await.unwrap(),
            IdentifyOutcome::NotMatched
        );
    }

    #[tokio::test]
    async fn test_identify_with_empty_gallery() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.identify_start(Vec::new()).await.unwrap();
        assert_eq!(handle.last_gallery_len(), 0);

        handle.touch(template(&[1])).await.unwrap();
        assert_eq!(
            sensor.identify_event().await.unwrap(),
            IdentifyOutcome::NotMatched
        );
    }

    #[tokio::test]
    async fn test_identify_fault_classification() {
        let (mut sensor, handle) = MockSensor::new();
        sensor.identify_start(Vec::new()).await.unwrap();

        handle.fault("identify-failed").await.unwrap();
        assert!(matches!(
            sensor.identify_event().await.unwrap(),
            IdentifyOutcome::Failed { .. }
        ));

        handle.fault("smudged-finger").await.unwrap();
        assert!(matches!(
            sensor.identify_event().await.unwrap(),
            IdentifyOutcome::Retry { .. }
        ));
    }

    #[tokio::test]
    async fn test_identify_start_counts_sessions() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.identify_start(vec![template(&[1])]).await.unwrap();
        sensor.identify_stop().await.unwrap();
        sensor.identify_start(Vec::new()).await.unwrap();

        assert_eq!(handle.identify_sessions(), 2);
        assert_eq!(handle.last_gallery_len(), 0);
    }

    #[tokio::test]
    async fn test_identify_requires_idle() {
        let (mut sensor, _handle) = MockSensor::new();

        sensor.identify_start(Vec::new()).await.unwrap();
        let result = sensor.identify_start(Vec::new()).await;
        assert!(matches!(
            result,
            Err(SensorError::InvalidOperation { .. })
        ));
    }

    #[tokio::test]
    async fn test_identify_stop_is_idempotent() {
        let (mut sensor, _handle) = MockSensor::new();

        sensor.identify_stop().await.unwrap();
        sensor.identify_start(Vec::new()).await.unwrap();
        sensor.identify_stop().await.unwrap();
        sensor.identify_stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_enroll_single_stage() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.enroll_start().await.unwrap();
        handle.touch(template(&[7, 7])).await.unwrap();

        let progress = sensor.enroll_event().await.unwrap();
        assert_eq!(
            progress,
            EnrollProgress::Completed {
                template: template(&[7, 7])
            }
        );

        sensor.enroll_stop().await.unwrap();
        assert_eq!(handle.enroll_sessions(), 1);
    }

    #[tokio::test]
    async fn test_enroll_multi_stage() {
        let (mut sensor, handle) = MockSensor::with_stages(3);

        sensor.enroll_start().await.unwrap();

        for _ in 0..2 {
            handle.touch(template(&[5])).await.unwrap();
            assert_eq!(
                sensor.enroll_event().await.unwrap(),
                EnrollProgress::StagePassed
            );
        }

        handle.touch(template(&[5])).await.unwrap();
        assert!(matches!(
            sensor.enroll_event().await.unwrap(),
            EnrollProgress::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_enroll_fault_is_terminal_failure() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.enroll_start().await.unwrap();
        handle.fault("enroll-failed").await.unwrap();

        let progress = sensor.enroll_event().await.unwrap();
        assert!(matches!(progress, EnrollProgress::Failed { .. }));
        assert!(progress.is_terminal());
    }

    #[tokio::test]
    async fn test_enroll_requires_idle() {
        let (mut sensor, _handle) = MockSensor::new();

        sensor.identify_start(Vec::new()).await.unwrap();
        let result = sensor.enroll_start().await;
        assert!(matches!(
            result,
            Err(SensorError::InvalidOperation { .. })
        ));
    }

    #[tokio::test]
    async fn test_event_without_session_is_error() {
        let (mut sensor, _handle) = MockSensor::new();

        assert!(sensor.identify_event().await.is_err());
        assert!(sensor.enroll_event().await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_disconnects() {
        let (mut sensor, handle) = MockSensor::new();

        sensor.identify_start(Vec::new()).await.unwrap();
        drop(handle);

        assert!(matches!(
            sensor.identify_event().await,
            Err(SensorError::Disconnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_device_info() {
        let (sensor, _handle) = MockSensor::with_name("Test Sensor");

        let info = sensor.device_info().await.unwrap();
        assert_eq!(info.name, "Test Sensor");
        assert_eq!(info.firmware_version, Some("1.0.0".to_string()));
    }

    #[test]
    fn test_driver_discovery() {
        let driver = MockSensorDriver::new();
        let devices = driver.discover_devices().unwrap();
        assert_eq!(devices.len(), 1);

        let empty = MockSensorDriver::with_devices(Vec::new());
        assert!(matches!(
            empty.discover_devices(),
            Err(SensorError::NoDevicesFound)
        ));
    }

    #[tokio::test]
    async fn test_driver_open_retains_handle() {
        let driver = MockSensorDriver::with_devices(vec!["sensor-a".to_string()]);

        assert!(driver.handle_for("sensor-a").is_none());

        let mut device = driver.open_device("sensor-a").unwrap();
        let handle = driver.handle_for("sensor-a").unwrap();

        device.identify_start(Vec::new()).await.unwrap();
        handle.touch(template(&[1])).await.unwrap();
        assert_eq!(
            device.identify_event().await.unwrap(),
            IdentifyOutcome::NotMatched
        );
    }

    #[test]
    fn test_driver_unknown_device() {
        let driver = MockSensorDriver::new();
        assert!(matches!(
            driver.open_device("missing"),
            Err(SensorError::DeviceNotFound(_))
        ));
    }
}
