//! Enum wrapper for sensor device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) are not object-safe, so
//! `Box<dyn SensorDevice>` is not available. This enum provides concrete type
//! dispatch at compile time instead: zero-cost, type-safe, and open to new
//! hardware variants behind feature flags.

use ridgeline_core::FingerprintTemplate;

use crate::error::Result;
use crate::mock::MockSensor;
use crate::traits::{EnrollProgress, IdentifyOutcome, SensorDevice};
use crate::types::DeviceInfo;

/// Enum wrapper for fingerprint sensor dispatch.
///
/// Real hardware bindings (libfprint, vendor USB drivers) plug in as new
/// variants gated behind the `hardware-*` feature flags.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySensorDevice {
    /// Mock sensor for development and testing.
    Mock(MockSensor),
}

impl SensorDevice for AnySensorDevice {
    async fn identify_start(&mut self, gallery: Vec<FingerprintTemplate>) -> Result<()> {
        match self {
            Self::Mock(device) => device.identify_start(gallery).await,
        }
    }

    async fn identify_event(&mut self) -> Result<IdentifyOutcome> {
        match self {
            Self::Mock(device) => device.identify_event().await,
        }
    }

    async fn identify_stop(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.identify_stop().await,
        }
    }

    async fn enroll_start(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.enroll_start().await,
        }
    }

    async fn enroll_event(&mut self) -> Result<EnrollProgress> {
        match self {
            Self::Mock(device) => device.enroll_event().await,
        }
    }

    async fn enroll_stop(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.enroll_stop().await,
        }
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.device_info().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_through_wrapper() {
        let (sensor, handle) = MockSensor::new();
        let mut any_sensor = AnySensorDevice::Mock(sensor);

        any_sensor.identify_start(Vec::new()).await.unwrap();
        handle
            .touch(FingerprintTemplate::new(vec![1, 2, 3]))
            .await
            .unwrap();

        let outcome = any_sensor.identify_event().await.unwrap();
        assert_eq!(outcome, IdentifyOutcome::NotMatched);

        any_sensor.identify_stop().await.unwrap();
    }
}
