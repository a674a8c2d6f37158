//! Sensor device trait definitions.
//!
//! These traits establish the contract between the session core and the
//! fingerprint sensor driver. A driver exposes discovery plus an opaque
//! device handle; a device exposes asynchronous start/wait/stop primitives
//! for its two mutually-exclusive operating modes, identification and
//! enrollment. The session core, not the driver, owns the discipline that
//! at most one operation is outstanding at a time.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use ridgeline_core::FingerprintTemplate;
use ridgeline_core::constants::{
    TAG_ENROLL_COMPLETED, TAG_ENROLL_FAILED, TAG_ENROLL_STAGE_PASSED, TAG_IDENTIFY_FAILED,
    TAG_IDENTIFY_NOT_MATCHED, TAG_IDENTIFY_SUCCEEDED,
};

use crate::devices::AnySensorDevice;
use crate::error::Result;
use crate::types::DeviceInfo;

/// Outcome of a single identify callback.
///
/// Drivers report one callback per identify session; the caller decides
/// whether to re-arm. The vocabulary is closed: [`IdentifyOutcome::from_callback`]
/// maps any message tag outside the known set into the retry bucket, per the
/// policy that only an explicit success tag may mutate observable state.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyOutcome {
    /// A gallery entry matched. `index` points into the gallery passed to
    /// the `identify_start` call that opened this session, never a later one.
    Matched { index: usize },

    /// The scan completed but no gallery entry matched.
    NotMatched,

    /// Transient problem (short swipe, smudge, unknown tag); scan again.
    Retry { message: String },

    /// The driver reported a session-ending error.
    Failed { message: String },
}

impl IdentifyOutcome {
    /// Classify a raw driver callback `(message, index)` pair.
    ///
    /// Only [`TAG_IDENTIFY_SUCCEEDED`] with a valid index produces a match.
    /// A success tag missing its index is malformed driver output and is
    /// treated as a retry, not a match and not an error.
    pub fn from_callback(message: &str, index: Option<usize>) -> Self {
        match (message, index) {
            (TAG_IDENTIFY_SUCCEEDED, Some(index)) => Self::Matched { index },
            (TAG_IDENTIFY_SUCCEEDED, None) => Self::Retry {
                message: "identify-succeeded without gallery index".to_string(),
            },
            (TAG_IDENTIFY_NOT_MATCHED, _) => Self::NotMatched,
            (TAG_IDENTIFY_FAILED, _) => Self::Failed {
                message: message.to_string(),
            },
            (other, _) => Self::Retry {
                message: other.to_string(),
            },
        }
    }

    /// The wire tag this outcome corresponds to.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Matched { .. } => TAG_IDENTIFY_SUCCEEDED,
            Self::NotMatched => TAG_IDENTIFY_NOT_MATCHED,
            Self::Retry { .. } => ridgeline_core::constants::TAG_IDENTIFY_RETRY,
            Self::Failed { .. } => TAG_IDENTIFY_FAILED,
        }
    }

    /// Whether this outcome is a successful match.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Progress report from a single enroll callback.
///
/// Enrollment is a multi-stage transaction: intermediate stages carry no
/// observable effect, and only [`EnrollProgress::Completed`] yields a
/// template. Unknown tags land in the retry bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollProgress {
    /// The transaction finished; the sensor produced the final template.
    Completed { template: FingerprintTemplate },

    /// One stage captured successfully; more touches are required.
    StagePassed,

    /// Transient problem (short swipe, unknown tag); repeat the stage.
    Retry { message: String },

    /// The driver terminally rejected or aborted the transaction.
    Failed { message: String },
}

impl EnrollProgress {
    /// Classify a raw driver callback `(message, template)` pair.
    ///
    /// A completion tag without a template is terminal breakage: surfacing it
    /// as [`EnrollProgress::Failed`] keeps the no-partial-records invariant.
    pub fn from_callback(message: &str, template: Option<FingerprintTemplate>) -> Self {
        match (message, template) {
            (TAG_ENROLL_COMPLETED, Some(template)) => Self::Completed { template },
            (TAG_ENROLL_COMPLETED, None) => Self::Failed {
                message: "enroll-completed without template".to_string(),
            },
            (TAG_ENROLL_STAGE_PASSED, _) => Self::StagePassed,
            (TAG_ENROLL_FAILED, _) => Self::Failed {
                message: message.to_string(),
            },
            (other, _) => Self::Retry {
                message: other.to_string(),
            },
        }
    }

    /// The wire tag this progress report corresponds to.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Completed { .. } => TAG_ENROLL_COMPLETED,
            Self::StagePassed => TAG_ENROLL_STAGE_PASSED,
            Self::Retry { .. } => ridgeline_core::constants::TAG_ENROLL_RETRY,
            Self::Failed { .. } => TAG_ENROLL_FAILED,
        }
    }

    /// Whether this report ends the transaction (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Fingerprint sensor device abstraction.
///
/// A device is in exactly one of three modes at any instant: idle, running an
/// identify session, or running an enroll transaction. `*_start` arms a mode,
/// `*_event` waits for the next driver callback of the active mode, and
/// `*_stop` returns the device to idle. Stopping an already-idle device is a
/// no-op so that callers can stop defensively.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future` (Edition 2024 RPITIT). For dynamic dispatch use the
/// [`AnySensorDevice`](crate::devices::AnySensorDevice) enum wrapper.
///
/// # Cancel Safety
///
/// `identify_event` and `enroll_event` must be cancel-safe: the session core
/// races them against its command mailbox in `tokio::select!`, and a dropped
/// wait must not lose or duplicate a callback.
pub trait SensorDevice: Send + Sync {
    /// Arm an identify session against the given template gallery.
    ///
    /// The gallery may be empty; the session then runs without candidates
    /// and can only report non-match outcomes.
    ///
    /// # Errors
    ///
    /// Returns an error if a session or transaction is already active, or if
    /// the device is disconnected.
    async fn identify_start(&mut self, gallery: Vec<FingerprintTemplate>) -> Result<()>;

    /// Wait for the next callback of the active identify session.
    ///
    /// # Errors
    ///
    /// Returns an error if no identify session is active or the device is
    /// disconnected.
    async fn identify_event(&mut self) -> Result<IdentifyOutcome>;

    /// Stop the identify session and return the device to idle.
    ///
    /// Resolves once the driver confirms the stop. Idempotent.
    async fn identify_stop(&mut self) -> Result<()>;

    /// Arm an enroll transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a session or transaction is already active, or if
    /// the device is disconnected.
    async fn enroll_start(&mut self) -> Result<()>;

    /// Wait for the next callback of the active enroll transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no enroll transaction is active or the device is
    /// disconnected.
    async fn enroll_event(&mut self) -> Result<EnrollProgress>;

    /// Stop the enroll transaction and return the device to idle.
    ///
    /// Resolves once the driver confirms the stop. Idempotent.
    async fn enroll_stop(&mut self) -> Result<()>;

    /// Get device information.
    async fn device_info(&self) -> Result<DeviceInfo>;
}

/// Fingerprint sensor driver: discovery and device opening.
pub trait SensorDriver: Send + Sync {
    /// List the identifiers of all attached fingerprint devices.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::NoDevicesFound`](crate::SensorError::NoDevicesFound)
    /// when no devices are attached; fatal at startup.
    fn discover_devices(&self) -> Result<Vec<String>>;

    /// Open the named device and hand out its (sole) handle.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::DeviceNotFound`](crate::SensorError::DeviceNotFound)
    /// when the identifier does not match a discovered device; fatal at
    /// startup.
    fn open_device(&self, device_id: &str) -> Result<AnySensorDevice>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_callback_classification() {
        assert_eq!(
            IdentifyOutcome::from_callback("identify-succeeded", Some(3)),
            IdentifyOutcome::Matched { index: 3 }
        );
        assert_eq!(
            IdentifyOutcome::from_callback("identify-not-matched", None),
            IdentifyOutcome::NotMatched
        );
        assert!(matches!(
            IdentifyOutcome::from_callback("identify-failed", None),
            IdentifyOutcome::Failed { .. }
        ));
    }

    #[test]
    fn test_identify_success_without_index_is_retry() {
        let outcome = IdentifyOutcome::from_callback("identify-succeeded", None);
        assert!(matches!(outcome, IdentifyOutcome::Retry { .. }));
        assert!(!outcome.is_match());
    }

    #[test]
    fn test_unknown_identify_tag_is_retry_not_error() {
        let outcome = IdentifyOutcome::from_callback("finger-too-short", None);
        assert_eq!(
            outcome,
            IdentifyOutcome::Retry {
                message: "finger-too-short".to_string()
            }
        );
    }

    #[test]
    fn test_identify_tag_round_trip() {
        let outcome = IdentifyOutcome::Matched { index: 0 };
        assert_eq!(outcome.tag(), "identify-succeeded");
        assert_eq!(IdentifyOutcome::NotMatched.tag(), "identify-not-matched");
    }

    #[test]
    fn test_enroll_callback_classification() {
        let template = FingerprintTemplate::new(vec![9, 9, 9]);
        assert_eq!(
            EnrollProgress::from_callback("enroll-completed", Some(template.clone())),
            EnrollProgress::Completed { template }
        );
        assert_eq!(
            EnrollProgress::from_callback("enroll-stage-passed", None),
            EnrollProgress::StagePassed
        );
        assert!(matches!(
            EnrollProgress::from_callback("enroll-failed", None),
            EnrollProgress::Failed { .. }
        ));
    }

    #[test]
    fn test_enroll_completed_without_template_is_failure() {
        let progress = EnrollProgress::from_callback("enroll-completed", None);
        assert!(matches!(progress, EnrollProgress::Failed { .. }));
        assert!(progress.is_terminal());
    }

    #[test]
    fn test_unknown_enroll_tag_is_retry() {
        let progress = EnrollProgress::from_callback("enroll-swipe-too-short", None);
        assert!(matches!(progress, EnrollProgress::Retry { .. }));
        assert!(!progress.is_terminal());
    }

    #[test]
    fn test_enroll_terminality() {
        assert!(
            EnrollProgress::Completed {
                template: FingerprintTemplate::new(vec![1])
            }
            .is_terminal()
        );
        assert!(
            EnrollProgress::Failed {
                message: "x".into()
            }
            .is_terminal()
        );
        assert!(!EnrollProgress::StagePassed.is_terminal());
    }
}
