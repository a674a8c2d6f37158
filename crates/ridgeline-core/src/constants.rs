//! System-wide constants: defaults, environment variables and sensor
//! callback wire tags.

/// Default TCP port for the HTTP/WebSocket API.
pub const DEFAULT_PORT: u16 = 4444;

/// Default sensor device identifier.
pub const DEFAULT_DEVICE_ID: &str = "Digital Persona U.are.U 4000/4000B/4500";

/// Default path of the persisted registry document.
pub const DEFAULT_STORE_PATH: &str = "./db.json";

/// Default overall deadline for a single enroll transaction, in seconds.
pub const DEFAULT_ENROLL_TIMEOUT_SECS: u64 = 60;

/// Environment variable for the listen port. Takes precedence over the
/// corresponding CLI argument.
pub const ENV_PORT: &str = "FPRINT_SERVER_PORT";

/// Environment variable for the sensor device identifier.
pub const ENV_DEVICE: &str = "FPRINT_SERVER_DEVICE";

/// Environment variable for the registry document path.
pub const ENV_STORE_PATH: &str = "FPRINT_SERVER_CONFPATH";

/// Environment variable enabling debug logging (`1` or `true`).
pub const ENV_DEBUG: &str = "FPRINT_SERVER_DEBUG";

// Sensor callback message tags. The set is closed: anything the driver
// reports outside of it is treated as a continue/no-op, never a hard error.

/// Identify session matched a gallery entry.
pub const TAG_IDENTIFY_SUCCEEDED: &str = "identify-succeeded";

/// Identify session completed without a match.
pub const TAG_IDENTIFY_NOT_MATCHED: &str = "identify-not-matched";

/// Transient identify problem (short swipe, smudge); session continues.
pub const TAG_IDENTIFY_RETRY: &str = "identify-retry";

/// Identify session ended with a device-reported error.
pub const TAG_IDENTIFY_FAILED: &str = "identify-failed";

/// Enroll transaction finished and produced a template.
pub const TAG_ENROLL_COMPLETED: &str = "enroll-completed";

/// One enroll stage captured; more touches required.
pub const TAG_ENROLL_STAGE_PASSED: &str = "enroll-stage-passed";

/// Transient enroll problem; the stage must be repeated.
pub const TAG_ENROLL_RETRY: &str = "enroll-retry";

/// Enroll transaction terminally failed.
pub const TAG_ENROLL_FAILED: &str = "enroll-failed";
