//! Runtime configuration resolution.
//!
//! Every option can come from three places, in decreasing precedence:
//! environment variable, CLI argument, built-in default. The environment
//! wins so that a service manager can override whatever is baked into a
//! unit file's command line.

use std::path::PathBuf;

use clap::Parser;
use ridgeline_core::constants::{
    DEFAULT_DEVICE_ID, DEFAULT_PORT, DEFAULT_STORE_PATH, ENV_DEBUG, ENV_DEVICE, ENV_PORT,
    ENV_STORE_PATH,
};
use ridgeline_core::{Error, Result};

/// CLI arguments. Environment variables take precedence over these.
#[derive(Debug, Default, Parser)]
#[command(name = "ridgeline", version, about = "Fingerprint reader service")]
pub struct Args {
    /// Listen port for the HTTP/WebSocket API
    #[arg(long)]
    pub port: Option<u16>,

    /// Sensor device identifier
    #[arg(long)]
    pub device: Option<String>,

    /// Path of the registry document
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TCP port the HTTP/WebSocket API listens on.
    pub port: u16,

    /// Identifier of the sensor device to open.
    pub device_id: String,

    /// Path of the persisted registry document.
    pub store_path: PathBuf,

    /// Whether debug logging is enabled.
    pub debug: bool,
}

impl Config {
    /// Resolve configuration from the process environment and `args`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an environment variable is set but
    /// unparseable (e.g. a non-numeric port).
    pub fn resolve(args: &Args) -> Result<Self> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::resolve`] with an injectable environment lookup.
    pub fn resolve_with(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match env(ENV_PORT) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid {ENV_PORT}: {raw}")))?,
            None => args.port.unwrap_or(DEFAULT_PORT),
        };

        let device_id = env(ENV_DEVICE)
            .or_else(|| args.device.clone())
            .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());

        let store_path = env(ENV_STORE_PATH)
            .map(PathBuf::from)
            .or_else(|| args.db.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let debug = match env(ENV_DEBUG) {
            Some(raw) => matches!(raw.as_str(), "1" | "true" | "TRUE" | "True"),
            None => args.debug,
        };

        Ok(Self {
            port,
            device_id,
            store_path,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve_with(&Args::default(), no_env).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.device_id, DEFAULT_DEVICE_ID);
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert!(!config.debug);
    }

    #[test]
    fn test_args_override_defaults() {
        let args = Args {
            port: Some(8080),
            device: Some("sensor-a".to_string()),
            db: Some(PathBuf::from("/var/lib/ridgeline/db.json")),
            debug: true,
        };

        let config = Config::resolve_with(&args, no_env).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.device_id, "sensor-a");
        assert_eq!(config.store_path, PathBuf::from("/var/lib/ridgeline/db.json"));
        assert!(config.debug);
    }

    #[test]
    fn test_environment_overrides_args() {
        let args = Args {
            port: Some(8080),
            device: Some("sensor-a".to_string()),
            db: Some(PathBuf::from("./args.json")),
            debug: false,
        };

        let config = Config::resolve_with(&args, |key| match key {
            ENV_PORT => Some("9999".to_string()),
            ENV_DEVICE => Some("sensor-env".to_string()),
            ENV_STORE_PATH => Some("/env/db.json".to_string()),
            ENV_DEBUG => Some("1".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.port, 9999);
        assert_eq!(config.device_id, "sensor-env");
        assert_eq!(config.store_path, PathBuf::from("/env/db.json"));
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_env_port_is_config_error() {
        let result = Config::resolve_with(&Args::default(), |key| {
            (key == ENV_PORT).then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_env_parsing() {
        for (raw, expected) in [("1", true), ("true", true), ("0", false), ("no", false)] {
            let config = Config::resolve_with(&Args::default(), |key| {
                (key == ENV_DEBUG).then(|| raw.to_string())
            })
            .unwrap();
            assert_eq!(config.debug, expected, "raw = {raw}");
        }
    }
}
