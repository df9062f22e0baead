//! Runtime settings.
//!
//! Values are layered with the `config` crate, lowest priority first:
//! built-in defaults, an optional config file, `SENSORWATCH_*` environment
//! variables (a `.env` file is loaded into the environment by the binary),
//! then command-line overrides. Every resolved value is logged once.
//!
//! ```toml
//! topic = "smoker"
//! group_id = "smoker-monitor"
//! window_size = 5
//! alert_threshold = 0.2
//! key_field = "sensor_id"
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use tracing::info;

use crate::error::ConfigurationError;

/// Prefix for environment variables (`SENSORWATCH_TOPIC`, ...).
pub const ENV_PREFIX: &str = "SENSORWATCH";

pub const DEFAULT_BROKERS: &str = "localhost:9092";
pub const DEFAULT_TOPIC: &str = "unknown_topic";
pub const DEFAULT_GROUP_ID: &str = "default_group";
pub const DEFAULT_WINDOW_SIZE: i64 = 5;
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.2;
pub const DEFAULT_INTERVAL_SECS: i64 = 1;
pub const DEFAULT_FIELD: &str = "temperature";
pub const DEFAULT_CSV_PATH: &str = "data/sensor_readings.csv";
pub const DEFAULT_JSON_PATH: &str = "data/readings.json";

/// How messages travel between producer and consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// A Kafka cluster.
    Kafka,
    /// Newline-delimited JSON on stdout (producer) and stdin (consumer).
    Stdio,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kafka" => Ok(Transport::Kafka),
            "stdio" => Ok(Transport::Stdio),
            other => Err(format!("unknown transport '{}' (expected kafka or stdio)", other)),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Kafka => f.write_str("kafka"),
            Transport::Stdio => f.write_str("stdio"),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub brokers: String,
    pub transport: Transport,
    pub topic: String,
    pub group_id: String,
    pub window_size: NonZeroUsize,
    pub alert_threshold: f64,
    pub interval: Duration,
    pub field: String,
    pub key_field: Option<String>,
    /// Cycle the source; `None` leaves the choice to the source kind.
    pub repeat: Option<bool>,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// Start a config builder with the file and environment layers in place.
///
/// Callers may add overrides before building.
pub fn builder(config_file: Option<&Path>) -> ConfigBuilder<DefaultState> {
    let mut builder = Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path));
    }
    builder.add_source(Environment::with_prefix(ENV_PREFIX).ignore_empty(true))
}

impl Settings {
    /// Resolve settings from a built config, applying defaults.
    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        let resolver = Resolver { config };

        let window_size = resolver.int("window_size", DEFAULT_WINDOW_SIZE)?;
        let window_size = usize::try_from(window_size)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| invalid("window_size", "must be a positive integer"))?;

        let alert_threshold = resolver.float("alert_threshold", DEFAULT_ALERT_THRESHOLD)?;
        if !alert_threshold.is_finite() || alert_threshold < 0.0 {
            return Err(invalid(
                "alert_threshold",
                "must be a finite, non-negative number",
            ));
        }

        let interval_secs = resolver.int("interval_secs", DEFAULT_INTERVAL_SECS)?;
        let interval_secs = u64::try_from(interval_secs)
            .map_err(|_| invalid("interval_secs", "must be a non-negative integer"))?;

        let transport = resolver
            .string("transport", "kafka")?
            .parse::<Transport>()
            .map_err(|reason| invalid("transport", reason))?;

        let field = resolver.string("field", DEFAULT_FIELD)?;
        if field.trim().is_empty() {
            return Err(invalid("field", "must not be empty"));
        }

        Ok(Self {
            brokers: resolver.string("brokers", DEFAULT_BROKERS)?,
            transport,
            topic: resolver.string("topic", DEFAULT_TOPIC)?,
            group_id: resolver.string("group_id", DEFAULT_GROUP_ID)?,
            window_size,
            alert_threshold,
            interval: Duration::from_secs(interval_secs),
            field,
            key_field: resolver.optional_string("key_field")?,
            repeat: resolver.optional_bool("repeat", "per source")?,
            csv_path: resolver.string("csv_path", DEFAULT_CSV_PATH)?.into(),
            json_path: resolver.string("json_path", DEFAULT_JSON_PATH)?.into(),
        })
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        key,
        reason: reason.into(),
    }
}

/// Typed lookups that fall back to a default and log what they resolved.
struct Resolver<'a> {
    config: &'a Config,
}

impl Resolver<'_> {
    fn lookup<T: fmt::Display>(
        &self,
        key: &'static str,
        found: Result<T, ConfigError>,
    ) -> Result<Option<T>, ConfigurationError> {
        match found {
            Ok(value) => {
                info!("{}: {}", key, value);
                Ok(Some(value))
            }
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(invalid(key, e.to_string())),
        }
    }

    fn with_default<T: fmt::Display>(
        &self,
        key: &'static str,
        found: Result<T, ConfigError>,
        default: T,
    ) -> Result<T, ConfigurationError> {
        match self.lookup(key, found)? {
            Some(value) => Ok(value),
            None => {
                info!("{}: {} (default)", key, default);
                Ok(default)
            }
        }
    }

    fn string(&self, key: &'static str, default: &str) -> Result<String, ConfigurationError> {
        self.with_default(key, self.config.get_string(key), default.to_string())
    }

    /// Parse the raw text of `key` instead of letting `config` coerce it,
    /// which would round floats and turn booleans into 0 or 1.
    fn parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.config.get_string(key)?;
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Message(format!("'{}' is not valid: {}", raw, e)))
    }

    fn int(&self, key: &'static str, default: i64) -> Result<i64, ConfigurationError> {
        self.with_default(key, self.parsed(key), default)
    }

    fn float(&self, key: &'static str, default: f64) -> Result<f64, ConfigurationError> {
        self.with_default(key, self.parsed(key), default)
    }

    fn optional_string(&self, key: &'static str) -> Result<Option<String>, ConfigurationError> {
        let value = self
            .lookup(key, self.config.get_string(key))?
            .filter(|v| !v.trim().is_empty());
        if value.is_none() {
            info!("{}: (unset)", key);
        }
        Ok(value)
    }

    fn optional_bool(
        &self,
        key: &'static str,
        unset: &str,
    ) -> Result<Option<bool>, ConfigurationError> {
        let value = self.lookup(key, self.config.get_bool(key))?;
        if value.is_none() {
            info!("{}: {} (default)", key, unset);
        }
        Ok(value)
    }
}
