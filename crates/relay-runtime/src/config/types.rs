//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
/// Every section is `#[serde(default)]`, so a config file only needs
/// to name the values it changes.
///
/// # Example
///
/// ```
/// use relay_runtime::config::RelayConfig;
///
/// let config = RelayConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.registry.ttl_secs, 300);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Enable debug mode (verbose logging, diagnostics).
    pub debug: bool,

    /// Stream registry configuration.
    pub registry: RegistryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Demo agent configuration.
    pub agent: AgentConfig,
}

impl RelayConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.registry.merge(&other.registry);
        self.timeouts.merge(&other.timeouts);
        self.logging.merge(&other.logging);
        self.agent.merge(&other.agent);
    }

    /// Rejects values that would make a stream live forever or never
    /// accept a write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.ttl_secs == 0 {
            return Err(ConfigError::invalid("registry.ttl_secs", "must be > 0"));
        }
        if self.registry.queue_capacity == 0 {
            return Err(ConfigError::invalid("registry.queue_capacity", "must be > 0"));
        }
        if self.timeouts.write_ms == 0 {
            return Err(ConfigError::invalid("timeouts.write_ms", "must be > 0"));
        }
        if self.timeouts.idle_ms == 0 {
            return Err(ConfigError::invalid("timeouts.idle_ms", "must be > 0"));
        }
        if self.timeouts.invoke_ms == 0 {
            return Err(ConfigError::invalid("timeouts.invoke_ms", "must be > 0"));
        }
        Ok(())
    }
}

/// Stream registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Age in seconds after which an abandoned stream is swept.
    pub ttl_secs: u64,

    /// Period of the background sweeper in seconds.
    ///
    /// `0` disables the background task. The sweep that runs on every
    /// `create()` is unaffected.
    pub sweep_interval_secs: u64,

    /// Maximum number of queued messages per stream.
    pub queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_interval_secs: 30,
            queue_capacity: 1024,
        }
    }
}

impl RegistryConfig {
    /// Returns the TTL as a [`Duration`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the sweeper period, or `None` when disabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.ttl_secs != default.ttl_secs {
            self.ttl_secs = other.ttl_secs;
        }
        if other.sweep_interval_secs != default.sweep_interval_secs {
            self.sweep_interval_secs = other.sweep_interval_secs;
        }
        if other.queue_capacity != default.queue_capacity {
            self.queue_capacity = other.queue_capacity;
        }
    }
}

/// Timeout configuration.
///
/// The three timeouts are independent: one bounds each producer write,
/// one bounds each drain-loop wait, and one bounds the whole invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Per-send write timeout in milliseconds. Default: 1000.
    pub write_ms: u64,

    /// Drain-loop idle timeout in milliseconds. Default: 30000.
    pub idle_ms: u64,

    /// Overall invocation deadline in milliseconds. Default: 60000.
    pub invoke_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            write_ms: 1_000,
            idle_ms: 30_000,
            invoke_ms: 60_000,
        }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    #[must_use]
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_ms)
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.write_ms != default.write_ms {
            self.write_ms = other.write_ms;
        }
        if other.idle_ms != default.idle_ms {
            self.idle_ms = other.idle_ms;
        }
        if other.invoke_ms != default.invoke_ms {
            self.invoke_ms = other.invoke_ms;
        }
    }
}

/// Persistent log file configuration.
///
/// The terminal layer is driven by CLI flags and `RUST_LOG`; this section
/// only controls the optional file layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to `<file_path>/relay.log`.
    pub file: bool,

    /// Log directory. Defaults to `~/.relay/logs`.
    pub file_path: Option<PathBuf>,

    /// Level for the file layer (`trace`..`error`). Default: `debug`.
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            file_path: None,
            file_level: "debug".into(),
        }
    }
}

impl LoggingConfig {
    /// Returns the log directory, falling back to `~/.relay/logs`.
    #[must_use]
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| super::default_config_dir().join("logs"))
    }

    /// Returns the `EnvFilter` directive for the file layer.
    #[must_use]
    pub fn file_filter_directive(&self) -> String {
        self.file_level.to_lowercase()
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.file != default.file {
            self.file = other.file;
        }
        if other.file_path.is_some() {
            self.file_path.clone_from(&other.file_path);
        }
        if other.file_level != default.file_level {
            self.file_level.clone_from(&other.file_level);
        }
    }
}

/// Demo agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Code revealed digit by digit by the streaming tool.
    pub secret_code: String,

    /// Simulated work per digit in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            secret_code: "1234".into(),
            step_delay_ms: 300,
        }
    }
}

impl AgentConfig {
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.secret_code != default.secret_code {
            self.secret_code.clone_from(&other.secret_code);
        }
        if other.step_delay_ms != default.step_delay_ms {
            self.step_delay_ms = other.step_delay_ms;
        }
    }
}
