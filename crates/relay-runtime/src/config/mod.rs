//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. CLI overrides (ConfigResolver)       │  Per-run
//! ├──────────────────────────────────────────┤
//! │  2. Environment Variables (RELAY_*)      │  Runtime override
//! ├──────────────────────────────────────────┤
//! │  3. Project Config (.relay/config.toml)  │  Project-specific
//! ├──────────────────────────────────────────┤
//! │  4. Global Config (~/.relay/config.toml) │  User defaults
//! ├──────────────────────────────────────────┤
//! │  5. Default Values (compile-time)        │  Fallback
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `RELAY_DEBUG` | `debug` | bool |
//! | `RELAY_STREAM_TTL_SECS` | `registry.ttl_secs` | u64 |
//! | `RELAY_SWEEP_INTERVAL_SECS` | `registry.sweep_interval_secs` | u64 |
//! | `RELAY_QUEUE_CAPACITY` | `registry.queue_capacity` | usize |
//! | `RELAY_WRITE_TIMEOUT_MS` | `timeouts.write_ms` | u64 |
//! | `RELAY_IDLE_TIMEOUT_MS` | `timeouts.idle_ms` | u64 |
//! | `RELAY_INVOKE_TIMEOUT_MS` | `timeouts.invoke_ms` | u64 |
//! | `RELAY_LOG_FILE` | `logging.file_path` (enables file log) | PathBuf |
//! | `RELAY_LOG_LEVEL` | `logging.file_level` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.relay/config.toml
//! debug = false
//!
//! [registry]
//! ttl_secs = 300
//! sweep_interval_secs = 30
//! queue_capacity = 1024
//!
//! [timeouts]
//! write_ms = 1000
//! idle_ms = 30000
//! invoke_ms = 60000
//!
//! [logging]
//! file = true
//! file_level = "debug"
//!
//! [agent]
//! secret_code = "1234"
//! step_delay_ms = 300
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{AgentConfig, LoggingConfig, RegistryConfig, RelayConfig, TimeoutsConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".relay")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".relay";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
