//! Configuration resolver trait.
//!
//! ```text
//! ConfigLoader.load()  →  RelayConfig (file + env)
//!                              │
//!                              ▼
//!                     ConfigResolver.resolve()
//!                              │
//!                              ▼
//!                     RelayConfig (final)
//! ```
//!
//! Frontends implement [`ConfigResolver`] to add their own highest-priority
//! layer (CLI flags) on top of the loader output.

use super::{ConfigError, ConfigLoader, RelayConfig};

/// Produces the final configuration for a run.
pub trait ConfigResolver {
    /// Resolves the complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if loading or validation fails.
    fn resolve(&self) -> Result<RelayConfig, ConfigError>;
}

/// Resolver that only applies compile-time defaults.
///
/// Useful as a default or for testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn resolve(&self) -> Result<RelayConfig, ConfigError> {
        ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .skip_env_vars()
            .load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_resolver_returns_defaults() {
        let config = NoOpResolver.resolve().expect("defaults resolve");
        assert_eq!(config, RelayConfig::default());
    }
}
