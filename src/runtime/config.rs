//! Time domain configuration.
//!
//! | Field | Default |
//! |-------|---------|
//! | `name` | `"time_domain"` |
//! | `heap_capacity` | 16 |
//! | `queue_capacity` | 16 |
//!
//! [`TimeDomainConfig::from_env`] layers environment overrides on top of the
//! defaults; with the `config-file` feature, `from_toml_file` adds a TOML
//! layer underneath the environment.

use super::env_config;
use crate::error::ConfigResult;

/// Default name reported in diagnostics.
pub const DEFAULT_NAME: &str = "time_domain";

/// Settings for a [`TimeDomain`](super::TimeDomain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDomainConfig {
    /// Name reported by [`TimeDomain::as_value`](super::TimeDomain::as_value).
    pub name: String,
    /// Entries pre-allocated in the wake-up heap.
    pub heap_capacity: usize,
    /// Queue slots pre-allocated in the registry.
    pub queue_capacity: usize,
}

impl Default for TimeDomainConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            heap_capacity: 16,
            queue_capacity: 16,
        }
    }
}

impl TimeDomainConfig {
    /// Default configuration with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the heap pre-allocation.
    #[must_use]
    pub const fn heap_capacity(mut self, capacity: usize) -> Self {
        self.heap_capacity = capacity;
        self
    }

    /// Sets the queue registry pre-allocation.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Builds a configuration from defaults plus environment overrides.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Loads a TOML file, then applies environment overrides on top.
    ///
    /// Precedence: environment > file > defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: &std::path::Path) -> ConfigResult<Self> {
        let mut config = Self::default();
        let toml = env_config::parse_toml_file(path)?;
        env_config::apply_toml_config(&mut config, &toml);
        env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TimeDomainConfig::default();
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.heap_capacity, 16);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn builder_setters() {
        let config = TimeDomainConfig::named("renderer")
            .heap_capacity(64)
            .queue_capacity(8);
        assert_eq!(config.name, "renderer");
        assert_eq!(config.heap_capacity, 64);
        assert_eq!(config.queue_capacity, 8);
    }
}
