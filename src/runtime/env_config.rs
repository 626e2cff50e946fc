//! Environment variable and config file overrides for [`TimeDomainConfig`].
//!
//! # Configuration Precedence
//!
//! 1. **Programmatic**: values set on the config after loading
//! 2. **Environment variables**: `TIMEDOMAIN_*`
//! 3. **Config file**: `[domain]` table of a TOML file (`config-file` feature)
//! 4. **Defaults**: [`TimeDomainConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `TIMEDOMAIN_NAME` | `String` | `name` |
//! | `TIMEDOMAIN_HEAP_CAPACITY` | `usize` | `heap_capacity` |
//! | `TIMEDOMAIN_QUEUE_CAPACITY` | `usize` | `queue_capacity` |

use super::config::TimeDomainConfig;
use crate::error::{ConfigError, ConfigResult};

/// Environment variable name for the domain name.
pub const ENV_NAME: &str = "TIMEDOMAIN_NAME";
/// Environment variable name for the heap pre-allocation.
pub const ENV_HEAP_CAPACITY: &str = "TIMEDOMAIN_HEAP_CAPACITY";
/// Environment variable name for the queue registry pre-allocation.
pub const ENV_QUEUE_CAPACITY: &str = "TIMEDOMAIN_QUEUE_CAPACITY";

/// Apply environment variable overrides to a [`TimeDomainConfig`].
///
/// Only variables that are set are applied. A set but unparseable variable
/// is an error.
pub fn apply_env_overrides(config: &mut TimeDomainConfig) -> ConfigResult<()> {
    apply_overrides(config, |name| std::env::var(name).ok())
}

/// Same as [`apply_env_overrides`] but reads variables through `lookup`.
pub fn apply_overrides(
    config: &mut TimeDomainConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    if let Some(val) = lookup(ENV_NAME) {
        let trimmed = val.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: ENV_NAME,
                value: val,
                expected: "non-empty name",
            });
        }
        config.name = trimmed.to_string();
    }
    if let Some(val) = lookup(ENV_HEAP_CAPACITY) {
        config.heap_capacity = parse_usize(ENV_HEAP_CAPACITY, &val)?;
    }
    if let Some(val) = lookup(ENV_QUEUE_CAPACITY) {
        config.queue_capacity = parse_usize(ENV_QUEUE_CAPACITY, &val)?;
    }
    Ok(())
}

fn parse_usize(var: &'static str, val: &str) -> ConfigResult<usize> {
    val.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: val.to_string(),
            expected: "unsigned integer",
        })
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable configuration.
///
/// ```toml
/// [domain]
/// name = "renderer"
/// heap_capacity = 64
/// queue_capacity = 8
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct TimeDomainToml {
    /// Domain settings.
    #[serde(default)]
    pub domain: DomainToml,
}

/// `[domain]` table of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct DomainToml {
    /// Diagnostics name.
    pub name: Option<String>,
    /// Heap pre-allocation.
    pub heap_capacity: Option<usize>,
    /// Queue registry pre-allocation.
    pub queue_capacity: Option<usize>,
}

/// Apply a parsed TOML config. Only `Some` fields override.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut TimeDomainConfig, toml: &TimeDomainToml) {
    if let Some(ref v) = toml.domain.name {
        config.name.clone_from(v);
    }
    if let Some(v) = toml.domain.heap_capacity {
        config.heap_capacity = v;
    }
    if let Some(v) = toml.domain.queue_capacity {
        config.queue_capacity = v;
    }
}

/// Parse a TOML string.
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> ConfigResult<TimeDomainToml> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a TOML file.
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> ConfigResult<TimeDomainToml> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml_str(&content)
}
