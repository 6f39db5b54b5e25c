//! Entity manager configuration.

use std::fmt::Display;
use std::str::FromStr;

use mbe_handle::Validation;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable selecting [`ManagerConfig::validation`].
pub const VALIDATION_ENV: &str = "MBE_HANDLE_VALIDATION";
/// Environment variable selecting [`ManagerConfig::entity_capacity`].
pub const ENTITY_CAPACITY_ENV: &str = "MBE_ENTITY_CAPACITY";

/// Settings for an [`EntityManager`](crate::EntityManager).
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// How entity handles are validated by must-exist lookups.
    pub validation: Validation,
    /// Entity slots to allocate up front.
    pub entity_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            validation: Validation::Checked,
            entity_capacity: 256,
        }
    }
}

impl ManagerConfig {
    /// Defaults overridden by `MBE_HANDLE_VALIDATION` and
    /// `MBE_ENTITY_CAPACITY`. Malformed values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            validation: parse_or(&lookup, VALIDATION_ENV, defaults.validation),
            entity_capacity: parse_or(&lookup, ENTITY_CAPACITY_ENV, defaults.entity_capacity),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(error) => {
            warn!(key, value = %raw, %error, %default, "ignoring malformed setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        let config = ManagerConfig::from_lookup(|key| match key {
            VALIDATION_ENV => Some("Trusted".to_owned()),
            ENTITY_CAPACITY_ENV => Some(" 1024 ".to_owned()),
            _ => None,
        });

        assert_eq!(config.validation, Validation::Trusted);
        assert_eq!(config.entity_capacity, 1024);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = ManagerConfig::from_lookup(|key| match key {
            VALIDATION_ENV => Some("paranoid".to_owned()),
            ENTITY_CAPACITY_ENV => Some("-3".to_owned()),
            _ => None,
        });

        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ManagerConfig = serde_json::from_str(r#"{"validation":"trusted"}"#).unwrap();

        assert_eq!(config.validation, Validation::Trusted);
        assert_eq!(config.entity_capacity, ManagerConfig::default().entity_capacity);
    }
}
