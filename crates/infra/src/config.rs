//! Configuration loading and representation.

use serde::{Deserialize, Serialize};

/// Identity allocation settings for stores that assign identities themselves.
///
/// Mirrors a SQL identity column: the first committed row gets `identity_seed` and
/// each following row adds `identity_increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub identity_seed: u64,
    pub identity_increment: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            identity_seed: 1,
            identity_increment: 1,
        }
    }
}

impl StoreConfig {
    pub const IDENTITY_SEED_VAR: &'static str = "STOREFRONT_IDENTITY_SEED";
    pub const IDENTITY_INCREMENT_VAR: &'static str = "STOREFRONT_IDENTITY_INCREMENT";

    /// Load from process environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            identity_seed: positive_setting(&lookup, Self::IDENTITY_SEED_VAR, defaults.identity_seed),
            identity_increment: positive_setting(
                &lookup,
                Self::IDENTITY_INCREMENT_VAR,
                defaults.identity_increment,
            ),
        }
    }

    /// Replace zero settings with their defaults.
    ///
    /// Applies the same rule as [`StoreConfig::from_lookup`] to values built in code
    /// or deserialized.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            identity_seed: positive_or_default(
                Self::IDENTITY_SEED_VAR,
                self.identity_seed,
                defaults.identity_seed,
            ),
            identity_increment: positive_or_default(
                Self::IDENTITY_INCREMENT_VAR,
                self.identity_increment,
                defaults.identity_increment,
            ),
        }
    }
}

fn positive_setting<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(value) => positive_or_default(key, value, default),
        Err(_) => {
            tracing::warn!(key, value = %raw, default, "invalid store setting; using default");
            default
        }
    }
}

// Zero is rejected: identity 0 marks an unassigned entity, and a zero increment
// would hand every row the same identity.
fn positive_or_default(key: &str, value: u64, default: u64) -> u64 {
    if value > 0 {
        value
    } else {
        tracing::warn!(key, value, default, "zero store setting; using default");
        default
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])), StoreConfig::default());
    }

    #[test]
    fn reads_identity_settings() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STOREFRONT_IDENTITY_SEED", "1000"),
            ("STOREFRONT_IDENTITY_INCREMENT", " 5 "),
        ]));
        assert_eq!(config.identity_seed, 1000);
        assert_eq!(config.identity_increment, 5);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STOREFRONT_IDENTITY_SEED", "0"),
            ("STOREFRONT_IDENTITY_INCREMENT", "ten"),
        ]));
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: StoreConfig = serde_json::from_str(r#"{"identity_seed": 50}"#).unwrap();
        assert_eq!(config.identity_seed, 50);
        assert_eq!(config.identity_increment, 1);
    }

    #[test]
    fn normalized_replaces_zero_settings() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"identity_seed": 0, "identity_increment": 0}"#).unwrap();
        assert_eq!(config.normalized(), StoreConfig::default());

        let custom = StoreConfig {
            identity_seed: 10,
            identity_increment: 0,
        };
        assert_eq!(
            custom.normalized(),
            StoreConfig {
                identity_seed: 10,
                identity_increment: 1,
            }
        );
    }
}
