//! Pool configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shielded_circuits::{DEFAULT_DEPTH, DEFAULT_ROOT_HISTORY, MAX_DEPTH};

use crate::error::PersistenceError;

/// Which accumulator roots a spend proof may be bound to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Only the current root is accepted.
    #[default]
    CurrentOnly,
    /// Any root still in the accumulator's bounded history is accepted.
    RecentWindow,
}

/// Configuration for one pool instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Accumulator depth; capacity is `2^depth` deposits.
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Number of recent roots remembered for [`RootPolicy::RecentWindow`].
    #[serde(default = "default_root_history_size")]
    pub root_history_size: usize,

    #[serde(default)]
    pub root_policy: RootPolicy,

    /// Compare local and ledger roots after every confirmed spend.
    #[serde(default)]
    pub verify_sync_after_spend: bool,
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_root_history_size() -> usize {
    DEFAULT_ROOT_HISTORY
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            root_history_size: default_root_history_size(),
            root_policy: RootPolicy::default(),
            verify_sync_after_spend: false,
        }
    }
}

impl PoolConfig {
    /// Config with the given depth and defaults elsewhere.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.depth == 0 || self.depth > MAX_DEPTH {
            return Err(PersistenceError::Invalid(format!(
                "depth must be between 1 and {MAX_DEPTH}, got {}",
                self.depth
            )));
        }
        if self.root_history_size == 0 {
            return Err(PersistenceError::Invalid(
                "root_history_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, PersistenceError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.depth, 20);
        assert_eq!(config.root_history_size, 30);
        assert_eq!(config.root_policy, RootPolicy::CurrentOnly);
        assert!(!config.verify_sync_after_spend);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{ "depth": 8, "root_policy": "recent_window" }"#).unwrap();

        assert_eq!(config.depth, 8);
        assert_eq!(config.root_history_size, 30);
        assert_eq!(config.root_policy, RootPolicy::RecentWindow);
    }

    #[test]
    fn test_validate_rejects_bad_depth() {
        assert!(PoolConfig::with_depth(0).validate().is_err());
        assert!(PoolConfig::with_depth(33).validate().is_err());
        assert!(PoolConfig::with_depth(32).validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");
        std::fs::write(&path, r#"{ "depth": 12, "root_history_size": 5 }"#).unwrap();

        let config = PoolConfig::from_json_file(&path).unwrap();
        assert_eq!(config.depth, 12);
        assert_eq!(config.root_history_size, 5);

        std::fs::write(&path, r#"{ "root_history_size": 0 }"#).unwrap();
        assert!(PoolConfig::from_json_file(&path).is_err());
    }
}
