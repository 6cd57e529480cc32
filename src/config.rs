//! Layered configuration for the tracker.
//!
//! Sources (highest priority wins):
//! 1. Environment variables (`FREEDOM_*` prefix, `__` as the section separator)
//! 2. `freedom-tracker.toml` in the working directory (or an explicit path)
//! 3. Built-in defaults
//!
//! `FREEDOM_SYNC__MATERIALITY_THRESHOLD=5` maps to `sync.materiality_threshold`.

use crate::freedom::FreedomPolicy;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "freedom-tracker.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the local snapshot and audit events
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: PathBuf::from("freedom-tracker.db"),
        }
    }
}

/// Address format bounds (base58 Solana addresses are 32..=44 chars)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub min_address_len: usize,
    pub max_address_len: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletConfig {
            min_address_len: 32,
            max_address_len: 44,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Synced holdings worth less than this are dropped as dust
    pub materiality_threshold: f64,

    /// Price-table key used for the native balance
    pub native_token_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            materiality_threshold: 0.01,
            native_token_id: crate::sync::NATIVE_SOL_MINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// First line of the message the wallet signs to derive the backup key
    pub message_prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            message_prefix: "Freedom Tracker encrypted backup".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub freedom: FreedomPolicy,
    #[serde(default)]
    pub backup: BackupConfig,
}

impl TrackerConfig {
    /// Load from defaults, `freedom-tracker.toml` and `FREEDOM_*` env vars
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: TrackerConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("FREEDOM_").split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wallet = &self.wallet;
        if wallet.min_address_len == 0 || wallet.min_address_len > wallet.max_address_len {
            return Err(ConfigError::InvalidValue {
                field: "wallet.min_address_len".to_string(),
                reason: format!(
                    "must be between 1 and max_address_len ({})",
                    self.wallet.max_address_len
                ),
            });
        }
        if !self.sync.materiality_threshold.is_finite() || self.sync.materiality_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.materiality_threshold".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        let coverage = self.freedom.free_coverage_ratio;
        if !coverage.is_finite() || coverage <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "freedom.free_coverage_ratio".to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_load_without_files() {
        Jail::expect_with(|_jail| {
            let config = TrackerConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config, TrackerConfig::default());
            assert_eq!(config.wallet.max_address_len, 44);
            assert_eq!(config.sync.materiality_threshold, 0.01);
            Ok(())
        });
    }

    #[test]
    fn test_toml_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
[storage]
db_path = "profile.db"

[sync]
materiality_threshold = 1.5

[freedom]
free_coverage_ratio = 1.2
debt_payment_weight = 1.0
include_desires = true
"#,
            )?;
            jail.set_env("FREEDOM_SYNC__MATERIALITY_THRESHOLD", "2.5");

            let config = TrackerConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.storage.db_path, PathBuf::from("profile.db"));
            assert_eq!(config.sync.materiality_threshold, 2.5);
            assert_eq!(config.freedom.free_coverage_ratio, 1.2);
            assert!(config.freedom.include_desires);
            assert_eq!(config.wallet, WalletConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = TrackerConfig::default();
        config.wallet.min_address_len = 50;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
