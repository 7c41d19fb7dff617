//! Configuration for the lock registry

use serde::{Deserialize, Serialize};

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account identity the registry custodies funds under
    pub custody_account: String,

    /// Receipt-asset naming
    pub naming: NamingConfig,

    /// Validation limits
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            custody_account: "lock-registry".to_string(),
            naming: NamingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Receipt-asset naming templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Word inserted between the asset name and the position index
    pub name_template: String,

    /// Prefix inserted between the asset symbol and the position index
    pub symbol_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            name_template: "Lock".to_string(),
            symbol_prefix: "L".to_string(),
        }
    }
}

/// Validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Release timestamps at or above this value are millisecond-scale by
    /// mistake and are rejected
    pub max_release_time: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_release_time: crate::types::RELEASE_TIME_LIMIT,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(account) = std::env::var("LOCK_CUSTODY_ACCOUNT") {
            config.custody_account = account;
        }

        if let Ok(limit) = std::env::var("LOCK_MAX_RELEASE_TIME") {
            config.limits.max_release_time = limit
                .parse()
                .map_err(|e| crate::Error::Config(format!("LOCK_MAX_RELEASE_TIME: {}", e)))?;
        }

        Ok(config)
    }
}
