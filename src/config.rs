//! Configuration for the gridhunt engine.
//!
//! Defaults, TOML file loading, `GRIDHUNT_*` environment overrides, and
//! validation. The oracle section mirrors the parameters of the consumed
//! randomness-request interface; the game section covers local policy.

use crate::errors::{HuntError, HuntResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntConfig {
    pub oracle: OracleConfig,
    pub game: GameConfig,
}

/// Oracle request parameters and the trusted fulfiller identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// The only identity allowed to deliver fulfillments
    pub authorized_fulfiller: String,
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before fulfilling
    pub confirmation_depth: u16,
    /// Gas budget forwarded for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Random words per request; one per grid axis
    pub word_count: u8,
}

/// Local game policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Smallest accepted stake; the protocol floor is 1
    pub min_stake: u64,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            authorized_fulfiller: "vrf-coordinator".to_string(),
            subscription_id: 1,
            confirmation_depth: 3,
            callback_gas_limit: 100_000,
            word_count: 2,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_stake: 1,
            event_capacity: 256,
        }
    }
}

impl HuntConfig {
    /// Validate configuration values
    pub fn validate(&self) -> HuntResult<()> {
        if self.oracle.authorized_fulfiller.is_empty() {
            return Err(HuntError::Config(
                "oracle.authorized_fulfiller must not be empty".to_string(),
            ));
        }
        if self.oracle.subscription_id == 0 {
            return Err(HuntError::Config(
                "oracle.subscription_id cannot be zero".to_string(),
            ));
        }
        if self.oracle.callback_gas_limit == 0 {
            return Err(HuntError::Config(
                "oracle.callback_gas_limit cannot be zero".to_string(),
            ));
        }
        // One word per axis; the settlement engine consumes exactly two.
        if self.oracle.word_count != 2 {
            return Err(HuntError::Config(format!(
                "oracle.word_count must be 2, got {}",
                self.oracle.word_count
            )));
        }
        if self.game.min_stake == 0 {
            return Err(HuntError::Config(
                "game.min_stake must be at least 1".to_string(),
            ));
        }
        if self.game.event_capacity == 0 {
            return Err(HuntError::Config(
                "game.event_capacity cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> HuntResult<HuntConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            HuntConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> HuntResult<HuntConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HuntError::Config(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| HuntError::Config(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut HuntConfig) -> HuntResult<()> {
        if let Ok(fulfiller) = env::var("GRIDHUNT_ORACLE_FULFILLER") {
            config.oracle.authorized_fulfiller = fulfiller;
        }
        if let Ok(subscription) = env::var("GRIDHUNT_ORACLE_SUBSCRIPTION") {
            config.oracle.subscription_id = subscription.parse().map_err(|_| {
                HuntError::Config(format!(
                    "Invalid value for GRIDHUNT_ORACLE_SUBSCRIPTION: '{}'",
                    subscription
                ))
            })?;
        }
        if let Ok(depth) = env::var("GRIDHUNT_ORACLE_CONFIRMATIONS") {
            config.oracle.confirmation_depth = depth.parse().map_err(|_| {
                HuntError::Config(format!(
                    "Invalid value for GRIDHUNT_ORACLE_CONFIRMATIONS: '{}'",
                    depth
                ))
            })?;
        }
        if let Ok(gas) = env::var("GRIDHUNT_ORACLE_GAS_LIMIT") {
            config.oracle.callback_gas_limit = gas.parse().map_err(|_| {
                HuntError::Config(format!(
                    "Invalid value for GRIDHUNT_ORACLE_GAS_LIMIT: '{}'",
                    gas
                ))
            })?;
        }
        if let Ok(min_stake) = env::var("GRIDHUNT_MIN_STAKE") {
            config.game.min_stake = min_stake.parse().map_err(|_| {
                HuntError::Config(format!(
                    "Invalid value for GRIDHUNT_MIN_STAKE: '{}'",
                    min_stake
                ))
            })?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &HuntConfig, path: &str) -> HuntResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| HuntError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| HuntError::Config(format!("Failed to write to {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
