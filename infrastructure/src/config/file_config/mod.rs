//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! The `[gateway]`, `[memory]` and `[debate]` sections deserialize straight
//! into the application configuration types.

mod logging;

pub use logging::FileLoggingConfig;

use serde::{Deserialize, Serialize};
use tribunal_application::config::{
    ConfigValidationError, DebateParams, GatewayConfig, MemoryConfig, TribunalConfig,
};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Rate limits, slow-call threshold, error caching, TTL overrides, guardrails
    pub gateway: GatewayConfig,
    /// Importance weights, thresholds, consolidation and staleness
    pub memory: MemoryConfig,
    /// Rounds, step budget, completion concurrency
    pub debate: DebateParams,
    /// Transcript and log file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validated application configuration.
    pub fn to_tribunal_config(&self) -> Result<TribunalConfig, ConfigValidationError> {
        let config = TribunalConfig {
            gateway: self.gateway.clone(),
            memory: self.memory.clone(),
            debate: self.debate.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
