//! Configuration container and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DebateParams, GatewayConfig, MemoryConfig};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("Rate limit for '{tool}' has a zero window or zero calls")]
    ZeroRateLimit { tool: String },

    #[error("Importance weights must be non-negative and sum to a positive value")]
    InvalidWeights,

    #[error("Threshold {name} = {value} is outside [0, 1]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("Promotion threshold {promotion} is below eviction threshold {eviction}")]
    PromotionBelowEviction { promotion: f64, eviction: f64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// All application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TribunalConfig {
    pub gateway: GatewayConfig,
    pub memory: MemoryConfig,
    pub debate: DebateParams,
}

impl TribunalConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let limits = std::iter::once(("<default>".to_string(), self.gateway.default_rate_limit))
            .chain(self.gateway.rate_limits.iter().map(|(t, l)| (t.clone(), *l)));
        for (tool, limit) in limits {
            if limit.window_secs == 0 || limit.max_calls == 0 {
                return Err(ConfigValidationError::ZeroRateLimit { tool });
            }
        }

        let w = &self.memory.weights;
        if w.adoption < 0.0 || w.trust < 0.0 || w.recency < 0.0 || w.total() <= 0.0 {
            return Err(ConfigValidationError::InvalidWeights);
        }

        for (name, value) in [
            ("eviction_threshold", self.memory.eviction_threshold),
            ("promotion_threshold", self.memory.promotion_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::ThresholdOutOfRange { name, value });
            }
        }
        if self.memory.promotion_threshold < self.memory.eviction_threshold {
            return Err(ConfigValidationError::PromotionBelowEviction {
                promotion: self.memory.promotion_threshold,
                eviction: self.memory.eviction_threshold,
            });
        }

        if self.memory.consolidation_batch_size == 0 {
            return Err(ConfigValidationError::Zero("memory.consolidation_batch_size"));
        }
        if self.debate.max_steps == 0 {
            return Err(ConfigValidationError::Zero("debate.max_steps"));
        }
        if self.debate.max_concurrency == 0 {
            return Err(ConfigValidationError::Zero("debate.max_concurrency"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimit;
    use tribunal_domain::ImportanceWeights;

    #[test]
    fn test_default_is_valid() {
        assert!(TribunalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = TribunalConfig::default();
        config.gateway = config.gateway.with_rate_limit("t", RateLimit::new(5, 0));
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroRateLimit { tool: "t".into() })
        );
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut config = TribunalConfig::default();
        config.memory.weights = ImportanceWeights {
            adoption: 0.0,
            trust: 0.0,
            recency: 0.0,
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidWeights));
    }

    #[test]
    fn test_promotion_below_eviction_rejected() {
        let mut config = TribunalConfig::default();
        config.memory = config.memory.with_thresholds(0.6, 0.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::PromotionBelowEviction { .. })
        ));
    }
}
