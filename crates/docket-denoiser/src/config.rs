//! Denoiser configuration

use serde::{Deserialize, Serialize};

/// Seeded epsilon-greedy selection with momentum-smoothed question values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// RNG seed; the same seed and inputs always select the same questions
    pub seed: u64,

    /// Probability of picking a random candidate instead of the best one
    pub epsilon: f64,

    /// Weight of the previous value when smoothing (0.0 disables momentum)
    pub momentum_beta: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            epsilon: 0.1,
            momentum_beta: 0.9,
        }
    }
}

/// Configuration for [`crate::ComplaintDenoiser`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiserConfig {
    /// Weight of the gap component of the noise level
    pub gap_weight: f64,

    /// Weight of the unsatisfied-requirement component
    pub requirement_weight: f64,

    /// Weight of the mean-uncertainty component
    pub uncertainty_weight: f64,

    /// Distinct questions that may be issued in one phase before the denoiser
    /// reports itself exhausted
    pub max_questions_per_phase: usize,

    /// Number of trailing iterations compared for stagnation
    pub stagnation_window: usize,

    /// Minimum noise reduction across the window to count as progress
    pub stagnation_epsilon: f64,

    /// Question selection policy
    pub exploration: ExplorationConfig,
}

impl DenoiserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.gap_weight, self.requirement_weight, self.uncertainty_weight];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err("noise weights must be finite and non-negative".to_string());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("at least one noise weight must be positive".to_string());
        }
        if self.max_questions_per_phase == 0 {
            return Err("max_questions_per_phase must be greater than 0".to_string());
        }
        if self.stagnation_window == 0 {
            return Err("stagnation_window must be greater than 0".to_string());
        }
        if self.stagnation_epsilon < 0.0 {
            return Err("stagnation_epsilon must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.exploration.epsilon) {
            return Err("exploration.epsilon must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..1.0).contains(&self.exploration.momentum_beta) {
            return Err("exploration.momentum_beta must be in [0.0, 1.0)".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: short phases, quick to call stagnation
    pub fn aggressive() -> Self {
        Self {
            max_questions_per_phase: 20,
            stagnation_window: 2,
            stagnation_epsilon: 0.02,
            exploration: ExplorationConfig {
                epsilon: 0.05,
                ..ExplorationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Lenient preset: long phases, more exploration
    pub fn lenient() -> Self {
        Self {
            max_questions_per_phase: 100,
            stagnation_window: 5,
            stagnation_epsilon: 0.005,
            exploration: ExplorationConfig {
                epsilon: 0.2,
                ..ExplorationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for DenoiserConfig {
    fn default() -> Self {
        Self {
            gap_weight: 0.4,
            requirement_weight: 0.4,
            uncertainty_weight: 0.2,
            max_questions_per_phase: 50,
            stagnation_window: 3,
            stagnation_epsilon: 0.01,
            exploration: ExplorationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(DenoiserConfig::default().validate().is_ok());
        assert!(DenoiserConfig::aggressive().validate().is_ok());
        assert!(DenoiserConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_weights() {
        let config = DenoiserConfig {
            gap_weight: 0.0,
            requirement_weight: 0.0,
            uncertainty_weight: 0.0,
            ..DenoiserConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_exploration() {
        let mut config = DenoiserConfig::default();
        config.exploration.momentum_beta = 1.0;
        assert!(config.validate().is_err());
        config.exploration.momentum_beta = 0.5;
        config.exploration.epsilon = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_toml() {
        let parsed = DenoiserConfig::from_toml("gap_weight = 0.5\n[exploration]\nseed = 7\n").unwrap();
        assert_eq!(parsed.gap_weight, 0.5);
        assert_eq!(parsed.exploration.seed, 7);
        assert_eq!(parsed.exploration.epsilon, 0.1);
        let round = DenoiserConfig::from_toml(&parsed.to_toml().unwrap()).unwrap();
        assert_eq!(round, parsed);
    }
}
