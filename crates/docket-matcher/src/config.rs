//! Matcher configuration

use serde::{Deserialize, Serialize};

/// Viability band cut-offs and inferred-match confidence
///
/// A claim's satisfied fraction is compared against the cut-offs from the top
/// down: at or above `strong_threshold` is strong, and so on. Anything below
/// `weak_threshold` is insufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum satisfied fraction for a strong claim
    pub strong_threshold: f64,

    /// Minimum satisfied fraction for a moderate claim
    pub moderate_threshold: f64,

    /// Minimum satisfied fraction for a weak claim
    pub weak_threshold: f64,

    /// Confidence given to a requirement established only by a supporting fact
    pub inferred_match_confidence: f64,

    /// Applicability of a legal requirement marked optional
    pub optional_applicability: f64,
}

impl MatcherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("strong_threshold", self.strong_threshold),
            ("moderate_threshold", self.moderate_threshold),
            ("weak_threshold", self.weak_threshold),
            ("inferred_match_confidence", self.inferred_match_confidence),
            ("optional_applicability", self.optional_applicability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if !(self.weak_threshold <= self.moderate_threshold && self.moderate_threshold <= self.strong_threshold) {
            return Err("thresholds must satisfy weak <= moderate <= strong".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: claims qualify as viable sooner
    pub fn aggressive() -> Self {
        Self {
            strong_threshold: 0.7,
            moderate_threshold: 0.4,
            weak_threshold: 0.15,
            inferred_match_confidence: 0.6,
            optional_applicability: 0.85,
        }
    }

    /// Lenient preset: a claim must be nearly complete to rank strong
    pub fn lenient() -> Self {
        Self {
            strong_threshold: 0.9,
            moderate_threshold: 0.6,
            weak_threshold: 0.3,
            inferred_match_confidence: 0.4,
            optional_applicability: 0.6,
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

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strong_threshold: 0.8,
            moderate_threshold: 0.5,
            weak_threshold: 0.25,
            inferred_match_confidence: 0.5,
            optional_applicability: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(MatcherConfig::default().validate().is_ok());
        assert!(MatcherConfig::aggressive().validate().is_ok());
        assert!(MatcherConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let config = MatcherConfig {
            weak_threshold: 0.9,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MatcherConfig::aggressive();
        let parsed = MatcherConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
