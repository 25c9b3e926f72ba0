//! Configuration for the graph builders

use serde::{Deserialize, Serialize};

/// Configuration shared by the knowledge, dependency and legal graph builders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum narrative length (characters); longer input is truncated
    pub max_text_length: usize,

    /// Ask the backend for entities when one is available
    pub llm_extraction: bool,

    /// Confidence assigned to keyword-derived entities
    pub heuristic_confidence: f64,

    /// Confidence assigned to entities taken from answers
    pub answer_confidence: f64,

    /// Minimum evidence confidence required to satisfy a requirement
    pub evidence_threshold: f64,

    /// Upper bound on entities accepted from one model response
    pub max_llm_entities: usize,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        for (name, value) in [
            ("heuristic_confidence", self.heuristic_confidence),
            ("answer_confidence", self.answer_confidence),
            ("evidence_threshold", self.evidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.max_llm_entities == 0 {
            return Err("max_llm_entities must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: low evidence bar, shorter input
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 20_000,
            llm_extraction: true,
            heuristic_confidence: 0.7,
            answer_confidence: 0.85,
            evidence_threshold: 0.3,
            max_llm_entities: 50,
        }
    }

    /// Lenient preset: long input, strict evidence bar
    pub fn lenient() -> Self {
        Self {
            max_text_length: 100_000,
            llm_extraction: true,
            heuristic_confidence: 0.5,
            answer_confidence: 0.75,
            evidence_threshold: 0.7,
            max_llm_entities: 200,
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

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            llm_extraction: true,
            heuristic_confidence: 0.6,
            answer_confidence: 0.8,
            evidence_threshold: 0.5,
            max_llm_entities: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let config = ExtractorConfig {
            evidence_threshold: 1.5,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_max_text_length() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("evidence_threshold = 0.9").unwrap();
        assert_eq!(parsed.evidence_threshold, 0.9);
        assert_eq!(parsed.max_text_length, ExtractorConfig::default().max_text_length);
    }
}
