//! Pipeline configuration

use docket_denoiser::DenoiserConfig;
use docket_extractor::ExtractorConfig;
use docket_matcher::MatcherConfig;
use serde::{Deserialize, Serialize};

/// Phase thresholds, turn sizing, and the component configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// INTAKE is complete once the noise level drops below this
    pub intake_noise_threshold: f64,

    /// EVIDENCE is complete once the share of requirements without evidence
    /// drops below this
    pub evidence_gap_threshold: f64,

    /// FORMALIZATION is complete once the unmatched share of legal
    /// requirements drops below this
    pub matching_noise_threshold: f64,

    /// Trailing iterations inspected by `has_converged`
    pub convergence_window: usize,

    /// Every iteration in the window must be below this to count as converged
    pub convergence_threshold: f64,

    /// Questions offered per turn
    pub questions_per_turn: usize,

    /// Extra questions per turn while the denoiser is stagnating
    pub stagnation_widening: usize,

    /// Upper bound on questions per turn
    pub max_questions_per_turn: usize,

    /// Jurisdiction for rules of procedure and the complaint caption
    pub jurisdiction: String,

    /// Graph builder configuration
    pub extractor: ExtractorConfig,

    /// Denoiser configuration
    pub denoiser: DenoiserConfig,

    /// Matcher configuration
    pub matcher: MatcherConfig,
}

impl PipelineConfig {
    /// Validate this configuration and every nested one
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("intake_noise_threshold", self.intake_noise_threshold),
            ("evidence_gap_threshold", self.evidence_gap_threshold),
            ("matching_noise_threshold", self.matching_noise_threshold),
            ("convergence_threshold", self.convergence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.convergence_window == 0 {
            return Err("convergence_window must be greater than 0".to_string());
        }
        if self.questions_per_turn == 0 {
            return Err("questions_per_turn must be greater than 0".to_string());
        }
        if self.max_questions_per_turn < self.questions_per_turn {
            return Err("max_questions_per_turn must be at least questions_per_turn".to_string());
        }
        if self.jurisdiction.trim().is_empty() {
            return Err("jurisdiction must not be empty".to_string());
        }
        self.extractor.validate().map_err(|e| format!("extractor: {}", e))?;
        self.denoiser.validate().map_err(|e| format!("denoiser: {}", e))?;
        self.matcher.validate().map_err(|e| format!("matcher: {}", e))?;
        Ok(())
    }

    /// Aggressive preset: loose thresholds, short interviews
    pub fn aggressive() -> Self {
        Self {
            intake_noise_threshold: 0.45,
            evidence_gap_threshold: 0.5,
            matching_noise_threshold: 0.4,
            convergence_window: 2,
            questions_per_turn: 2,
            stagnation_widening: 1,
            max_questions_per_turn: 4,
            extractor: ExtractorConfig::aggressive(),
            denoiser: DenoiserConfig::aggressive(),
            matcher: MatcherConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Lenient preset: strict thresholds, long interviews
    pub fn lenient() -> Self {
        Self {
            intake_noise_threshold: 0.2,
            evidence_gap_threshold: 0.2,
            matching_noise_threshold: 0.1,
            convergence_window: 5,
            questions_per_turn: 4,
            stagnation_widening: 3,
            max_questions_per_turn: 10,
            extractor: ExtractorConfig::lenient(),
            denoiser: DenoiserConfig::lenient(),
            matcher: MatcherConfig::lenient(),
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

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intake_noise_threshold: 0.3,
            evidence_gap_threshold: 0.3,
            matching_noise_threshold: 0.2,
            convergence_window: 3,
            convergence_threshold: 0.3,
            questions_per_turn: 3,
            stagnation_widening: 2,
            max_questions_per_turn: 8,
            jurisdiction: "federal".to_string(),
            extractor: ExtractorConfig::default(),
            denoiser: DenoiserConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::aggressive().validate().is_ok());
        assert!(PipelineConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let mut config = PipelineConfig::default();
        config.matcher.weak_threshold = 0.95;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("matcher:"), "{}", err);
    }

    #[test]
    fn test_turn_bounds() {
        let config = PipelineConfig {
            questions_per_turn: 5,
            max_questions_per_turn: 4,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_sections() {
        let toml = r#"
            jurisdiction = "california"
            intake_noise_threshold = 0.25

            [denoiser.exploration]
            seed = 99
        "#;
        let config = PipelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.jurisdiction, "california");
        assert_eq!(config.denoiser.exploration.seed, 99);
        assert_eq!(config.matcher, MatcherConfig::default());
        let round = PipelineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(round, config);
    }
}
