//! Claim-to-law matching and viability assessment

use crate::{MatcherConfig, MatcherError};
use docket_domain::confidence::clamp_confidence;
use docket_domain::{
    AttributeValue, DependencyGraph, DependencyNode, Entity, KnowledgeGraph, LegalElement, LegalElementType, LegalGraph,
};
use docket_extractor::{ENTITY_ID_ATTRIBUTE, REQUIREMENT_KEY_ATTRIBUTE};
use std::fmt;
use tracing::{debug, info};

/// Legal-element attribute overriding how strongly a requirement applies (0.0-1.0)
pub const APPLICABILITY_ATTRIBUTE: &str = "applicability";

/// A legal requirement established for a claim
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementMatch {
    /// Dependency-graph claim node
    pub claim_id: String,
    /// Legal-graph requirement element
    pub requirement_id: String,
    /// Requirement key shared by both graphs
    pub requirement_key: String,
    /// Confidence in the match (0.0-1.0): establishing confidence times applicability
    pub confidence: f64,
    /// How strongly the legal requirement applies to the claim (0.0-1.0)
    pub applicability: f64,
    /// Established by a supporting fact rather than a satisfied requirement node
    pub inferred: bool,
}

/// A legal requirement nothing establishes yet
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRequirement {
    /// Dependency-graph claim node
    pub claim_id: String,
    /// Claim type of that claim
    pub claim_type: String,
    /// Legal-graph requirement element
    pub requirement_id: String,
    /// Requirement key
    pub requirement_key: String,
    /// Requirement name
    pub name: String,
    /// Requirement description
    pub description: String,
}

/// Per-claim view of the matching
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimMatchSummary {
    /// Dependency-graph claim node
    pub claim_id: String,
    /// Claim name
    pub claim_name: String,
    /// Claim type
    pub claim_type: String,
    /// Legal requirement element ids applying to the claim type
    pub legal_requirements: Vec<String>,
    /// The subset of `legal_requirements` that is established
    pub satisfied_requirements: Vec<String>,
}

impl ClaimMatchSummary {
    /// Established fraction of the legal requirements (0.0 when there are none)
    pub fn satisfied_fraction(&self) -> f64 {
        if self.legal_requirements.is_empty() {
            0.0
        } else {
            self.satisfied_requirements.len() as f64 / self.legal_requirements.len() as f64
        }
    }
}

/// Output of [`NeurosymbolicMatcher::match_claims_to_law`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResults {
    /// Established requirements, claim order then legal-graph order
    pub matches: Vec<RequirementMatch>,
    /// Requirements still open, same order
    pub unmatched_requirements: Vec<UnmatchedRequirement>,
    /// One summary per claim node
    pub claims: Vec<ClaimMatchSummary>,
}

impl MatchResults {
    /// Total legal requirements considered across all claims
    pub fn total_requirements(&self) -> usize {
        self.matches.len() + self.unmatched_requirements.len()
    }

    /// Unmatched share of the legal requirements (0.0 when there are none)
    pub fn matching_noise(&self) -> f64 {
        let total = self.total_requirements();
        if total == 0 {
            0.0
        } else {
            self.unmatched_requirements.len() as f64 / total as f64
        }
    }
}

/// Viability band of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Viability {
    /// Too little is established to plead the claim
    Insufficient,
    /// Some elements established
    Weak,
    /// Most elements established
    Moderate,
    /// Nearly every element established
    Strong,
}

impl Viability {
    /// Band name
    pub fn as_str(&self) -> &'static str {
        match self {
            Viability::Strong => "strong",
            Viability::Moderate => "moderate",
            Viability::Weak => "weak",
            Viability::Insufficient => "insufficient",
        }
    }

    /// Whether the band counts toward the viable total
    pub fn is_viable(&self) -> bool {
        matches!(self, Viability::Strong | Viability::Moderate)
    }
}

impl fmt::Display for Viability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viability of one claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimAssessment {
    /// Dependency-graph claim node
    pub claim_id: String,
    /// Claim name
    pub claim_name: String,
    /// Claim type
    pub claim_type: String,
    /// Band
    pub viability: Viability,
    /// Satisfied fraction weighted by mean match confidence
    pub confidence: f64,
    /// Established fraction of the legal requirements
    pub satisfied_fraction: f64,
}

/// Output of [`NeurosymbolicMatcher::assess_claim_viability`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViabilityReport {
    /// One assessment per claim, in claim order
    pub claim_assessments: Vec<ClaimAssessment>,
    /// Claims rated strong or moderate
    pub viable_count: usize,
}

/// Matches dependency-graph claims against legal-graph requirements
///
/// The symbolic join is on claim type and requirement key: a legal requirement is
/// established for a claim when the claim's requirement node with the same key is
/// satisfied. Failing that, a fact in the knowledge graph that supports the
/// claim's entity and names the requirement key establishes it with the
/// configured inferred confidence.
#[derive(Debug, Clone, Default)]
pub struct NeurosymbolicMatcher {
    config: MatcherConfig,
}

impl NeurosymbolicMatcher {
    /// Create a matcher, rejecting an invalid configuration
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherError> {
        config.validate().map_err(MatcherError::Config)?;
        Ok(Self { config })
    }

    /// Matcher configuration
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Join every claim node with the legal requirements for its claim type
    pub fn match_claims_to_law(&self, kg: &KnowledgeGraph, dg: &DependencyGraph, lg: &LegalGraph) -> MatchResults {
        let mut results = MatchResults::default();

        for claim in dg.claims() {
            let claim_type = claim.claim_type.clone().unwrap_or_else(|| "other".to_string());
            let legal: Vec<&LegalElement> = lg
                .get_requirements_for_claim_type(&claim_type)
                .into_iter()
                .filter(|e| e.element_type == LegalElementType::Requirement)
                .collect();
            let nodes = dg.requirements_for_claim(&claim.id);
            let facts: Vec<&Entity> = claim
                .attributes
                .get(ENTITY_ID_ATTRIBUTE)
                .and_then(|v| v.as_text())
                .map(|entity_id| kg.supporting_entities(entity_id))
                .unwrap_or_default();

            let mut summary = ClaimMatchSummary {
                claim_id: claim.id.clone(),
                claim_name: claim.name.clone(),
                claim_type: claim_type.clone(),
                legal_requirements: Vec::with_capacity(legal.len()),
                satisfied_requirements: Vec::new(),
            };

            for element in legal {
                let key = requirement_key(element);
                summary.legal_requirements.push(element.id.clone());

                let node = nodes.iter().find(|n| node_matches(n, &key, element));
                let established = match node {
                    Some(n) if n.is_satisfied() => Some((n.confidence, false)),
                    _ => facts
                        .iter()
                        .any(|f| f.text_attribute(REQUIREMENT_KEY_ATTRIBUTE) == Some(key.as_str()))
                        .then_some((self.config.inferred_match_confidence, true)),
                };

                match established {
                    Some((confidence, inferred)) => {
                        let applicability = self.applicability(element);
                        summary.satisfied_requirements.push(element.id.clone());
                        results.matches.push(RequirementMatch {
                            claim_id: claim.id.clone(),
                            requirement_id: element.id.clone(),
                            requirement_key: key,
                            confidence: clamp_confidence(confidence) * applicability,
                            applicability,
                            inferred,
                        });
                    }
                    None => results.unmatched_requirements.push(UnmatchedRequirement {
                        claim_id: claim.id.clone(),
                        claim_type: claim_type.clone(),
                        requirement_id: element.id.clone(),
                        requirement_key: key,
                        name: element.name.clone(),
                        description: element.description.clone(),
                    }),
                }
            }

            debug!(
                claim = %summary.claim_name,
                satisfied = summary.satisfied_requirements.len(),
                total = summary.legal_requirements.len(),
                "Matched claim to law"
            );
            results.claims.push(summary);
        }

        info!(
            claims = results.claims.len(),
            matches = results.matches.len(),
            unmatched = results.unmatched_requirements.len(),
            "Matched claims to legal requirements"
        );
        results
    }

    /// Applicability of a legal requirement: its `applicability` attribute when
    /// present, else 1.0 for required elements and the configured optional weight
    fn applicability(&self, element: &LegalElement) -> f64 {
        match element.attributes.get(APPLICABILITY_ATTRIBUTE) {
            Some(AttributeValue::Number(n)) => clamp_confidence(*n),
            _ if element.required => 1.0,
            _ => self.config.optional_applicability,
        }
    }

    /// Rate each claim by its established fraction
    ///
    /// A claim whose type has no legal requirements is insufficient.
    pub fn assess_claim_viability(&self, results: &MatchResults) -> ViabilityReport {
        let claim_assessments: Vec<ClaimAssessment> = results
            .claims
            .iter()
            .map(|summary| {
                let fraction = summary.satisfied_fraction();
                let confidences: Vec<f64> = results
                    .matches
                    .iter()
                    .filter(|m| m.claim_id == summary.claim_id)
                    .map(|m| m.confidence)
                    .collect();
                let mean_confidence = if confidences.is_empty() {
                    0.0
                } else {
                    confidences.iter().sum::<f64>() / confidences.len() as f64
                };
                ClaimAssessment {
                    claim_id: summary.claim_id.clone(),
                    claim_name: summary.claim_name.clone(),
                    claim_type: summary.claim_type.clone(),
                    viability: self.band(summary),
                    confidence: fraction * mean_confidence,
                    satisfied_fraction: fraction,
                }
            })
            .collect();

        let viable_count = claim_assessments.iter().filter(|a| a.viability.is_viable()).count();
        info!(claims = claim_assessments.len(), viable = viable_count, "Assessed claim viability");
        ViabilityReport {
            claim_assessments,
            viable_count,
        }
    }

    fn band(&self, summary: &ClaimMatchSummary) -> Viability {
        if summary.legal_requirements.is_empty() {
            return Viability::Insufficient;
        }
        let fraction = summary.satisfied_fraction();
        if fraction >= self.config.strong_threshold {
            Viability::Strong
        } else if fraction >= self.config.moderate_threshold {
            Viability::Moderate
        } else if fraction >= self.config.weak_threshold {
            Viability::Weak
        } else {
            Viability::Insufficient
        }
    }
}

fn requirement_key(element: &LegalElement) -> String {
    element
        .attributes
        .get(REQUIREMENT_KEY_ATTRIBUTE)
        .and_then(|v| v.as_text())
        .map(str::to_string)
        .unwrap_or_else(|| element.name.trim().to_lowercase().replace(' ', "_"))
}

fn node_matches(node: &DependencyNode, key: &str, element: &LegalElement) -> bool {
    match node.requirement_key.as_deref() {
        Some(k) => k == key,
        None => node.name.eq_ignore_ascii_case(&element.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::{EntityType, EvidenceRecord, Relationship, RelationshipType};
    use docket_extractor::{ClaimSpec, DependencyGraphBuilder, LegalGraphBuilder};

    fn graphs(claim_types: &[&str]) -> (KnowledgeGraph, DependencyGraph, LegalGraph) {
        let dg = DependencyGraphBuilder::default()
            .build_from_claims(&claim_types.iter().map(|t| ClaimSpec::new(*t)).collect::<Vec<_>>());
        let lg = LegalGraphBuilder::new().build_for_claim_types(claim_types, "federal");
        (KnowledgeGraph::new(), dg, lg)
    }

    fn satisfy(dg: &mut DependencyGraph, claim_type: &str, keys: &[&str]) {
        let evidence = EvidenceRecord::new("case", claim_type, "Exhibit")
            .with_confidence(0.9)
            .supporting(keys.iter().copied());
        DependencyGraphBuilder::default().add_evidence_to_graph(dg, &evidence, claim_type);
    }

    #[test]
    fn test_nothing_satisfied() {
        let (kg, dg, lg) = graphs(&["discrimination"]);
        let matcher = NeurosymbolicMatcher::default();
        let results = matcher.match_claims_to_law(&kg, &dg, &lg);

        assert!(results.matches.is_empty());
        assert_eq!(results.unmatched_requirements.len(), 3);
        assert_eq!(results.claims[0].legal_requirements.len(), 3);
        assert_eq!(results.matching_noise(), 1.0);
        // Procedural requirements are not claim elements
        assert!(results
            .unmatched_requirements
            .iter()
            .all(|u| u.requirement_id.starts_with("req:discrimination:")));

        let report = matcher.assess_claim_viability(&results);
        assert_eq!(report.claim_assessments[0].viability, Viability::Insufficient);
        assert_eq!(report.viable_count, 0);
    }

    #[test]
    fn test_partial_and_full_satisfaction() {
        let (kg, mut dg, lg) = graphs(&["discrimination", "retaliation"]);
        satisfy(&mut dg, "discrimination", &["protected_class", "adverse_action", "causal_connection"]);
        satisfy(&mut dg, "retaliation", &["protected_activity"]);

        let matcher = NeurosymbolicMatcher::default();
        let results = matcher.match_claims_to_law(&kg, &dg, &lg);
        assert_eq!(results.matches.len(), 4);
        assert_eq!(results.unmatched_requirements.len(), 2);
        assert!(results.matches.iter().all(|m| !m.inferred && (m.confidence - 0.9).abs() < 1e-9));

        let report = matcher.assess_claim_viability(&results);
        let bands: Vec<_> = report.claim_assessments.iter().map(|a| a.viability).collect();
        assert_eq!(bands, vec![Viability::Strong, Viability::Weak]);
        assert_eq!(report.viable_count, 1);
        assert!((report.claim_assessments[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_viability_is_monotone_in_satisfied_fraction() {
        let keys = ["contract_existence", "plaintiff_performance", "defendant_breach", "damages"];
        let matcher = NeurosymbolicMatcher::default();
        let mut previous = Viability::Insufficient;
        for n in 0..=keys.len() {
            let (kg, mut dg, lg) = graphs(&["breach_of_contract"]);
            if n > 0 {
                satisfy(&mut dg, "breach_of_contract", &keys[..n]);
            }
            let report = matcher.assess_claim_viability(&matcher.match_claims_to_law(&kg, &dg, &lg));
            let band = report.claim_assessments[0].viability;
            assert!(band >= previous, "{} satisfied gave {} after {}", n, band, previous);
            previous = band;
        }
        assert_eq!(previous, Viability::Strong);
    }

    #[test]
    fn test_supporting_fact_infers_requirement() {
        let mut kg = KnowledgeGraph::new();
        let claim_entity = kg.add_entity(Entity::new(EntityType::Claim, "Retaliation").with_attribute("claim_type", "retaliation"));
        let fact = kg.add_entity(
            Entity::new(EntityType::Fact, "Filed an HR complaint in March")
                .with_attribute(REQUIREMENT_KEY_ATTRIBUTE, "protected_activity"),
        );
        kg.add_relationship(Relationship::new(&fact, &claim_entity, RelationshipType::Supports));

        let dg = DependencyGraphBuilder::default().build_from_knowledge_graph(&kg);
        let lg = LegalGraphBuilder::new().build_for_claim_types(&["retaliation"], "federal");
        let results = NeurosymbolicMatcher::default().match_claims_to_law(&kg, &dg, &lg);

        assert_eq!(results.matches.len(), 1);
        assert!(results.matches[0].inferred);
        assert_eq!(results.matches[0].requirement_key, "protected_activity");
        assert_eq!(results.matches[0].confidence, 0.5);
    }

    #[test]
    fn test_match_confidence_scales_with_applicability() {
        let (kg, mut dg, lg) = graphs(&["retaliation"]);
        satisfy(&mut dg, "retaliation", &["protected_activity", "adverse_action", "causal_connection"]);

        let elements = lg.elements().cloned().map(|e| {
            if e.id.ends_with(":protected_activity") {
                e.with_attribute(APPLICABILITY_ATTRIBUTE, 0.5)
            } else if e.id.ends_with(":adverse_action") {
                e.with_required(false)
            } else {
                e
            }
        });
        let lg = LegalGraph::from_parts(lg.metadata().clone(), elements.collect::<Vec<_>>(), lg.relations().cloned().collect::<Vec<_>>());
        let ids = ["protected_activity", "adverse_action", "causal_connection"]
            .map(|key| format!("req:retaliation:{key}"));

        let results = NeurosymbolicMatcher::default().match_claims_to_law(&kg, &dg, &lg);
        let confidence_of = |id: &str| {
            results
                .matches
                .iter()
                .find(|m| m.requirement_id == id)
                .map(|m| (m.confidence, m.applicability))
                .unwrap()
        };

        let (c0, a0) = confidence_of(&ids[0]);
        assert_eq!(a0, 0.5);
        assert!((c0 - 0.45).abs() < 1e-9);

        let (c1, a1) = confidence_of(&ids[1]);
        assert_eq!(a1, 0.75);
        assert!((c1 - 0.675).abs() < 1e-9);

        let (c2, a2) = confidence_of(&ids[2]);
        assert_eq!(a2, 1.0);
        assert!((c2 - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_claim_type_without_law_is_insufficient() {
        let (kg, mut dg, _) = graphs(&["defamation"]);
        satisfy(&mut dg, "defamation", &["factual_basis", "damages"]);
        let matcher = NeurosymbolicMatcher::default();
        let results = matcher.match_claims_to_law(&kg, &dg, &LegalGraph::new());

        assert!(results.claims[0].legal_requirements.is_empty());
        assert_eq!(results.matching_noise(), 0.0);
        let report = matcher.assess_claim_viability(&results);
        assert_eq!(report.claim_assessments[0].viability, Viability::Insufficient);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatcherConfig {
            strong_threshold: 1.2,
            ..MatcherConfig::default()
        };
        assert!(matches!(NeurosymbolicMatcher::new(config), Err(MatcherError::Config(_))));
    }
}
