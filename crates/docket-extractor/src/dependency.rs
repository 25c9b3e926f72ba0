//! Dependency graph builder

use crate::catalog::{self, requirements_for};
use crate::config::ExtractorConfig;
use docket_domain::{
    DependencyGraph, DependencyNode, Entity, EntityType, EvidenceRecord, KnowledgeGraph, NodeType,
};
use tracing::{debug, info, warn};

/// Attribute linking a claim node back to its knowledge-graph entity
pub const ENTITY_ID_ATTRIBUTE: &str = "entity_id";

/// A claim to place in the dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSpec {
    /// Display name
    pub name: String,
    /// Claim type, e.g. "retaliation"
    pub claim_type: String,
    /// Description (may be empty)
    pub description: String,
    /// Knowledge-graph entity the claim came from
    pub entity_id: Option<String>,
}

impl ClaimSpec {
    /// Claim with the catalog display name for its type
    pub fn new(claim_type: impl Into<String>) -> Self {
        let claim_type = claim_type.into();
        Self {
            name: catalog::display_name(&claim_type),
            claim_type,
            description: String::new(),
            entity_id: None,
        }
    }

    /// Claim taken from a knowledge-graph claim entity
    ///
    /// The claim type comes from the `claim_type` attribute, falling back to the
    /// entity name in snake case.
    pub fn from_entity(entity: &Entity) -> Self {
        let claim_type = entity
            .text_attribute("claim_type")
            .map(str::to_string)
            .unwrap_or_else(|| entity.name.trim().to_lowercase().replace(' ', "_"));
        Self {
            name: entity.name.clone(),
            claim_type,
            description: entity.text_attribute("description").unwrap_or_default().to_string(),
            entity_id: Some(entity.id.clone()),
        }
    }
}

/// Outcome of applying one evidence record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceApplication {
    /// Claim node the evidence was attached to; `None` when the claim was not found
    pub claim_id: Option<String>,
    /// Requirement nodes that became satisfied
    pub satisfied: Vec<String>,
    /// Whether the evidence met the confidence threshold
    pub met_threshold: bool,
}

/// Builds and updates dependency graphs
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    config: ExtractorConfig,
}

impl DependencyGraphBuilder {
    /// Create a builder
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// One claim node per claim, each with unsatisfied requirement nodes
    pub fn build_from_claims(&self, claims: &[ClaimSpec]) -> DependencyGraph {
        let mut dg = DependencyGraph::new();
        for claim in claims {
            self.add_claim(&mut dg, claim);
        }
        info!(
            claims = claims.len(),
            requirements = dg.requirements().count(),
            "Built dependency graph"
        );
        dg
    }

    /// Build from every claim entity in a knowledge graph
    pub fn build_from_knowledge_graph(&self, kg: &KnowledgeGraph) -> DependencyGraph {
        let claims: Vec<ClaimSpec> = kg
            .get_entities_by_type(EntityType::Claim)
            .into_iter()
            .map(ClaimSpec::from_entity)
            .collect();
        self.build_from_claims(&claims)
    }

    /// Add claim nodes for knowledge-graph claims not yet in the dependency graph
    ///
    /// Returns the new claim node ids.
    pub fn sync_with_knowledge_graph(&self, dg: &mut DependencyGraph, kg: &KnowledgeGraph) -> Vec<String> {
        let mut added = Vec::new();
        for entity in kg.get_entities_by_type(EntityType::Claim) {
            if resolve_claim(dg, &entity.id).is_none() {
                added.push(self.add_claim(dg, &ClaimSpec::from_entity(entity)));
            }
        }
        if !added.is_empty() {
            debug!(added = added.len(), "Synchronised new claims into dependency graph");
        }
        added
    }

    fn add_claim(&self, dg: &mut DependencyGraph, claim: &ClaimSpec) -> String {
        let mut node = DependencyNode::claim(&claim.name, &claim.claim_type).with_description(&claim.description);
        if let Some(entity_id) = &claim.entity_id {
            node = node.with_attribute(ENTITY_ID_ATTRIBUTE, entity_id.as_str());
        }
        let claim_id = dg.add_node(node);

        for template in requirements_for(&claim.claim_type) {
            let requirement = DependencyNode::requirement(template.name, template.key)
                .with_description(template.description)
                .with_attribute("claim_type", claim.claim_type.as_str());
            dg.add_requirement(&claim_id, requirement, true);
        }
        claim_id
    }

    /// Attach evidence to a claim and satisfy requirements it supports
    ///
    /// Evidence below the confidence threshold is recorded on the claim node but
    /// satisfies nothing. At or above it, the evidence satisfies the requirements
    /// named in [`EvidenceRecord::supports`], or the claim's first unsatisfied
    /// requirement when it names none. An unknown claim is a no-op.
    pub fn add_evidence_to_graph(
        &self,
        dg: &mut DependencyGraph,
        evidence: &EvidenceRecord,
        claim_ref: &str,
    ) -> EvidenceApplication {
        let Some(claim_id) = resolve_claim(dg, claim_ref) else {
            warn!(claim = claim_ref, evidence_id = %evidence.id, "Evidence refers to unknown claim");
            return EvidenceApplication::default();
        };
        dg.attach_evidence(&claim_id, &evidence.id);

        let met_threshold = evidence.confidence >= self.config.evidence_threshold;
        let mut application = EvidenceApplication {
            claim_id: Some(claim_id.clone()),
            satisfied: Vec::new(),
            met_threshold,
        };
        if !met_threshold {
            debug!(
                evidence_id = %evidence.id,
                confidence = evidence.confidence,
                threshold = self.config.evidence_threshold,
                "Evidence below threshold"
            );
            return application;
        }

        let targets: Vec<String> = {
            let requirements = dg.requirements_for_claim(&claim_id);
            if evidence.supports.is_empty() {
                requirements
                    .iter()
                    .find(|r| !r.is_satisfied())
                    .map(|r| vec![r.id.clone()])
                    .unwrap_or_default()
            } else {
                requirements
                    .iter()
                    .filter(|r| {
                        r.requirement_key
                            .as_deref()
                            .is_some_and(|k| evidence.supports.iter().any(|s| s == k))
                    })
                    .map(|r| r.id.clone())
                    .collect()
            }
        };

        for requirement_id in targets {
            dg.attach_evidence(&requirement_id, &evidence.id);
            if dg.satisfy_requirement(&requirement_id, evidence.confidence) {
                application.satisfied.push(requirement_id);
            }
        }

        info!(
            evidence_id = %evidence.id,
            satisfied = application.satisfied.len(),
            "Applied evidence to dependency graph"
        );
        application
    }
}

/// Find a claim node by node id, linked entity id, or claim type (first match)
pub fn resolve_claim(dg: &DependencyGraph, reference: &str) -> Option<String> {
    if let Some(node) = dg.get_node(reference) {
        if node.node_type == NodeType::Claim {
            return Some(node.id.clone());
        }
    }
    dg.claims()
        .find(|c| c.attributes.get(ENTITY_ID_ATTRIBUTE).and_then(|v| v.as_text()) == Some(reference))
        .or_else(|| dg.claims().find(|c| c.claim_type.as_deref() == Some(reference)))
        .map(|c| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retaliation_graph() -> (DependencyGraphBuilder, DependencyGraph, String) {
        let builder = DependencyGraphBuilder::default();
        let dg = builder.build_from_claims(&[ClaimSpec::new("retaliation")]);
        let claim_id = dg.claims().next().unwrap().id.clone();
        (builder, dg, claim_id)
    }

    #[test]
    fn test_build_from_claims_creates_unsatisfied_requirements() {
        let builder = DependencyGraphBuilder::default();
        let dg = builder.build_from_claims(&[ClaimSpec::new("discrimination"), ClaimSpec::new("defamation")]);

        assert_eq!(dg.claims().count(), 2);
        let claim_ids: Vec<_> = dg.claims().map(|c| c.id.clone()).collect();
        let keys: Vec<_> = dg
            .requirements_for_claim(&claim_ids[0])
            .iter()
            .filter_map(|r| r.requirement_key.clone())
            .collect();
        assert_eq!(keys, vec!["protected_class", "adverse_action", "causal_connection"]);
        assert_eq!(dg.requirements_for_claim(&claim_ids[1]).len(), 2);
        assert_eq!(dg.find_unsatisfied_requirements().len(), 5);
        assert_eq!(dg.get_claim_readiness().overall_readiness, 0.0);
    }

    #[test]
    fn test_evidence_satisfies_named_requirement() {
        let (builder, mut dg, claim_id) = retaliation_graph();
        let evidence = EvidenceRecord::new("case", &claim_id, "Termination letter")
            .with_confidence(0.9)
            .supporting(["adverse_action"]);

        let applied = builder.add_evidence_to_graph(&mut dg, &evidence, &claim_id);
        assert_eq!(applied.satisfied.len(), 1);
        let satisfied = dg.get_node(&applied.satisfied[0]).unwrap();
        assert_eq!(satisfied.requirement_key.as_deref(), Some("adverse_action"));
        assert!(satisfied.evidence_ids.contains(&evidence.id));
        assert!(dg.get_node(&claim_id).unwrap().evidence_ids.contains(&evidence.id));
    }

    #[test]
    fn test_evidence_without_targets_satisfies_first_open_requirement() {
        let (builder, mut dg, claim_id) = retaliation_graph();
        let first = EvidenceRecord::new("case", &claim_id, "HR email");
        let second = EvidenceRecord::new("case", &claim_id, "Witness");

        let a = builder.add_evidence_to_graph(&mut dg, &first, "retaliation");
        let b = builder.add_evidence_to_graph(&mut dg, &second, "retaliation");
        let key = |id: &str| dg.get_node(id).unwrap().requirement_key.clone().unwrap();
        assert_eq!(key(&a.satisfied[0]), "protected_activity");
        assert_eq!(key(&b.satisfied[0]), "adverse_action");
    }

    #[test]
    fn test_evidence_below_threshold_satisfies_nothing() {
        let (builder, mut dg, claim_id) = retaliation_graph();
        let weak = EvidenceRecord::new("case", &claim_id, "Rumour").with_confidence(0.2);

        let applied = builder.add_evidence_to_graph(&mut dg, &weak, &claim_id);
        assert!(!applied.met_threshold);
        assert!(applied.satisfied.is_empty());
        assert_eq!(dg.find_unsatisfied_requirements().len(), 3);
        assert_eq!(dg.get_node(&claim_id).unwrap().evidence_ids.len(), 1);
    }

    #[test]
    fn test_unknown_claim_is_noop() {
        let (builder, mut dg, _) = retaliation_graph();
        let before = dg.clone();
        let evidence = EvidenceRecord::new("case", "nope", "Anything");
        let applied = builder.add_evidence_to_graph(&mut dg, &evidence, "nope");
        assert_eq!(applied, EvidenceApplication::default());
        assert_eq!(dg.nodes().count(), before.nodes().count());
        assert_eq!(dg.find_unsatisfied_requirements().len(), 3);
    }

    #[test]
    fn test_sync_with_knowledge_graph() {
        let builder = DependencyGraphBuilder::default();
        let mut kg = KnowledgeGraph::new();
        let claim_entity = kg.add_entity(
            Entity::new(EntityType::Claim, "Harassment").with_attribute("claim_type", "harassment"),
        );
        let mut dg = builder.build_from_knowledge_graph(&kg);
        assert!(resolve_claim(&dg, &claim_entity).is_some());

        kg.add_entity(Entity::new(EntityType::Claim, "Wage Violation"));
        let added = builder.sync_with_knowledge_graph(&mut dg, &kg);
        assert_eq!(added.len(), 1);
        assert_eq!(dg.get_node(&added[0]).unwrap().claim_type.as_deref(), Some("wage_violation"));
        assert!(builder.sync_with_knowledge_graph(&mut dg, &kg).is_empty());
    }
}
