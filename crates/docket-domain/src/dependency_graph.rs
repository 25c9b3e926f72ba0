//! Dependency graph - claims and the requirements each must satisfy

use crate::attribute::{AttributeValue, Attributes};
use crate::confidence::clamp_confidence;
use crate::metadata::{new_id, GraphMetadata};
use indexmap::IndexMap;

/// Kind of dependency node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A legal claim
    Claim,
    /// Something a claim needs in order to stand
    Requirement,
}

impl NodeType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Claim => "claim",
            NodeType::Requirement => "requirement",
        }
    }

    /// Parse a type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "claim" => Some(NodeType::Claim),
            "requirement" => Some(NodeType::Requirement),
            _ => None,
        }
    }
}

/// A claim or requirement node
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyNode {
    /// Identifier, unique within the graph
    pub id: String,

    /// Claim or requirement
    pub node_type: NodeType,

    /// Display name
    pub name: String,

    /// Longer description
    pub description: String,

    /// Claim type (claims only), e.g. "discrimination"
    pub claim_type: Option<String>,

    /// Symbolic requirement key (requirements only), e.g. "protected_class"
    pub requirement_key: Option<String>,

    /// Satisfaction state: `Some(true)`, `Some(false)` or unknown
    pub satisfied: Option<bool>,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Evidence attached to this node
    pub evidence_ids: Vec<String>,

    /// Open attribute bag
    pub attributes: Attributes,
}

impl DependencyNode {
    /// Create a claim node
    pub fn claim(name: impl Into<String>, claim_type: impl Into<String>) -> Self {
        Self {
            id: new_id("claim"),
            node_type: NodeType::Claim,
            name: name.into(),
            description: String::new(),
            claim_type: Some(claim_type.into()),
            requirement_key: None,
            satisfied: None,
            confidence: 1.0,
            evidence_ids: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Create an unsatisfied requirement node
    pub fn requirement(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: new_id("req"),
            node_type: NodeType::Requirement,
            name: name.into(),
            description: String::new(),
            claim_type: None,
            requirement_key: Some(key.into()),
            satisfied: Some(false),
            confidence: 0.0,
            evidence_ids: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the satisfaction state
    pub fn with_satisfied(mut self, satisfied: Option<bool>) -> Self {
        self.satisfied = satisfied;
        self
    }

    /// Set the confidence (clamped)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether this requirement is satisfied
    pub fn is_satisfied(&self) -> bool {
        self.satisfied == Some(true)
    }
}

/// Claim → requirement edge
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Identifier, unique within the graph
    pub id: String,

    /// Claim node id
    pub source_id: String,

    /// Requirement node id
    pub target_id: String,

    /// Whether the requirement is mandatory for the claim
    pub required: bool,
}

/// Readiness of a single claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimReadiness {
    /// Claim node id
    pub claim_id: String,
    /// Claim display name
    pub claim_name: String,
    /// Satisfied requirement count
    pub satisfied: usize,
    /// Total requirement count
    pub total: usize,
    /// `satisfied / total`, or 1.0 when the claim has no requirements
    pub readiness: f64,
}

/// Readiness of every claim plus the overall mean
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessReport {
    /// Per-claim readiness, claim insertion order
    pub claims: Vec<ClaimReadiness>,
    /// Mean readiness across claims (0.0 with no claims)
    pub overall_readiness: f64,
}

/// Counts describing a dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraphSummary {
    /// Claim nodes
    pub total_claims: usize,
    /// Requirement nodes
    pub total_requirements: usize,
    /// Satisfied requirement nodes
    pub satisfied_requirements: usize,
    /// Overall readiness
    pub overall_readiness: f64,
}

/// Claims and their requirements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<String, DependencyNode>,
    dependencies: IndexMap<String, Dependency>,
    metadata: GraphMetadata,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts
    pub fn from_parts(
        metadata: GraphMetadata,
        nodes: impl IntoIterator<Item = DependencyNode>,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            dependencies: dependencies.into_iter().map(|d| (d.id.clone(), d)).collect(),
            metadata,
        }
    }

    /// Graph metadata
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Insert a node and return its id (duplicate ids are regenerated)
    pub fn add_node(&mut self, mut node: DependencyNode) -> String {
        if node.id.is_empty() || self.nodes.contains_key(&node.id) {
            node.id = new_id(node.node_type.as_str());
        }
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.metadata.touch();
        id
    }

    /// Link a claim to a requirement and return the dependency id
    pub fn add_dependency(&mut self, claim_id: &str, requirement_id: &str, required: bool) -> String {
        let id = new_id("dep");
        self.dependencies.insert(
            id.clone(),
            Dependency {
                id: id.clone(),
                source_id: claim_id.to_string(),
                target_id: requirement_id.to_string(),
                required,
            },
        );
        self.metadata.touch();
        id
    }

    /// Add a requirement node under a claim; returns the requirement id
    pub fn add_requirement(&mut self, claim_id: &str, requirement: DependencyNode, required: bool) -> String {
        let requirement_id = self.add_node(requirement);
        self.add_dependency(claim_id, &requirement_id, required);
        requirement_id
    }

    /// Look up a node
    pub fn get_node(&self, id: &str) -> Option<&DependencyNode> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.values()
    }

    /// All dependencies in insertion order
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.values()
    }

    /// Claim nodes in insertion order
    pub fn claims(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.values().filter(|n| n.node_type == NodeType::Claim)
    }

    /// Requirement nodes in insertion order
    pub fn requirements(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.values().filter(|n| n.node_type == NodeType::Requirement)
    }

    /// Requirement nodes of one claim, dependency insertion order
    pub fn requirements_for_claim(&self, claim_id: &str) -> Vec<&DependencyNode> {
        self.dependencies
            .values()
            .filter(|d| d.source_id == claim_id)
            .filter_map(|d| self.nodes.get(&d.target_id))
            .filter(|n| n.node_type == NodeType::Requirement)
            .collect()
    }

    /// The claim a requirement belongs to
    pub fn claim_for_requirement(&self, requirement_id: &str) -> Option<&DependencyNode> {
        self.dependencies
            .values()
            .find(|d| d.target_id == requirement_id)
            .and_then(|d| self.nodes.get(&d.source_id))
            .filter(|n| n.node_type == NodeType::Claim)
    }

    /// Requirement nodes whose satisfaction is false or unknown
    pub fn find_unsatisfied_requirements(&self) -> Vec<&DependencyNode> {
        self.requirements().filter(|n| !n.is_satisfied()).collect()
    }

    /// Mark a requirement satisfied
    ///
    /// Returns `true` when the node changed state, `false` if it was already
    /// satisfied or is not a requirement.
    pub fn satisfy_requirement(&mut self, requirement_id: &str, confidence: f64) -> bool {
        let Some(node) = self.nodes.get_mut(requirement_id) else {
            return false;
        };
        if node.node_type != NodeType::Requirement || node.is_satisfied() {
            return false;
        }
        node.satisfied = Some(true);
        node.confidence = node.confidence.max(clamp_confidence(confidence));
        self.metadata.touch();
        true
    }

    /// Record evidence against a node without changing its satisfaction
    pub fn attach_evidence(&mut self, node_id: &str, evidence_id: &str) -> bool {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return false;
        };
        if !node.evidence_ids.iter().any(|e| e == evidence_id) {
            node.evidence_ids.push(evidence_id.to_string());
            self.metadata.touch();
        }
        true
    }

    /// Set an attribute on a node; `None` when the node does not exist
    pub fn set_node_attribute(
        &mut self,
        node_id: &str,
        key: &str,
        value: AttributeValue,
    ) -> Option<Option<AttributeValue>> {
        let node = self.nodes.get_mut(node_id)?;
        let previous = node.attributes.insert(key.to_string(), value);
        self.metadata.touch();
        Some(previous)
    }

    /// Per-claim and overall readiness
    ///
    /// A claim without requirement nodes counts as fully ready.
    pub fn get_claim_readiness(&self) -> ReadinessReport {
        let claims: Vec<ClaimReadiness> = self
            .claims()
            .map(|claim| {
                let requirements = self.requirements_for_claim(&claim.id);
                let total = requirements.len();
                let satisfied = requirements.iter().filter(|r| r.is_satisfied()).count();
                let readiness = if total == 0 {
                    1.0
                } else {
                    satisfied as f64 / total as f64
                };
                ClaimReadiness {
                    claim_id: claim.id.clone(),
                    claim_name: claim.name.clone(),
                    satisfied,
                    total,
                    readiness,
                }
            })
            .collect();

        let overall_readiness = if claims.is_empty() {
            0.0
        } else {
            claims.iter().map(|c| c.readiness).sum::<f64>() / claims.len() as f64
        };

        ReadinessReport {
            claims,
            overall_readiness,
        }
    }

    /// Summary counts
    pub fn summary(&self) -> DependencyGraphSummary {
        DependencyGraphSummary {
            total_claims: self.claims().count(),
            total_requirements: self.requirements().count(),
            satisfied_requirements: self.requirements().filter(|r| r.is_satisfied()).count(),
            overall_readiness: self.get_claim_readiness().overall_readiness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_claim(requirements: usize) -> (DependencyGraph, String, Vec<String>) {
        let mut dg = DependencyGraph::new();
        let claim_id = dg.add_node(DependencyNode::claim("Retaliation", "retaliation"));
        let reqs = (0..requirements)
            .map(|i| dg.add_requirement(&claim_id, DependencyNode::requirement(format!("R{}", i), format!("r{}", i)), true))
            .collect();
        (dg, claim_id, reqs)
    }

    #[test]
    fn test_claim_without_requirements_is_fully_ready() {
        let (dg, _, _) = graph_with_claim(0);
        let report = dg.get_claim_readiness();
        assert_eq!(report.claims.len(), 1);
        assert_eq!(report.claims[0].total, 0);
        assert_eq!(report.claims[0].readiness, 1.0);
        assert_eq!(report.overall_readiness, 1.0);
    }

    #[test]
    fn test_readiness_fraction_and_mean() {
        let (mut dg, _, reqs) = graph_with_claim(4);
        dg.satisfy_requirement(&reqs[0], 0.9);

        let other = dg.add_node(DependencyNode::claim("Empty", "other"));
        assert!(dg.requirements_for_claim(&other).is_empty());

        let report = dg.get_claim_readiness();
        assert_eq!(report.claims[0].readiness, 0.25);
        assert_eq!(report.claims[1].readiness, 1.0);
        assert!((report.overall_readiness - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_unsatisfied_includes_unknown() {
        let (mut dg, claim_id, reqs) = graph_with_claim(2);
        dg.add_requirement(
            &claim_id,
            DependencyNode::requirement("Unknown", "unknown").with_satisfied(None),
            false,
        );
        dg.satisfy_requirement(&reqs[1], 0.8);

        let unsatisfied: Vec<_> = dg.find_unsatisfied_requirements().iter().map(|n| n.name.clone()).collect();
        assert_eq!(unsatisfied, vec!["R0".to_string(), "Unknown".to_string()]);
    }

    #[test]
    fn test_satisfy_is_idempotent() {
        let (mut dg, _, reqs) = graph_with_claim(1);
        assert!(dg.satisfy_requirement(&reqs[0], 0.7));
        assert!(!dg.satisfy_requirement(&reqs[0], 0.9));
        assert_eq!(dg.get_node(&reqs[0]).unwrap().confidence, 0.7);
    }

    #[test]
    fn test_claim_for_requirement() {
        let (dg, claim_id, reqs) = graph_with_claim(1);
        assert_eq!(dg.claim_for_requirement(&reqs[0]).map(|c| c.id.clone()), Some(claim_id));
    }

    #[test]
    fn test_no_claims_means_zero_overall() {
        let dg = DependencyGraph::new();
        assert_eq!(dg.get_claim_readiness().overall_readiness, 0.0);
    }
}
