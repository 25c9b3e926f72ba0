//! Legal graph - statutes, requirements and their relations, plus analytics
//!
//! The analytics below are consumed by reporting and pinned by tests. Two of them
//! apply undirected formulas to directed relations on purpose:
//! [`LegalGraph::average_relations_per_element`] halves the incident count because
//! each relation is counted at both endpoints, and [`LegalGraph::graph_density`]
//! divides by the undirected pair count `N·(N−1)/2`.

use crate::legal::{LegalElement, LegalElementType, LegalRelation, LegalRelationType};
use crate::metadata::{new_id, GraphMetadata};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Requirement coverage statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementsCoverage {
    /// Requirement and procedural-requirement elements
    pub total_requirements: usize,
    /// Distinct claim types referenced by those requirements
    pub claim_types_covered: usize,
    /// Σ |applicable_claim_types| over requirements ÷ `claim_types_covered`
    pub avg_requirements_per_claim: f64,
}

/// Domain-independent legal knowledge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegalGraph {
    elements: IndexMap<String, LegalElement>,
    relations: IndexMap<String, LegalRelation>,
    metadata: GraphMetadata,
}

impl LegalGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts
    pub fn from_parts(
        metadata: GraphMetadata,
        elements: impl IntoIterator<Item = LegalElement>,
        relations: impl IntoIterator<Item = LegalRelation>,
    ) -> Self {
        Self {
            elements: elements.into_iter().map(|e| (e.id.clone(), e)).collect(),
            relations: relations.into_iter().map(|r| (r.id.clone(), r)).collect(),
            metadata,
        }
    }

    /// Graph metadata
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Insert an element, refresh `last_updated`, return the id
    pub fn add_element(&mut self, mut element: LegalElement) -> String {
        if element.id.is_empty() || self.elements.contains_key(&element.id) {
            element.id = new_id(element.element_type.as_str());
        }
        let id = element.id.clone();
        self.elements.insert(id.clone(), element);
        self.metadata.touch();
        id
    }

    /// Insert a relation, refresh `last_updated`, return the id
    pub fn add_relation(&mut self, mut relation: LegalRelation) -> String {
        if relation.id.is_empty() || self.relations.contains_key(&relation.id) {
            relation.id = new_id("lrel");
        }
        let id = relation.id.clone();
        self.relations.insert(id.clone(), relation);
        self.metadata.touch();
        id
    }

    /// Look up an element
    pub fn get_element(&self, id: &str) -> Option<&LegalElement> {
        self.elements.get(id)
    }

    /// Elements in insertion order
    pub fn elements(&self) -> impl Iterator<Item = &LegalElement> {
        self.elements.values()
    }

    /// Relations in insertion order
    pub fn relations(&self) -> impl Iterator<Item = &LegalRelation> {
        self.relations.values()
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of relations
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Elements of one type, insertion order
    pub fn elements_of_type(&self, element_type: LegalElementType) -> Vec<&LegalElement> {
        self.elements
            .values()
            .filter(|e| e.element_type == element_type)
            .collect()
    }

    /// Relations leaving an element
    pub fn relations_from(&self, element_id: &str) -> Vec<&LegalRelation> {
        self.relations
            .values()
            .filter(|r| r.source_id == element_id)
            .collect()
    }

    /// Elements pointing at `element_id` through a relation of the given type
    pub fn sources_of(&self, element_id: &str, relation_type: LegalRelationType) -> Vec<&LegalElement> {
        self.relations
            .values()
            .filter(|r| r.target_id == element_id && r.relation_type == relation_type)
            .filter_map(|r| self.elements.get(&r.source_id))
            .collect()
    }

    /// Requirement and procedural-requirement elements applicable to a claim type
    pub fn get_requirements_for_claim_type(&self, claim_type: &str) -> Vec<&LegalElement> {
        self.elements
            .values()
            .filter(|e| e.element_type.is_requirement() && e.applies_to(claim_type))
            .collect()
    }

    /// Absorb another legal graph
    ///
    /// Elements with an id already present keep the existing record but gain any
    /// new applicable claim types; relations with a known id are skipped.
    pub fn merge(&mut self, other: LegalGraph) {
        for (id, element) in other.elements {
            match self.elements.get_mut(&id) {
                Some(existing) => {
                    for claim_type in element.applicable_claim_types {
                        if !existing.applicable_claim_types.contains(&claim_type) {
                            existing.applicable_claim_types.push(claim_type);
                        }
                    }
                }
                None => {
                    self.elements.insert(id, element);
                }
            }
        }
        for (id, relation) in other.relations {
            self.relations.entry(id).or_insert(relation);
        }
        self.metadata.touch();
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    /// Element counts by type, first-seen order
    pub fn element_type_frequency(&self) -> IndexMap<LegalElementType, usize> {
        let mut freq = IndexMap::new();
        for element in self.elements.values() {
            *freq.entry(element.element_type).or_insert(0) += 1;
        }
        freq
    }

    /// Relation counts by type, first-seen order
    pub fn relation_type_frequency(&self) -> IndexMap<LegalRelationType, usize> {
        let mut freq = IndexMap::new();
        for relation in self.relations.values() {
            *freq.entry(relation.relation_type).or_insert(0) += 1;
        }
        freq
    }

    /// Most frequent element type; ties go to the type seen first
    pub fn most_common_element_type(&self) -> Option<LegalElementType> {
        argmax_first_seen(self.element_type_frequency().into_iter())
    }

    /// Number of relations touching an element
    pub fn incident_relation_count(&self, element_id: &str) -> usize {
        self.relations.values().filter(|r| r.touches(element_id)).count()
    }

    /// Element with the most incident relations; ties go to the element seen first
    pub fn most_connected_element(&self) -> Option<&LegalElement> {
        let counts = self
            .elements
            .values()
            .map(|e| (e, self.incident_relation_count(&e.id)));
        argmax_first_seen(counts)
    }

    /// Σ incident-relation-count ÷ 2 ÷ N (0.0 for an empty graph)
    pub fn average_relations_per_element(&self) -> f64 {
        let n = self.elements.len();
        if n == 0 {
            return 0.0;
        }
        let incident: usize = self
            .elements
            .keys()
            .map(|id| self.incident_relation_count(id))
            .sum();
        incident as f64 / 2.0 / n as f64
    }

    /// Requirement coverage across claim types
    pub fn requirements_coverage(&self) -> RequirementsCoverage {
        let requirements: Vec<&LegalElement> = self
            .elements
            .values()
            .filter(|e| e.element_type.is_requirement())
            .collect();

        let claim_types: HashSet<&str> = requirements
            .iter()
            .flat_map(|e| e.applicable_claim_types.iter().map(String::as_str))
            .collect();

        let tagged: usize = requirements.iter().map(|e| e.applicable_claim_types.len()).sum();

        let avg_requirements_per_claim = if claim_types.is_empty() {
            0.0
        } else {
            tagged as f64 / claim_types.len() as f64
        };

        RequirementsCoverage {
            total_requirements: requirements.len(),
            claim_types_covered: claim_types.len(),
            avg_requirements_per_claim,
        }
    }

    /// Number of elements with a non-empty citation
    pub fn elements_with_citations(&self) -> usize {
        self.elements.values().filter(|e| e.has_citation()).count()
    }

    /// relations ÷ (N·(N−1)/2) for N ≥ 2, otherwise 0.0
    pub fn graph_density(&self) -> f64 {
        let n = self.elements.len();
        if n < 2 {
            return 0.0;
        }
        let max_pairs = (n * (n - 1)) as f64 / 2.0;
        self.relations.len() as f64 / max_pairs
    }
}

/// Argmax over `(item, count)` pairs keeping the first item on ties
fn argmax_first_seen<T>(items: impl Iterator<Item = (T, usize)>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (item, count) in items {
        match &best {
            Some((_, best_count)) if count <= *best_count => {}
            _ => best = Some((item, count)),
        }
    }
    best.map(|(item, _)| item)
}
