//! Knowledge graph - entities and relationships gathered about one case

use crate::attribute::AttributeValue;
use crate::confidence::mean_uncertainty;
use crate::entity::{Entity, EntityType};
use crate::metadata::{new_id, GraphMetadata};
use crate::relationship::{Relationship, RelationshipType};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Attributes every claim entity must carry before it is considered complete
pub const REQUIRED_CLAIM_ATTRIBUTES: [&str; 2] = ["description", "date"];

/// What is missing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GapKind {
    /// A claim has no supporting fact or evidence relationship
    MissingSupport,
    /// A required attribute of a claim is absent or empty
    MissingAttribute(String),
    /// A relationship endpoint does not resolve to an entity
    DanglingReference {
        /// The relationship holding the unresolved reference
        relationship_id: String,
    },
}

impl GapKind {
    /// Short machine-readable tag
    pub fn tag(&self) -> String {
        match self {
            GapKind::MissingSupport => "missing_support".to_string(),
            GapKind::MissingAttribute(attr) => format!("missing_{}", attr),
            GapKind::DanglingReference { relationship_id } => format!("dangling_{}", relationship_id),
        }
    }
}

/// A structurally detectable missing piece of information
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    /// Stable identifier: the same missing piece always yields the same id
    pub id: String,

    /// The offending entity (for dangling references, the unresolved id)
    pub entity_id: String,

    /// What is missing
    pub kind: GapKind,

    /// Human-readable description
    pub description: String,
}

/// Counts describing a knowledge graph
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeGraphSummary {
    /// Number of entities
    pub total_entities: usize,
    /// Number of relationships
    pub total_relationships: usize,
    /// Entity counts by type, first-seen order
    pub entity_types: IndexMap<EntityType, usize>,
    /// Mean confidence over entities (0.0 when empty)
    pub average_confidence: f64,
    /// Number of open gaps
    pub gap_count: usize,
}

/// Entities and relationships for one case
///
/// The graph is an arena keyed by id. It only grows: entities and relationships are
/// never removed, and the only in-place mutations are attribute writes and explicit
/// merges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KnowledgeGraph {
    entities: IndexMap<String, Entity>,
    relationships: IndexMap<String, Relationship>,
    metadata: GraphMetadata,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts without touching ids or timestamps
    pub fn from_parts(
        metadata: GraphMetadata,
        entities: impl IntoIterator<Item = Entity>,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> Self {
        Self {
            entities: entities.into_iter().map(|e| (e.id.clone(), e)).collect(),
            relationships: relationships.into_iter().map(|r| (r.id.clone(), r)).collect(),
            metadata,
        }
    }

    /// Graph metadata
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Insert an entity and return its id
    ///
    /// An empty or already-used id is replaced by a freshly generated one, so ids
    /// stay unique within the graph.
    pub fn add_entity(&mut self, mut entity: Entity) -> String {
        if entity.id.is_empty() || self.entities.contains_key(&entity.id) {
            entity.id = new_id(entity.entity_type.as_str());
        }
        let id = entity.id.clone();
        self.entities.insert(id.clone(), entity);
        self.metadata.touch();
        id
    }

    /// Insert a relationship and return its id
    ///
    /// Endpoints are not checked: a relationship may point at an entity that does
    /// not exist (yet). That shows up as a gap.
    pub fn add_relationship(&mut self, mut relationship: Relationship) -> String {
        if relationship.id.is_empty() || self.relationships.contains_key(&relationship.id) {
            relationship.id = new_id("rel");
        }
        let id = relationship.id.clone();
        self.relationships.insert(id.clone(), relationship);
        self.metadata.touch();
        id
    }

    /// Set an attribute on an entity
    ///
    /// Returns `None` when the entity does not exist, otherwise the previous value.
    pub fn set_entity_attribute(
        &mut self,
        entity_id: &str,
        key: &str,
        value: AttributeValue,
    ) -> Option<Option<AttributeValue>> {
        let entity = self.entities.get_mut(entity_id)?;
        let previous = entity.attributes.insert(key.to_string(), value);
        self.metadata.touch();
        Some(previous)
    }

    /// Look up an entity
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up a relationship
    pub fn get_relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All relationships in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of relationships
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the graph has no entities and no relationships
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Entities of one type, in insertion order
    pub fn get_entities_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    /// Relationships touching an entity, in insertion order
    pub fn relationships_for(&self, entity_id: &str) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.touches(entity_id))
            .collect()
    }

    /// Entities supporting a claim through a `supports` relationship
    pub fn supporting_entities(&self, claim_id: &str) -> Vec<&Entity> {
        self.relationships
            .values()
            .filter(|r| r.relationship_type == RelationshipType::Supports)
            .filter_map(|r| r.other_end(claim_id))
            .filter_map(|other| self.entities.get(other))
            .filter(|e| e.entity_type.is_supporting())
            .collect()
    }

    /// Whether a claim has at least one supporting fact or evidence entity
    pub fn has_support(&self, claim_id: &str) -> bool {
        !self.supporting_entities(claim_id).is_empty()
    }

    /// Detect every open gap
    ///
    /// For each claim (insertion order): missing support, then each missing
    /// required attribute. After the claims: every unresolved relationship endpoint.
    pub fn find_gaps(&self) -> Vec<Gap> {
        let mut gaps = Vec::new();

        for claim in self.get_entities_by_type(EntityType::Claim) {
            if !self.has_support(&claim.id) {
                gaps.push(Gap {
                    id: format!("{}:{}", claim.id, GapKind::MissingSupport.tag()),
                    entity_id: claim.id.clone(),
                    kind: GapKind::MissingSupport,
                    description: format!("Claim '{}' has no supporting facts or evidence", claim.name),
                });
            }

            for attr in REQUIRED_CLAIM_ATTRIBUTES {
                if !claim.has_attribute(attr) {
                    let kind = GapKind::MissingAttribute(attr.to_string());
                    gaps.push(Gap {
                        id: format!("{}:{}", claim.id, kind.tag()),
                        entity_id: claim.id.clone(),
                        kind,
                        description: format!("Claim '{}' is missing its {}", claim.name, attr),
                    });
                }
            }
        }

        for rel in self.relationships.values() {
            for endpoint in [&rel.source_id, &rel.target_id] {
                if !self.entities.contains_key(endpoint.as_str()) {
                    let kind = GapKind::DanglingReference {
                        relationship_id: rel.id.clone(),
                    };
                    gaps.push(Gap {
                        id: format!("{}:{}", endpoint, kind.tag()),
                        entity_id: endpoint.clone(),
                        kind,
                        description: format!(
                            "Relationship '{}' refers to unknown entity '{}'",
                            rel.relationship_type, endpoint
                        ),
                    });
                }
            }
        }

        gaps
    }

    /// Mean `1 - confidence` across entities and relationships
    pub fn mean_uncertainty(&self) -> f64 {
        mean_uncertainty(
            self.entities
                .values()
                .map(|e| e.confidence)
                .chain(self.relationships.values().map(|r| r.confidence)),
        )
    }

    /// Merge another graph into this one
    ///
    /// Incoming entities are matched to existing ones by id and type, or by type
    /// plus case-insensitive name. Matches absorb missing attributes and keep the
    /// higher confidence; everything else is appended. An incoming entity whose id
    /// is taken by an entity of another type is appended under a fresh id. Relationship endpoints are remapped
    /// onto the surviving ids. Returns the number of entities added.
    pub fn merge(&mut self, other: KnowledgeGraph) -> usize {
        let mut id_map: HashMap<String, String> = HashMap::new();
        let mut added = 0;

        for (incoming_id, incoming) in other.entities {
            let same_id = self
                .entities
                .get(&incoming_id)
                .is_some_and(|e| e.entity_type == incoming.entity_type);
            let existing_id = if same_id {
                Some(incoming_id.clone())
            } else {
                self.find_by_name(incoming.entity_type, &incoming.name)
                    .map(|e| e.id.clone())
            };

            match existing_id {
                Some(existing_id) => {
                    if let Some(existing) = self.entities.get_mut(&existing_id) {
                        for (key, value) in incoming.attributes {
                            let missing = existing.attributes.get(&key).is_none_or(|v| v.is_empty());
                            if missing {
                                existing.attributes.insert(key, value);
                            }
                        }
                        existing.confidence = existing.confidence.max(incoming.confidence);
                    }
                    id_map.insert(incoming_id, existing_id);
                }
                None => {
                    let new_id = self.add_entity(incoming);
                    id_map.insert(incoming_id, new_id);
                    added += 1;
                }
            }
        }

        for (_, mut rel) in other.relationships {
            if let Some(mapped) = id_map.get(&rel.source_id) {
                rel.source_id = mapped.clone();
            }
            if let Some(mapped) = id_map.get(&rel.target_id) {
                rel.target_id = mapped.clone();
            }
            let duplicate = self.relationships.values().any(|r| {
                r.source_id == rel.source_id
                    && r.target_id == rel.target_id
                    && r.relationship_type == rel.relationship_type
            });
            if !duplicate {
                self.add_relationship(rel);
            }
        }

        self.metadata.touch();
        added
    }

    /// Find an entity by type and case-insensitive name
    pub fn find_by_name(&self, entity_type: EntityType, name: &str) -> Option<&Entity> {
        let needle = name.trim().to_lowercase();
        self.entities
            .values()
            .find(|e| e.entity_type == entity_type && e.name.trim().to_lowercase() == needle)
    }

    /// Summary counts
    pub fn summary(&self) -> KnowledgeGraphSummary {
        let mut entity_types: IndexMap<EntityType, usize> = IndexMap::new();
        for entity in self.entities.values() {
            *entity_types.entry(entity.entity_type).or_insert(0) += 1;
        }

        let average_confidence = if self.entities.is_empty() {
            0.0
        } else {
            self.entities.values().map(|e| e.confidence).sum::<f64>() / self.entities.len() as f64
        };

        KnowledgeGraphSummary {
            total_entities: self.entities.len(),
            total_relationships: self.relationships.len(),
            entity_types,
            average_confidence,
            gap_count: self.find_gaps().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(name: &str) -> Entity {
        Entity::new(EntityType::Claim, name)
    }

    #[test]
    fn test_add_entity_returns_id_and_regenerates_duplicates() {
        let mut kg = KnowledgeGraph::new();
        let first = kg.add_entity(Entity::new(EntityType::Person, "Alice").with_id("p1"));
        let second = kg.add_entity(Entity::new(EntityType::Person, "Bob").with_id("p1"));

        assert_eq!(first, "p1");
        assert_ne!(second, "p1");
        assert_eq!(kg.entity_count(), 2);
    }

    #[test]
    fn test_entities_by_type_keep_insertion_order() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(Entity::new(EntityType::Person, "Zed"));
        kg.add_entity(Entity::new(EntityType::Organization, "Acme"));
        kg.add_entity(Entity::new(EntityType::Person, "Amy"));

        let names: Vec<_> = kg
            .get_entities_by_type(EntityType::Person)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_find_gaps_for_bare_claim() {
        let mut kg = KnowledgeGraph::new();
        let id = kg.add_entity(claim("Retaliation"));

        let gaps = kg.find_gaps();
        assert_eq!(gaps.len(), 3);
        assert!(gaps.iter().all(|g| g.entity_id == id));
        assert_eq!(gaps[0].kind, GapKind::MissingSupport);
        assert_eq!(gaps[1].kind, GapKind::MissingAttribute("description".into()));
        assert_eq!(gaps[2].kind, GapKind::MissingAttribute("date".into()));
    }

    #[test]
    fn test_supported_complete_claim_has_no_gaps() {
        let mut kg = KnowledgeGraph::new();
        let claim_id = kg.add_entity(
            claim("Retaliation")
                .with_attribute("description", "Fired after complaint")
                .with_attribute("date", "2024-02-01"),
        );
        let fact_id = kg.add_entity(Entity::new(EntityType::Fact, "Complained to HR"));
        kg.add_relationship(Relationship::new(fact_id, claim_id, RelationshipType::Supports));

        assert!(kg.find_gaps().is_empty());
    }

    #[test]
    fn test_non_supporting_relationship_does_not_close_gap() {
        let mut kg = KnowledgeGraph::new();
        let claim_id = kg.add_entity(claim("Retaliation"));
        let person = kg.add_entity(Entity::new(EntityType::Person, "Manager"));
        kg.add_relationship(Relationship::new(person, claim_id.clone(), RelationshipType::Supports));

        assert!(!kg.has_support(&claim_id));
    }

    #[test]
    fn test_dangling_reference_is_a_gap_not_an_error() {
        let mut kg = KnowledgeGraph::new();
        let person = kg.add_entity(Entity::new(EntityType::Person, "Alice"));
        let rel = kg.add_relationship(Relationship::new(person, "org_missing", RelationshipType::EmployedBy));

        let gaps = kg.find_gaps();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].entity_id, "org_missing");
        assert_eq!(gaps[0].kind, GapKind::DanglingReference { relationship_id: rel });
    }

    #[test]
    fn test_gap_ids_are_stable() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(claim("Retaliation"));
        let first: Vec<_> = kg.find_gaps().into_iter().map(|g| g.id).collect();
        let second: Vec<_> = kg.find_gaps().into_iter().map(|g| g.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_entity_attribute() {
        let mut kg = KnowledgeGraph::new();
        let id = kg.add_entity(claim("Retaliation"));

        assert_eq!(kg.set_entity_attribute(&id, "date", "2024-01-01".into()), Some(None));
        assert_eq!(kg.set_entity_attribute("nope", "date", "x".into()), None);
        assert!(kg.get_entity(&id).unwrap().has_attribute("date"));
    }

    #[test]
    fn test_merge_matches_by_name_and_remaps_relationships() {
        let mut kg = KnowledgeGraph::new();
        let acme = kg.add_entity(Entity::new(EntityType::Organization, "Acme Corp"));

        let mut other = KnowledgeGraph::new();
        let other_acme = other.add_entity(
            Entity::new(EntityType::Organization, "acme corp").with_attribute("industry", "retail"),
        );
        let alice = other.add_entity(Entity::new(EntityType::Person, "Alice"));
        other.add_relationship(Relationship::new(alice, other_acme, RelationshipType::EmployedBy));

        let added = kg.merge(other);

        assert_eq!(added, 1);
        assert_eq!(kg.entity_count(), 2);
        assert!(kg.get_entity(&acme).unwrap().has_attribute("industry"));
        let rel = kg.relationships().next().unwrap();
        assert_eq!(rel.target_id, acme);
    }

    #[test]
    fn test_merge_keeps_entities_of_different_type_with_same_id() {
        let mut kg = KnowledgeGraph::new();
        let mut person = Entity::new(EntityType::Person, "Dana");
        person.id = "shared".to_string();
        kg.add_entity(person);

        let mut other = KnowledgeGraph::new();
        let mut org = Entity::new(EntityType::Organization, "Globex").with_attribute("industry", "energy");
        org.id = "shared".to_string();
        other.add_entity(org);
        let bob = other.add_entity(Entity::new(EntityType::Person, "Bob"));
        other.add_relationship(Relationship::new(bob, "shared", RelationshipType::EmployedBy));

        let added = kg.merge(other);

        assert_eq!(added, 2);
        assert_eq!(kg.entity_count(), 3);
        let existing = kg.get_entity("shared").unwrap();
        assert_eq!(existing.entity_type, EntityType::Person);
        assert!(!existing.has_attribute("industry"));

        let globex = kg.find_by_name(EntityType::Organization, "Globex").unwrap();
        assert_ne!(globex.id, "shared");
        assert!(globex.has_attribute("industry"));
        let rel = kg.relationships().next().unwrap();
        assert_eq!(rel.target_id, globex.id);
    }

    #[test]
    fn test_summary() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(claim("A").with_confidence(0.5));
        kg.add_entity(Entity::new(EntityType::Person, "B").with_confidence(1.0));

        let summary = kg.summary();
        assert_eq!(summary.total_entities, 2);
        assert_eq!(summary.entity_types.get(&EntityType::Claim), Some(&1));
        assert!((summary.average_confidence - 0.75).abs() < 1e-12);
        assert_eq!(summary.gap_count, 3);
    }
}
