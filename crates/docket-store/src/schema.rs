//! On-disk document shapes
//!
//! The domain crate stays free of serde; these records mirror the domain types
//! field for field. Enum-valued fields are stored as their snake_case names and
//! rejected with [`StoreError::InvalidData`] when unknown.

use crate::StoreError;
use docket_domain::{
    AttributeValue, Attributes, Dependency, DependencyGraph, DependencyNode, Entity, EntityType,
    GraphMetadata, KnowledgeGraph, LegalElement, LegalElementType, LegalGraph, LegalRelation,
    LegalRelationType, NodeType, Relationship, RelationshipType,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Graph metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Creation time (Unix seconds)
    pub created_at: u64,
    /// Last mutation time (Unix seconds)
    pub last_updated: u64,
    /// Document format version
    pub version: String,
}

impl From<&GraphMetadata> for MetadataRecord {
    fn from(m: &GraphMetadata) -> Self {
        Self {
            created_at: m.created_at,
            last_updated: m.last_updated,
            version: m.version.clone(),
        }
    }
}

impl From<MetadataRecord> for GraphMetadata {
    fn from(m: MetadataRecord) -> Self {
        GraphMetadata {
            created_at: m.created_at,
            last_updated: m.last_updated,
            version: m.version,
        }
    }
}

/// Attribute value as JSON: bool, number, string or string list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeRecord {
    /// Boolean flag
    Flag(bool),
    /// Number
    Number(f64),
    /// Free text
    Text(String),
    /// List of strings
    List(Vec<String>),
}

impl From<&AttributeValue> for AttributeRecord {
    fn from(v: &AttributeValue) -> Self {
        match v {
            AttributeValue::Text(s) => AttributeRecord::Text(s.clone()),
            AttributeValue::Number(n) => AttributeRecord::Number(*n),
            AttributeValue::Flag(b) => AttributeRecord::Flag(*b),
            AttributeValue::List(l) => AttributeRecord::List(l.clone()),
        }
    }
}

impl From<AttributeRecord> for AttributeValue {
    fn from(v: AttributeRecord) -> Self {
        match v {
            AttributeRecord::Text(s) => AttributeValue::Text(s),
            AttributeRecord::Number(n) => AttributeValue::Number(n),
            AttributeRecord::Flag(b) => AttributeValue::Flag(b),
            AttributeRecord::List(l) => AttributeValue::List(l),
        }
    }
}

fn attributes_to_records(attrs: &Attributes) -> BTreeMap<String, AttributeRecord> {
    attrs.iter().map(|(k, v)| (k.clone(), v.into())).collect()
}

fn records_to_attributes(records: BTreeMap<String, AttributeRecord>) -> Attributes {
    records.into_iter().map(|(k, v)| (k, v.into())).collect()
}

fn invalid(kind: &str, value: &str) -> StoreError {
    StoreError::InvalidData(format!("Unknown {}: {}", kind, value))
}

/// Reject documents whose map key disagrees with the record id
fn check_key(key: &str, id: &str) -> Result<(), StoreError> {
    if key == id {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!(
            "Map key '{}' does not match record id '{}'",
            key, id
        )))
    }
}

// ----------------------------------------------------------------------
// Knowledge graph
// ----------------------------------------------------------------------

/// Serialized entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity id
    pub id: String,
    /// Entity type name
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Display name
    pub name: String,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeRecord>,
    /// Confidence
    pub confidence: f64,
    /// Provenance tag
    pub source: String,
    /// Creation time
    pub created_at: u64,
}

/// Serialized relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Relationship id
    pub id: String,
    /// Source entity id
    pub source_id: String,
    /// Target entity id
    pub target_id: String,
    /// Relationship type name
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Confidence
    pub confidence: f64,
}

/// Serialized knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraphDocument {
    /// Metadata block
    pub metadata: MetadataRecord,
    /// Entities keyed by id
    pub entities: IndexMap<String, EntityRecord>,
    /// Relationships keyed by id
    pub relationships: IndexMap<String, RelationshipRecord>,
}

impl From<&KnowledgeGraph> for KnowledgeGraphDocument {
    fn from(kg: &KnowledgeGraph) -> Self {
        let entities = kg
            .entities()
            .map(|e| {
                let record = EntityRecord {
                    id: e.id.clone(),
                    entity_type: e.entity_type.as_str().to_string(),
                    name: e.name.clone(),
                    attributes: attributes_to_records(&e.attributes),
                    confidence: e.confidence,
                    source: e.source.clone(),
                    created_at: e.created_at,
                };
                (e.id.clone(), record)
            })
            .collect();
        let relationships = kg
            .relationships()
            .map(|r| {
                let record = RelationshipRecord {
                    id: r.id.clone(),
                    source_id: r.source_id.clone(),
                    target_id: r.target_id.clone(),
                    relationship_type: r.relationship_type.as_str().to_string(),
                    confidence: r.confidence,
                };
                (r.id.clone(), record)
            })
            .collect();
        Self {
            metadata: kg.metadata().into(),
            entities,
            relationships,
        }
    }
}

impl TryFrom<KnowledgeGraphDocument> for KnowledgeGraph {
    type Error = StoreError;

    fn try_from(doc: KnowledgeGraphDocument) -> Result<Self, Self::Error> {
        let mut entities = Vec::with_capacity(doc.entities.len());
        for (key, record) in doc.entities {
            check_key(&key, &record.id)?;
            let entity_type = EntityType::parse(&record.entity_type)
                .ok_or_else(|| invalid("entity type", &record.entity_type))?;
            entities.push(Entity {
                id: record.id,
                entity_type,
                name: record.name,
                attributes: records_to_attributes(record.attributes),
                confidence: record.confidence,
                source: record.source,
                created_at: record.created_at,
            });
        }

        let mut relationships = Vec::with_capacity(doc.relationships.len());
        for (key, record) in doc.relationships {
            check_key(&key, &record.id)?;
            let relationship_type = RelationshipType::parse(&record.relationship_type)
                .ok_or_else(|| invalid("relationship type", &record.relationship_type))?;
            relationships.push(Relationship {
                id: record.id,
                source_id: record.source_id,
                target_id: record.target_id,
                relationship_type,
                confidence: record.confidence,
            });
        }

        Ok(KnowledgeGraph::from_parts(doc.metadata.into(), entities, relationships))
    }
}

// ----------------------------------------------------------------------
// Dependency graph
// ----------------------------------------------------------------------

/// Serialized dependency node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNodeRecord {
    /// Node id
    pub id: String,
    /// "claim" or "requirement"
    pub node_type: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Claim type (claims only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    /// Requirement key (requirements only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_key: Option<String>,
    /// true, false or null (unknown)
    pub satisfied: Option<bool>,
    /// Confidence
    pub confidence: f64,
    /// Attached evidence ids
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeRecord>,
}

/// Serialized claim → requirement edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Edge id
    pub id: String,
    /// Claim node id
    pub source_id: String,
    /// Requirement node id
    pub target_id: String,
    /// Mandatory flag
    pub required: bool,
}

/// Serialized dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraphDocument {
    /// Metadata block
    pub metadata: MetadataRecord,
    /// Nodes keyed by id
    pub nodes: IndexMap<String, DependencyNodeRecord>,
    /// Dependencies keyed by id
    pub dependencies: IndexMap<String, DependencyRecord>,
}

impl From<&DependencyGraph> for DependencyGraphDocument {
    fn from(dg: &DependencyGraph) -> Self {
        let nodes = dg
            .nodes()
            .map(|n| {
                let record = DependencyNodeRecord {
                    id: n.id.clone(),
                    node_type: n.node_type.as_str().to_string(),
                    name: n.name.clone(),
                    description: n.description.clone(),
                    claim_type: n.claim_type.clone(),
                    requirement_key: n.requirement_key.clone(),
                    satisfied: n.satisfied,
                    confidence: n.confidence,
                    evidence_ids: n.evidence_ids.clone(),
                    attributes: attributes_to_records(&n.attributes),
                };
                (n.id.clone(), record)
            })
            .collect();
        let dependencies = dg
            .dependencies()
            .map(|d| {
                let record = DependencyRecord {
                    id: d.id.clone(),
                    source_id: d.source_id.clone(),
                    target_id: d.target_id.clone(),
                    required: d.required,
                };
                (d.id.clone(), record)
            })
            .collect();
        Self {
            metadata: dg.metadata().into(),
            nodes,
            dependencies,
        }
    }
}

impl TryFrom<DependencyGraphDocument> for DependencyGraph {
    type Error = StoreError;

    fn try_from(doc: DependencyGraphDocument) -> Result<Self, Self::Error> {
        let mut nodes = Vec::with_capacity(doc.nodes.len());
        for (key, record) in doc.nodes {
            check_key(&key, &record.id)?;
            let node_type =
                NodeType::parse(&record.node_type).ok_or_else(|| invalid("node type", &record.node_type))?;
            nodes.push(DependencyNode {
                id: record.id,
                node_type,
                name: record.name,
                description: record.description,
                claim_type: record.claim_type,
                requirement_key: record.requirement_key,
                satisfied: record.satisfied,
                confidence: record.confidence,
                evidence_ids: record.evidence_ids,
                attributes: records_to_attributes(record.attributes),
            });
        }

        let mut dependencies = Vec::with_capacity(doc.dependencies.len());
        for (key, record) in doc.dependencies {
            check_key(&key, &record.id)?;
            dependencies.push(Dependency {
                id: record.id,
                source_id: record.source_id,
                target_id: record.target_id,
                required: record.required,
            });
        }

        Ok(DependencyGraph::from_parts(doc.metadata.into(), nodes, dependencies))
    }
}

// ----------------------------------------------------------------------
// Legal graph
// ----------------------------------------------------------------------

/// Serialized legal element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalElementRecord {
    /// Element id
    pub id: String,
    /// Element type name
    pub element_type: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Citation
    #[serde(default)]
    pub citation: String,
    /// Jurisdiction
    #[serde(default)]
    pub jurisdiction: String,
    /// Mandatory flag
    pub required: bool,
    /// Claim types this element applies to
    #[serde(default)]
    pub applicable_claim_types: Vec<String>,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeRecord>,
}

/// Serialized legal relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalRelationRecord {
    /// Relation id
    pub id: String,
    /// Source element id
    pub source_id: String,
    /// Target element id
    pub target_id: String,
    /// Relation type name
    pub relation_type: String,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeRecord>,
}

/// Serialized legal graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalGraphDocument {
    /// Metadata block
    pub metadata: MetadataRecord,
    /// Elements keyed by id
    pub elements: IndexMap<String, LegalElementRecord>,
    /// Relations keyed by id
    pub relations: IndexMap<String, LegalRelationRecord>,
}

impl From<&LegalGraph> for LegalGraphDocument {
    fn from(lg: &LegalGraph) -> Self {
        let elements = lg
            .elements()
            .map(|e| {
                let record = LegalElementRecord {
                    id: e.id.clone(),
                    element_type: e.element_type.as_str().to_string(),
                    name: e.name.clone(),
                    description: e.description.clone(),
                    citation: e.citation.clone(),
                    jurisdiction: e.jurisdiction.clone(),
                    required: e.required,
                    applicable_claim_types: e.applicable_claim_types.clone(),
                    attributes: attributes_to_records(&e.attributes),
                };
                (e.id.clone(), record)
            })
            .collect();
        let relations = lg
            .relations()
            .map(|r| {
                let record = LegalRelationRecord {
                    id: r.id.clone(),
                    source_id: r.source_id.clone(),
                    target_id: r.target_id.clone(),
                    relation_type: r.relation_type.as_str().to_string(),
                    attributes: attributes_to_records(&r.attributes),
                };
                (r.id.clone(), record)
            })
            .collect();
        Self {
            metadata: lg.metadata().into(),
            elements,
            relations,
        }
    }
}

impl TryFrom<LegalGraphDocument> for LegalGraph {
    type Error = StoreError;

    fn try_from(doc: LegalGraphDocument) -> Result<Self, Self::Error> {
        let mut elements = Vec::with_capacity(doc.elements.len());
        for (key, record) in doc.elements {
            check_key(&key, &record.id)?;
            let element_type = LegalElementType::parse(&record.element_type)
                .ok_or_else(|| invalid("legal element type", &record.element_type))?;
            elements.push(LegalElement {
                id: record.id,
                element_type,
                name: record.name,
                description: record.description,
                citation: record.citation,
                jurisdiction: record.jurisdiction,
                required: record.required,
                applicable_claim_types: record.applicable_claim_types,
                attributes: records_to_attributes(record.attributes),
            });
        }

        let mut relations = Vec::with_capacity(doc.relations.len());
        for (key, record) in doc.relations {
            check_key(&key, &record.id)?;
            let relation_type = LegalRelationType::parse(&record.relation_type)
                .ok_or_else(|| invalid("legal relation type", &record.relation_type))?;
            relations.push(LegalRelation {
                id: record.id,
                source_id: record.source_id,
                target_id: record.target_id,
                relation_type,
                attributes: records_to_attributes(record.attributes),
            });
        }

        Ok(LegalGraph::from_parts(doc.metadata.into(), elements, relations))
    }
}
