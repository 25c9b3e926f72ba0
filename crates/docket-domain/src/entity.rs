//! Entity module - the nodes of the knowledge graph

use crate::attribute::{AttributeValue, Attributes};
use crate::confidence::clamp_confidence;
use crate::metadata::{current_timestamp, new_id};
use std::fmt;

/// Kind of knowledge-graph entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// A natural person (complainant, manager, witness)
    Person,
    /// Employer, agency, landlord company
    Organization,
    /// Place where something happened
    Location,
    /// A calendar date or period
    Date,
    /// A monetary amount
    Amount,
    /// A legal claim asserted by the complainant
    Claim,
    /// A factual assertion supporting a claim
    Fact,
    /// A piece of evidence derived from an evidence record
    Evidence,
    /// Anything else
    Other,
}

impl EntityType {
    /// Every entity type, in declaration order
    pub const ALL: [EntityType; 9] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Date,
        EntityType::Amount,
        EntityType::Claim,
        EntityType::Fact,
        EntityType::Evidence,
        EntityType::Other,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Organization => "organization",
            EntityType::Location => "location",
            EntityType::Date => "date",
            EntityType::Amount => "amount",
            EntityType::Claim => "claim",
            EntityType::Fact => "fact",
            EntityType::Evidence => "evidence",
            EntityType::Other => "other",
        }
    }

    /// Parse a type from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Parse leniently: unknown names map to [`EntityType::Other`]
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(EntityType::Other)
    }

    /// Whether entities of this type can support a claim
    pub fn is_supporting(&self) -> bool {
        matches!(self, EntityType::Fact | EntityType::Evidence)
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid entity type: {}", s))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the knowledge graph
///
/// Entities are owned by exactly one graph. Moving information across a graph
/// boundary (evidence into the knowledge graph, an answer's mini-graph into the
/// canonical one) creates a new derived entity rather than sharing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Identifier, unique within the owning graph
    pub id: String,

    /// Entity kind
    pub entity_type: EntityType,

    /// Display name
    pub name: String,

    /// Open attribute bag
    pub attributes: Attributes,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Provenance tag (e.g. "narrative", "answer", "evidence")
    pub source: String,

    /// When the entity was created
    pub created_at: u64,
}

impl Entity {
    /// Create a new entity with a generated id, full confidence and unknown source
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            id: new_id(entity_type.as_str()),
            entity_type,
            name: name.into(),
            attributes: Attributes::new(),
            confidence: 1.0,
            source: "unknown".to_string(),
            created_at: current_timestamp(),
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the confidence (clamped to [0, 1])
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Set the provenance tag
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Look up a text attribute
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_text)
    }

    /// Whether the attribute is present and non-empty
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|v| !v.is_empty())
    }
}
