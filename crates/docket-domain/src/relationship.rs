//! Relationship module - directed edges of the knowledge graph

use crate::confidence::clamp_confidence;
use crate::metadata::new_id;
use std::fmt;

/// Type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    /// A fact or evidence supports a claim
    Supports,
    /// One entity contradicts another
    Contradicts,
    /// An entity was derived from another (evidence → knowledge)
    DerivedFrom,
    /// A party is involved in a claim or event
    Involves,
    /// A person is employed by an organization
    EmployedBy,
    /// Something happened on a date
    OccurredOn,
    /// Generic association
    RelatedTo,
}

impl RelationshipType {
    /// Every relationship type, in declaration order
    pub const ALL: [RelationshipType; 7] = [
        RelationshipType::Supports,
        RelationshipType::Contradicts,
        RelationshipType::DerivedFrom,
        RelationshipType::Involves,
        RelationshipType::EmployedBy,
        RelationshipType::OccurredOn,
        RelationshipType::RelatedTo,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Supports => "supports",
            RelationshipType::Contradicts => "contradicts",
            RelationshipType::DerivedFrom => "derived_from",
            RelationshipType::Involves => "involves",
            RelationshipType::EmployedBy => "employed_by",
            RelationshipType::OccurredOn => "occurred_on",
            RelationshipType::RelatedTo => "related_to",
        }
    }

    /// Parse a type from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Parse leniently: unknown names map to [`RelationshipType::RelatedTo`]
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(RelationshipType::RelatedTo)
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relationship type: {}", s))
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relationship between two entities
///
/// Endpoints are weak references by id. A relationship whose endpoint does not
/// resolve is a gap to be closed by questioning, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Identifier, unique within the owning graph
    pub id: String,

    /// Source entity id
    pub source_id: String,

    /// Target entity id
    pub target_id: String,

    /// Type of relationship
    pub relationship_type: RelationshipType,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
}

impl Relationship {
    /// Create a new relationship with a generated id and full confidence
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id: new_id("rel"),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type,
            confidence: 1.0,
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

    /// Whether `entity_id` is either endpoint
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source_id == entity_id || self.target_id == entity_id
    }

    /// The endpoint opposite to `entity_id`, if `entity_id` is an endpoint
    pub fn other_end(&self, entity_id: &str) -> Option<&str> {
        if self.source_id == entity_id {
            Some(&self.target_id)
        } else if self.target_id == entity_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let rel = Relationship::new("a", "b", RelationshipType::Supports);
        assert_eq!(rel.other_end("a"), Some("b"));
        assert_eq!(rel.other_end("b"), Some("a"));
        assert_eq!(rel.other_end("c"), None);
        assert!(rel.touches("a"));
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(RelationshipType::parse_lenient("EMPLOYED_BY"), RelationshipType::EmployedBy);
        assert_eq!(RelationshipType::parse_lenient("knows"), RelationshipType::RelatedTo);
    }
}
