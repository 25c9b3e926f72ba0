//! Legal elements and relations (nodes and edges of the legal graph)

use crate::attribute::{AttributeValue, Attributes};
use crate::metadata::new_id;
use std::fmt;

/// Kind of legal element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegalElementType {
    /// A statute (e.g. Title VII)
    Statute,
    /// An administrative regulation
    Regulation,
    /// A judicial decision
    CaseLaw,
    /// A substantive element a claim must establish
    Requirement,
    /// A procedural element a pleading must contain
    ProceduralRequirement,
}

impl LegalElementType {
    /// Every element type, in declaration order
    pub const ALL: [LegalElementType; 5] = [
        LegalElementType::Statute,
        LegalElementType::Regulation,
        LegalElementType::CaseLaw,
        LegalElementType::Requirement,
        LegalElementType::ProceduralRequirement,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalElementType::Statute => "statute",
            LegalElementType::Regulation => "regulation",
            LegalElementType::CaseLaw => "case_law",
            LegalElementType::Requirement => "requirement",
            LegalElementType::ProceduralRequirement => "procedural_requirement",
        }
    }

    /// Parse a type from a string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Whether this is a substantive or procedural requirement
    pub fn is_requirement(&self) -> bool {
        matches!(
            self,
            LegalElementType::Requirement | LegalElementType::ProceduralRequirement
        )
    }
}

impl fmt::Display for LegalElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of legal relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegalRelationType {
    /// Source requires target
    Requires,
    /// Source implies target
    Implies,
    /// Source contradicts target
    Contradicts,
    /// Source supersedes target
    Supersedes,
    /// Source cites target
    Cites,
    /// Source provides (establishes) target
    Provides,
    /// Source defines target
    Defines,
}

impl LegalRelationType {
    /// Every relation type, in declaration order
    pub const ALL: [LegalRelationType; 7] = [
        LegalRelationType::Requires,
        LegalRelationType::Implies,
        LegalRelationType::Contradicts,
        LegalRelationType::Supersedes,
        LegalRelationType::Cites,
        LegalRelationType::Provides,
        LegalRelationType::Defines,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalRelationType::Requires => "requires",
            LegalRelationType::Implies => "implies",
            LegalRelationType::Contradicts => "contradicts",
            LegalRelationType::Supersedes => "supersedes",
            LegalRelationType::Cites => "cites",
            LegalRelationType::Provides => "provides",
            LegalRelationType::Defines => "defines",
        }
    }

    /// Parse a type from a string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for LegalRelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statute, regulation, case or requirement
#[derive(Debug, Clone, PartialEq)]
pub struct LegalElement {
    /// Identifier, unique within the legal graph
    pub id: String,
    /// Element kind
    pub element_type: LegalElementType,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: String,
    /// Citation (empty when unknown)
    pub citation: String,
    /// Jurisdiction tag, e.g. "federal"
    pub jurisdiction: String,
    /// Whether the element is mandatory
    pub required: bool,
    /// Claim types this element applies to
    pub applicable_claim_types: Vec<String>,
    /// Open attribute bag
    pub attributes: Attributes,
}

impl LegalElement {
    /// Create an element with a generated id
    pub fn new(element_type: LegalElementType, name: impl Into<String>) -> Self {
        Self {
            id: new_id(element_type.as_str()),
            element_type,
            name: name.into(),
            description: String::new(),
            citation: String::new(),
            jurisdiction: String::new(),
            required: true,
            applicable_claim_types: Vec::new(),
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

    /// Set the citation
    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citation = citation.into();
        self
    }

    /// Set the jurisdiction
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = jurisdiction.into();
        self
    }

    /// Set the required flag
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the applicable claim types
    pub fn with_claim_types<I, S>(mut self, claim_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicable_claim_types = claim_types.into_iter().map(Into::into).collect();
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the element applies to a claim type (exact match)
    pub fn applies_to(&self, claim_type: &str) -> bool {
        self.applicable_claim_types.iter().any(|t| t == claim_type)
    }

    /// Whether the element has a non-empty citation
    pub fn has_citation(&self) -> bool {
        !self.citation.trim().is_empty()
    }
}

/// A directed relation between two legal elements
#[derive(Debug, Clone, PartialEq)]
pub struct LegalRelation {
    /// Identifier, unique within the legal graph
    pub id: String,
    /// Source element id
    pub source_id: String,
    /// Target element id
    pub target_id: String,
    /// Relation kind
    pub relation_type: LegalRelationType,
    /// Open attribute bag
    pub attributes: Attributes,
}

impl LegalRelation {
    /// Create a relation with a generated id
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_type: LegalRelationType,
    ) -> Self {
        Self {
            id: new_id("lrel"),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type,
            attributes: Attributes::new(),
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Whether `element_id` is either endpoint
    pub fn touches(&self, element_id: &str) -> bool {
        self.source_id == element_id || self.target_id == element_id
    }
}
