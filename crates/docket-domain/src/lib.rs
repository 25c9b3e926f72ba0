//! Docket Domain Layer
//!
//! This crate contains the core data model for Docket: the three graphs that the
//! refinement pipeline reads and mutates, the phase enumeration, evidence records,
//! and the trait interfaces for every external collaborator.
//!
//! ## Key Concepts
//!
//! - **KnowledgeGraph**: entities and relationships extracted from the narrative,
//!   answers and evidence. Detects *gaps* (missing support, empty attributes,
//!   dangling references).
//! - **DependencyGraph**: claims and the requirement nodes each claim must satisfy.
//!   Computes *readiness*.
//! - **LegalGraph**: statutes, regulations and requirements with typed relations and
//!   the structural analytics used by reporting.
//! - **Phase**: the linear INTAKE → EVIDENCE → FORMALIZATION progression.
//!
//! ## Architecture
//!
//! Graphs are arenas keyed by id. Relationships refer to their endpoints by id only,
//! so an endpoint may legitimately dangle; that shows up in
//! [`KnowledgeGraph::find_gaps`] instead of as an error. Infrastructure (LLM
//! backends, persistence) lives in other crates and plugs in through [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod confidence;
pub mod dependency_graph;
pub mod entity;
pub mod evidence;
pub mod knowledge_graph;
pub mod legal;
pub mod legal_graph;
pub mod metadata;
pub mod phase;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use attribute::{AttributeValue, Attributes};
pub use dependency_graph::{
    ClaimReadiness, Dependency, DependencyGraph, DependencyGraphSummary, DependencyNode, NodeType,
    ReadinessReport,
};
pub use entity::{Entity, EntityType};
pub use evidence::{EvidenceHandle, EvidenceRecord};
pub use knowledge_graph::{Gap, GapKind, KnowledgeGraph, KnowledgeGraphSummary};
pub use legal::{LegalElement, LegalElementType, LegalRelation, LegalRelationType};
pub use legal_graph::{LegalGraph, RequirementsCoverage};
pub use metadata::{current_timestamp, new_id, GraphMetadata, GRAPH_FORMAT_VERSION};
pub use phase::Phase;
pub use relationship::{Relationship, RelationshipType};
