//! Docket Extractor
//!
//! Builds the three graphs the pipeline refines from text.
//!
//! # Overview
//!
//! - [`KnowledgeGraphBuilder`] turns a narrative or an answer into a knowledge
//!   graph. The keyword pass in [`heuristics`] always runs; when a [`Backend`] is
//!   supplied its JSON output is parsed tolerantly and merged in.
//! - [`DependencyGraphBuilder`] creates claim nodes with requirement nodes from
//!   the [`catalog`] and applies evidence to them.
//! - [`LegalGraphBuilder`] loads statutes, claim-type requirements and rules of
//!   procedure into a legal graph.
//!
//! # Architecture
//!
//! ```text
//! narrative ──► heuristics ──┐
//!          └──► Backend ──► parser ──┴──► KnowledgeGraph ──► DependencyGraph
//!                                                    catalog ──► LegalGraph
//! ```
//!
//! # Example Usage
//!
//! ```
//! use docket_extractor::{ClaimSpec, DependencyGraphBuilder, KnowledgeGraphBuilder};
//!
//! let kg = KnowledgeGraphBuilder::default()
//!     .build_from_text("Employee fired after complaining about unequal pay");
//! let dg = DependencyGraphBuilder::default().build_from_knowledge_graph(&kg);
//! assert!(dg.claims().count() >= 1);
//!
//! let manual = DependencyGraphBuilder::default().build_from_claims(&[ClaimSpec::new("retaliation")]);
//! assert_eq!(manual.find_unsatisfied_requirements().len(), 3);
//! ```
//!
//! [`Backend`]: docket_domain::traits::Backend

#![warn(missing_docs)]

pub mod catalog;
mod config;
mod dependency;
mod error;
pub mod heuristics;
mod knowledge;
mod legal;
mod parser;
mod prompt;

pub use catalog::{default_statutes, RequirementTemplate, Statute};
pub use config::ExtractorConfig;
pub use dependency::{resolve_claim, ClaimSpec, DependencyGraphBuilder, EvidenceApplication, ENTITY_ID_ATTRIBUTE};
pub use error::ExtractorError;
pub use knowledge::{KnowledgeGraphBuilder, SOURCE_ANSWER, SOURCE_NARRATIVE};
pub use legal::{requirement_id, LegalGraphBuilder, REQUIREMENT_KEY_ATTRIBUTE};
pub use parser::{parse_llm_response, EntityCandidate, ParsedExtraction, RelationshipCandidate};
pub use prompt::PromptBuilder;
