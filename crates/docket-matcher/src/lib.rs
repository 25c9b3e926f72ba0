//! Docket Matcher
//!
//! Joins the claims of a dependency graph with the requirements of a legal graph
//! and rates how viable each claim is.
//!
//! # Examples
//!
//! ```
//! use docket_domain::KnowledgeGraph;
//! use docket_extractor::{ClaimSpec, DependencyGraphBuilder, LegalGraphBuilder};
//! use docket_matcher::{NeurosymbolicMatcher, Viability};
//!
//! let dg = DependencyGraphBuilder::default().build_from_claims(&[ClaimSpec::new("retaliation")]);
//! let lg = LegalGraphBuilder::new().build_for_claim_types(&["retaliation"], "federal");
//!
//! let matcher = NeurosymbolicMatcher::default();
//! let results = matcher.match_claims_to_law(&KnowledgeGraph::new(), &dg, &lg);
//! assert_eq!(results.unmatched_requirements.len(), 3);
//!
//! let report = matcher.assess_claim_viability(&results);
//! assert_eq!(report.claim_assessments[0].viability, Viability::Insufficient);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod matcher;

pub use config::MatcherConfig;
pub use error::MatcherError;
pub use matcher::{
    ClaimAssessment, ClaimMatchSummary, MatchResults, NeurosymbolicMatcher, RequirementMatch,
    UnmatchedRequirement, Viability, ViabilityReport, APPLICABILITY_ATTRIBUTE,
};
