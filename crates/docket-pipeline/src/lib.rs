//! Docket Pipeline
//!
//! Drives a single case from a free-form narrative to a draft complaint in
//! three phases:
//!
//! ```text
//! INTAKE ──────────▶ EVIDENCE ──────────▶ FORMALIZATION
//! noise < 0.3        evidence gap          matching noise < 0.2
//! or exhausted       ratio < 0.3           or no legal questions left
//! ```
//!
//! The [`PhaseManager`] owns the case graphs, the per-phase data store and the
//! iteration history, and refuses any transition that skips a phase or leaves
//! an incomplete one. The [`Orchestrator`] composes the graph builders, the
//! denoiser and the matcher around it and exposes the session operations:
//! `start`, `submit_answer`, `add_evidence`, `advance_phase`,
//! `generate_formal_complaint` and `status`.
//!
//! # Examples
//!
//! ```
//! use docket_pipeline::{AdvanceOutcome, Orchestrator, PipelineConfig};
//!
//! let mut session = Orchestrator::new("case-7", PipelineConfig::default()).unwrap();
//! session.start("My manager fired me after I reported unpaid overtime.").unwrap();
//!
//! // INTAKE is not complete yet, so the request is refused
//! match session.advance_phase().unwrap() {
//!     AdvanceOutcome::Rejected(refusal) => println!("{}", refusal),
//!     AdvanceOutcome::Advanced { .. } => unreachable!(),
//! }
//! ```

#![warn(missing_docs)]

pub mod complaint;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod phase_manager;
pub mod status;

pub use complaint::{ComplaintCount, CountElement, Exhibit, FormalComplaint};
pub use config::PipelineConfig;
pub use error::{PhaseTransitionRejected, PipelineError};
pub use orchestrator::{
    evidence_gap_ratio, AdvanceOutcome, EvidenceOutcome, Orchestrator, TurnOutcome, SOURCE_EVIDENCE,
};
pub use phase_manager::{
    CaseGraphs, IterationRecord, NextAction, PhaseCriteria, PhaseData, PhaseKey, PhaseManager,
};
pub use status::{SessionMetrics, SessionStatus};
