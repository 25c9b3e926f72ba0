//! Pipeline error types

use docket_domain::Phase;
use docket_extractor::ExtractorError;
use docket_store::StoreError;
use thiserror::Error;

/// A phase transition the phase manager refused
///
/// Returned as a value from [`crate::PhaseManager::advance_to_phase`]; the
/// session is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot move from {current} to {requested}: {criterion}")]
pub struct PhaseTransitionRejected {
    /// Phase the session is in
    pub current: Phase,
    /// Phase that was requested
    pub requested: Phase,
    /// The unmet criterion
    pub criterion: String,
}

/// Errors that can occur while driving a session
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Extraction failed (a backend failure surfaces here unchanged)
    #[error("Extraction error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Evidence store or persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation that needs a narrative ran before `start`
    #[error("Session has not been started")]
    NotStarted,

    /// `start` ran twice
    #[error("Session has already been started")]
    AlreadyStarted,

    /// The operation is not available in the current phase
    #[error("{operation} requires phase {expected}, session is in {actual}")]
    WrongPhase {
        /// Operation attempted
        operation: String,
        /// Phase the operation requires
        expected: Phase,
        /// Phase the session is in
        actual: Phase,
    },

    /// No question with this id was ever asked
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),
}
