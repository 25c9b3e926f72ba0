//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Implementations live in other crates (`docket-llm`, `docket-store`).

use crate::{EvidenceHandle, EvidenceRecord};

/// A blocking text-in/text-out language model backend
///
/// The core never retries; a failure is surfaced to the caller as-is.
pub trait Backend {
    /// Error type for backend calls
    type Error;

    /// Send a prompt and return the completion text
    fn invoke(&self, prompt: &str) -> Result<String, Self::Error>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    type Error = B::Error;

    fn invoke(&self, prompt: &str) -> Result<String, Self::Error> {
        (**self).invoke(prompt)
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    type Error = B::Error;

    fn invoke(&self, prompt: &str) -> Result<String, Self::Error> {
        (**self).invoke(prompt)
    }
}

/// Storage for evidence records
///
/// Implemented by the infrastructure layer (docket-store)
pub trait EvidenceStore {
    /// Error type for store operations
    type Error;

    /// Persist a record and return its handle
    fn store_evidence(&mut self, record: &EvidenceRecord) -> Result<EvidenceHandle, Self::Error>;

    /// All evidence previously stored for a case, oldest first
    fn list_evidence(&self, case_id: &str) -> Result<Vec<EvidenceRecord>, Self::Error>;
}
