//! Docket Storage Layer
//!
//! Two concerns live here:
//!
//! - **Graph documents**: the knowledge, dependency and legal graphs saved to and
//!   loaded from JSON. Every document carries `metadata {created_at, last_updated,
//!   version}` plus id-keyed maps of nodes and edges, so a saved graph loads back
//!   equal to the original.
//! - **Evidence**: [`SqliteEvidenceStore`] implements the
//!   [`EvidenceStore`](docket_domain::traits::EvidenceStore) trait on SQLite.
//!
//! # Examples
//!
//! ```no_run
//! use docket_domain::{Entity, EntityType, KnowledgeGraph};
//! use docket_store::{load, save};
//!
//! let mut kg = KnowledgeGraph::new();
//! kg.add_entity(Entity::new(EntityType::Person, "Jane Doe"));
//! save(&kg, "case.kg.json").unwrap();
//!
//! let restored: KnowledgeGraph = load("case.kg.json").unwrap();
//! assert_eq!(restored, kg);
//! ```

#![warn(missing_docs)]

pub mod evidence;
pub mod persist;
pub mod schema;

use thiserror::Error;

pub use evidence::SqliteEvidenceStore;
pub use persist::{from_json, load, save, to_json, PersistentGraph};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Well-formed JSON or SQL row that does not describe a valid record
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
