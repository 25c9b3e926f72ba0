//! JSON save/load for the three graphs

use crate::schema::{DependencyGraphDocument, KnowledgeGraphDocument, LegalGraphDocument};
use crate::StoreError;
use docket_domain::{DependencyGraph, KnowledgeGraph, LegalGraph};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A graph with a JSON document representation
pub trait PersistentGraph: Sized {
    /// Document type written to disk
    type Document: Serialize + DeserializeOwned;

    /// Snapshot the graph as a document
    fn to_document(&self) -> Self::Document;

    /// Rebuild the graph from a document
    fn from_document(doc: Self::Document) -> Result<Self, StoreError>;
}

impl PersistentGraph for KnowledgeGraph {
    type Document = KnowledgeGraphDocument;

    fn to_document(&self) -> Self::Document {
        self.into()
    }

    fn from_document(doc: Self::Document) -> Result<Self, StoreError> {
        doc.try_into()
    }
}

impl PersistentGraph for DependencyGraph {
    type Document = DependencyGraphDocument;

    fn to_document(&self) -> Self::Document {
        self.into()
    }

    fn from_document(doc: Self::Document) -> Result<Self, StoreError> {
        doc.try_into()
    }
}

impl PersistentGraph for LegalGraph {
    type Document = LegalGraphDocument;

    fn to_document(&self) -> Self::Document {
        self.into()
    }

    fn from_document(doc: Self::Document) -> Result<Self, StoreError> {
        doc.try_into()
    }
}

/// Serialize a graph to pretty-printed JSON
pub fn to_json<G: PersistentGraph>(graph: &G) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(&graph.to_document())?)
}

/// Parse a graph from JSON
pub fn from_json<G: PersistentGraph>(json: &str) -> Result<G, StoreError> {
    let doc: G::Document = serde_json::from_str(json)?;
    G::from_document(doc)
}

/// Write a graph to `path`, replacing any existing file
pub fn save<G: PersistentGraph>(graph: &G, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let json = to_json(graph)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), "Graph saved");
    Ok(())
}

/// Read a graph from `path`
///
/// A missing file is reported as [`StoreError::NotFound`].
pub fn load<G: PersistentGraph>(path: impl AsRef<Path>) -> Result<G, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let json = fs::read_to_string(path)?;
    let graph = from_json(&json)?;
    debug!(path = %path.display(), "Graph loaded");
    Ok(graph)
}
