//! Graph metadata, identifiers and timestamps

use std::time::{SystemTime, UNIX_EPOCH};

/// Version tag written into every persisted graph
pub const GRAPH_FORMAT_VERSION: &str = "1.0";

/// Current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Generate a new identifier of the form `<prefix>_<uuidv7>`
///
/// UUIDv7 keeps identifiers chronologically sortable, which makes persisted graphs
/// easier to read back in creation order.
///
/// # Examples
///
/// ```
/// use docket_domain::new_id;
///
/// let id = new_id("claim");
/// assert!(id.starts_with("claim_"));
/// assert_ne!(id, new_id("claim"));
/// ```
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::now_v7().simple())
}

/// Bookkeeping carried by every graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphMetadata {
    /// When the graph was created
    pub created_at: u64,

    /// When the graph was last mutated
    pub last_updated: u64,

    /// Serialization format version
    pub version: String,
}

impl GraphMetadata {
    /// Metadata for a graph created now
    pub fn new() -> Self {
        let now = current_timestamp();
        Self {
            created_at: now,
            last_updated: now,
            version: GRAPH_FORMAT_VERSION.to_string(),
        }
    }

    /// Refresh `last_updated`
    pub fn touch(&mut self) {
        self.last_updated = current_timestamp().max(self.created_at);
    }
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_prefixed_and_unique() {
        let a = new_id("entity");
        let b = new_id("entity");
        assert!(a.starts_with("entity_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_touch_never_precedes_creation() {
        let mut metadata = GraphMetadata::new();
        metadata.touch();
        assert!(metadata.last_updated >= metadata.created_at);
        assert_eq!(metadata.version, GRAPH_FORMAT_VERSION);
    }
}
