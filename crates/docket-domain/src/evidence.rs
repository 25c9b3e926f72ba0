//! Evidence records submitted during the EVIDENCE phase

use crate::confidence::clamp_confidence;
use crate::metadata::{current_timestamp, new_id};

/// A piece of evidence tied to a claim
///
/// Records live in the evidence store. When applied to a case, the knowledge
/// graph receives a new entity derived from the record; the record itself is
/// never shared with the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    /// Identifier assigned on creation
    pub id: String,
    /// Case this evidence belongs to
    pub case_id: String,
    /// Claim id (dependency graph claim node) the evidence is offered for
    pub claim_id: String,
    /// Human-readable description
    pub description: String,
    /// Free-form kind, e.g. "document", "email", "witness"
    pub evidence_type: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Requirement keys this evidence is offered to satisfy (may be empty)
    pub supports: Vec<String>,
    /// Unix seconds
    pub submitted_at: u64,
}

impl EvidenceRecord {
    /// Create a record with a generated id, type "document" and confidence 1.0
    pub fn new(
        case_id: impl Into<String>,
        claim_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("ev"),
            case_id: case_id.into(),
            claim_id: claim_id.into(),
            description: description.into(),
            evidence_type: "document".to_string(),
            confidence: 1.0,
            supports: Vec::new(),
            submitted_at: current_timestamp(),
        }
    }

    /// Set the evidence type
    pub fn with_type(mut self, evidence_type: impl Into<String>) -> Self {
        self.evidence_type = evidence_type.into();
        self
    }

    /// Set the confidence (clamped)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Target specific requirement keys
    pub fn supporting<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supports = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Receipt returned by an evidence store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceHandle {
    /// Evidence id
    pub evidence_id: String,
    /// Case id
    pub case_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let record = EvidenceRecord::new("case_1", "claim_1", "Termination letter")
            .with_type("letter")
            .with_confidence(1.7)
            .supporting(["adverse_action"]);
        assert!(record.id.starts_with("ev_"));
        assert_eq!(record.evidence_type, "letter");
        assert_eq!(record.confidence, 1.0);
        assert_eq!(record.supports, vec!["adverse_action".to_string()]);
    }
}
