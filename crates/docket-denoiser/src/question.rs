//! Questions, their targets, and the diffs answers produce

use docket_domain::{GapKind, Phase};

/// What a question is trying to resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionTarget {
    /// A knowledge-graph gap
    Gap {
        /// Stable gap id
        gap_id: String,
        /// Entity the gap belongs to (or the unresolved id)
        entity_id: String,
        /// What is missing
        kind: GapKind,
    },
    /// An unsatisfied dependency-graph requirement to establish with facts
    Requirement {
        /// Requirement node
        requirement_id: String,
        /// Owning claim node
        claim_id: String,
        /// Catalog key
        requirement_key: String,
    },
    /// An unsatisfied requirement to establish with documents or witnesses
    Evidence {
        /// Requirement node
        requirement_id: String,
        /// Owning claim node
        claim_id: String,
        /// Catalog key
        requirement_key: String,
    },
    /// A legal requirement no claim element establishes
    LegalRequirement {
        /// Legal-graph requirement element
        requirement_id: String,
        /// Dependency-graph claim node
        claim_id: String,
        /// Requirement key
        requirement_key: String,
    },
}

impl QuestionTarget {
    /// Stable key; asking about the same target always yields the same question id
    pub fn key(&self) -> String {
        match self {
            QuestionTarget::Gap { gap_id, .. } => format!("gap:{}", gap_id),
            QuestionTarget::Requirement { requirement_id, .. } => format!("req:{}", requirement_id),
            QuestionTarget::Evidence { requirement_id, .. } => format!("evidence:{}", requirement_id),
            QuestionTarget::LegalRequirement {
                requirement_id,
                claim_id,
                ..
            } => format!("legal:{}:{}", claim_id, requirement_id),
        }
    }
}

/// A question to put to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Stable id derived from the target
    pub id: String,
    /// Question text
    pub text: String,
    /// What answering it resolves
    pub target: QuestionTarget,
    /// Value of asking (higher first)
    pub priority: f64,
    /// Phase the question was generated for
    pub phase: Phase,
}

impl Question {
    /// Build a question whose id follows from its target
    pub fn new(text: impl Into<String>, target: QuestionTarget, priority: f64, phase: Phase) -> Self {
        Self {
            id: format!("q:{}", target.key()),
            text: text.into(),
            target,
            priority,
            phase,
        }
    }
}

/// What applying one answer changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerDiff {
    /// Question the answer was for
    pub question_id: String,
    /// Knowledge-graph entities added
    pub entities_added: Vec<String>,
    /// Knowledge-graph relationships added
    pub relationships_added: Vec<String>,
    /// `(entity_id, attribute)` pairs written
    pub attributes_set: Vec<(String, String)>,
    /// Dependency-graph requirement nodes newly satisfied
    pub requirements_satisfied: Vec<String>,
    /// Set when the question had already been answered and nothing was applied
    pub already_answered: bool,
}

impl AnswerDiff {
    pub(crate) fn new(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            ..Self::default()
        }
    }

    /// Whether the answer changed nothing
    pub fn is_empty(&self) -> bool {
        self.entities_added.is_empty()
            && self.relationships_added.is_empty()
            && self.attributes_set.is_empty()
            && self.requirements_satisfied.is_empty()
    }
}

/// One question and the answer given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Question text
    pub question: String,
    /// Answer text
    pub answer: String,
}

impl ConversationTurn {
    /// Create a turn
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
