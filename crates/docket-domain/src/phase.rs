//! Pipeline phases

use std::fmt;

/// A pipeline phase
///
/// Phases form a strict linear order. The only legal transition is to
/// [`Phase::next`]; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Narrative intake and claim denoising
    Intake,
    /// Closing evidentiary gaps
    Evidence,
    /// Matching claims to law and drafting the complaint
    Formalization,
}

impl Phase {
    /// Every phase, in pipeline order
    pub const ALL: [Phase; 3] = [Phase::Intake, Phase::Evidence, Phase::Formalization];

    /// The phase that follows this one
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Intake => Some(Phase::Evidence),
            Phase::Evidence => Some(Phase::Formalization),
            Phase::Formalization => None,
        }
    }

    /// Whether this is the last phase
    pub fn is_final(&self) -> bool {
        self.next().is_none()
    }

    /// Get the phase name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Intake => "intake",
            Phase::Evidence => "evidence",
            Phase::Formalization => "formalization",
        }
    }

    /// Parse a phase from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid phase: {}", s))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}
