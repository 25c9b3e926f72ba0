//! Session status and counters

use crate::NextAction;
use docket_domain::Phase;
use std::collections::HashMap;
use std::fmt;

/// Counters collected over a session
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    /// Questions offered per phase (repeats included)
    pub questions_offered: HashMap<Phase, usize>,

    /// Answers applied per phase
    pub answers_applied: HashMap<Phase, usize>,

    /// Re-submitted answers that changed nothing
    pub duplicate_answers: usize,

    /// Evidence records applied
    pub evidence_applied: usize,

    /// Requirement nodes satisfied by answers or evidence
    pub requirements_satisfied: usize,

    /// Successful phase transitions
    pub transitions: usize,

    /// Refused phase transitions
    pub rejected_transitions: usize,
}

impl SessionMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record questions offered in a phase
    pub fn record_questions(&mut self, phase: Phase, count: usize) {
        *self.questions_offered.entry(phase).or_insert(0) += count;
    }

    /// Record an applied answer
    pub fn record_answer(&mut self, phase: Phase, satisfied: usize) {
        *self.answers_applied.entry(phase).or_insert(0) += 1;
        self.requirements_satisfied += satisfied;
    }

    /// Record a duplicate answer
    pub fn record_duplicate(&mut self) {
        self.duplicate_answers += 1;
    }

    /// Record applied evidence
    pub fn record_evidence(&mut self, satisfied: usize) {
        self.evidence_applied += 1;
        self.requirements_satisfied += satisfied;
    }

    /// Record a phase transition
    pub fn record_transition(&mut self) {
        self.transitions += 1;
    }

    /// Record a refused transition
    pub fn record_rejection(&mut self) {
        self.rejected_transitions += 1;
    }

    /// Questions offered across all phases
    pub fn total_questions(&self) -> usize {
        self.questions_offered.values().sum()
    }

    /// Answers applied across all phases
    pub fn total_answers(&self) -> usize {
        self.answers_applied.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Session Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Questions offered: {}", self.total_questions()),
            format!("Answers applied: {}", self.total_answers()),
        ];

        for phase in Phase::ALL {
            let offered = self.questions_offered.get(&phase).copied().unwrap_or(0);
            let answered = self.answers_applied.get(&phase).copied().unwrap_or(0);
            if offered > 0 || answered > 0 {
                lines.push(format!("  {}: {} offered, {} answered", phase, offered, answered));
            }
        }

        lines.push(format!("Duplicate answers: {}", self.duplicate_answers));
        lines.push(format!("Evidence applied: {}", self.evidence_applied));
        lines.push(format!("Requirements satisfied: {}", self.requirements_satisfied));
        lines.push(format!(
            "Phase transitions: {} ({} refused)",
            self.transitions, self.rejected_transitions
        ));
        lines.join("\n")
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// Case id
    pub case_id: String,
    /// Whether `start` has run
    pub started: bool,
    /// Current phase
    pub phase: Phase,
    /// Iterations recorded so far
    pub iteration_count: usize,
    /// Latest noise level, if measured
    pub noise_level: Option<f64>,
    /// Whether the current phase has met its completion criterion
    pub phase_complete: bool,
    /// Whether the trailing iterations converged
    pub converged: bool,
    /// Whether noise stopped dropping
    pub stagnating: bool,
    /// Mean claim readiness
    pub readiness: f64,
    /// Claims in the dependency graph
    pub claims: usize,
    /// Questions offered and not yet answered
    pub pending_questions: usize,
    /// Evidence records applied
    pub evidence_count: usize,
    /// Recommended next step
    pub next_action: NextAction,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Case: {}", self.case_id)?;
        if !self.started {
            return writeln!(f, "Not started");
        }
        writeln!(f, "Phase: {}", self.phase)?;
        match self.noise_level {
            Some(noise) => writeln!(f, "Noise level: {:.3}", noise)?,
            None => writeln!(f, "Noise level: unmeasured")?,
        }
        writeln!(f, "Iterations: {}", self.iteration_count)?;
        writeln!(f, "Claims: {} (readiness {:.0}%)", self.claims, self.readiness * 100.0)?;
        writeln!(f, "Evidence: {}", self.evidence_count)?;
        writeln!(f, "Pending questions: {}", self.pending_questions)?;
        if self.stagnating {
            writeln!(f, "Progress has stalled; more questions will be offered per turn")?;
        }
        writeln!(f, "Converged: {}", if self.converged { "yes" } else { "no" })?;
        write!(f, "Next action: {}", self.next_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_reset() {
        let mut metrics = SessionMetrics::new();
        metrics.record_questions(Phase::Intake, 3);
        metrics.record_questions(Phase::Evidence, 2);
        metrics.record_answer(Phase::Intake, 1);
        metrics.record_evidence(2);
        metrics.record_duplicate();

        assert_eq!(metrics.total_questions(), 5);
        assert_eq!(metrics.total_answers(), 1);
        assert_eq!(metrics.requirements_satisfied, 3);

        let summary = metrics.summary();
        assert!(summary.contains("INTAKE: 3 offered, 1 answered"));
        assert!(summary.contains("Duplicate answers: 1"));
        assert!(!summary.contains("FORMALIZATION"));

        metrics.reset();
        assert_eq!(metrics.total_questions(), 0);
        assert_eq!(metrics.evidence_applied, 0);
    }
}
