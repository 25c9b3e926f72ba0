//! Phase state machine and per-phase bookkeeping
//!
//! The manager owns the canonical graphs of a case. Components borrow them for
//! one operation at a time and report back through phase data and iteration
//! records.

use crate::{PhaseTransitionRejected, PipelineConfig};
use docket_domain::{AttributeValue, DependencyGraph, KnowledgeGraph, LegalGraph, Phase};
use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, info, warn};

/// The three graphs of a case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseGraphs {
    /// Facts, parties and claims
    pub knowledge: KnowledgeGraph,
    /// Claims and the requirements each must satisfy
    pub dependency: DependencyGraph,
    /// Statutes, requirements and rules of procedure
    pub legal: LegalGraph,
}

/// Well-known phase data keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhaseKey {
    /// Latest noise level
    NoiseLevel,
    /// Whether the denoiser ran out of questions
    Exhausted,
    /// Share of requirements without any evidence attached
    EvidenceGapRatio,
    /// Evidence records applied in this phase
    EvidenceCount,
    /// Unmatched share of legal requirements
    MatchingNoise,
    /// Legal-matching questions still open
    OutstandingLegalQuestions,
    /// Claims assessed as moderate or strong
    ViableClaims,
    /// Rendered complaint text
    FormalComplaint,
    /// Narrative summary of the case so far
    Summary,
    /// Anything else
    Custom(String),
}

impl PhaseKey {
    /// Key name
    pub fn as_str(&self) -> &str {
        match self {
            PhaseKey::NoiseLevel => "noise_level",
            PhaseKey::Exhausted => "exhausted",
            PhaseKey::EvidenceGapRatio => "evidence_gap_ratio",
            PhaseKey::EvidenceCount => "evidence_count",
            PhaseKey::MatchingNoise => "matching_noise",
            PhaseKey::OutstandingLegalQuestions => "outstanding_legal_questions",
            PhaseKey::ViableClaims => "viable_claims",
            PhaseKey::FormalComplaint => "formal_complaint",
            PhaseKey::Summary => "summary",
            PhaseKey::Custom(name) => name,
        }
    }
}

impl fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value store scoped to one phase
pub type PhaseData = IndexMap<PhaseKey, AttributeValue>;

/// One recorded refinement iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    /// 1-based, increases by exactly one per record
    pub sequence: usize,
    /// Phase the iteration ran in
    pub phase: Phase,
    /// Noise level after the iteration
    pub noise_level: f64,
    /// Free-form metrics
    pub metrics: IndexMap<String, f64>,
}

/// What the session should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// The current phase still needs answers or evidence
    AnswerQuestion,
    /// The current phase is complete and another follows
    AdvancePhase,
    /// FORMALIZATION is complete
    GenerateComplaint,
}

impl NextAction {
    /// Action name
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::AnswerQuestion => "answer_question",
            NextAction::AdvancePhase => "advance_phase",
            NextAction::GenerateComplaint => "generate_complaint",
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds the completion predicates and convergence check use
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCriteria {
    /// INTAKE: noise level must drop below this
    pub intake_noise_threshold: f64,
    /// EVIDENCE: evidence gap ratio must drop below this
    pub evidence_gap_threshold: f64,
    /// FORMALIZATION: matching noise must drop below this
    pub matching_noise_threshold: f64,
    /// Trailing iterations inspected for convergence
    pub convergence_window: usize,
    /// Convergence threshold
    pub convergence_threshold: f64,
}

impl From<&PipelineConfig> for PhaseCriteria {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            intake_noise_threshold: config.intake_noise_threshold,
            evidence_gap_threshold: config.evidence_gap_threshold,
            matching_noise_threshold: config.matching_noise_threshold,
            convergence_window: config.convergence_window,
            convergence_threshold: config.convergence_threshold,
        }
    }
}

impl Default for PhaseCriteria {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Linear INTAKE → EVIDENCE → FORMALIZATION state machine
#[derive(Debug, Clone)]
pub struct PhaseManager {
    criteria: PhaseCriteria,
    current: Phase,
    graphs: CaseGraphs,
    data: IndexMap<Phase, PhaseData>,
    history: Vec<IterationRecord>,
}

impl Default for PhaseManager {
    fn default() -> Self {
        Self::new(PhaseCriteria::default())
    }
}

impl PhaseManager {
    /// Start in INTAKE with empty graphs
    pub fn new(criteria: PhaseCriteria) -> Self {
        Self {
            criteria,
            current: Phase::Intake,
            graphs: CaseGraphs::default(),
            data: IndexMap::new(),
            history: Vec::new(),
        }
    }

    /// Completion thresholds
    pub fn criteria(&self) -> &PhaseCriteria {
        &self.criteria
    }

    /// Current phase
    pub fn current_phase(&self) -> Phase {
        self.current
    }

    /// The case graphs
    pub fn graphs(&self) -> &CaseGraphs {
        &self.graphs
    }

    /// Mutable access to the case graphs
    pub fn graphs_mut(&mut self) -> &mut CaseGraphs {
        &mut self.graphs
    }

    /// Move to `target`
    ///
    /// Only the phase immediately after the current one may be requested, and
    /// only once the current phase is complete. A refusal leaves the manager
    /// untouched.
    pub fn advance_to_phase(&mut self, target: Phase) -> Result<Phase, PhaseTransitionRejected> {
        let reject = |criterion: String| PhaseTransitionRejected {
            current: self.current,
            requested: target,
            criterion,
        };

        let refusal = match self.current.next() {
            None => Some(reject(format!("{} is the final phase", self.current))),
            Some(next) if next != target => Some(reject(format!(
                "phases advance one step at a time; the next phase is {}",
                next
            ))),
            Some(_) if !self.is_phase_complete(self.current) => Some(reject(self.unmet_criterion(self.current))),
            Some(_) => None,
        };
        if let Some(refusal) = refusal {
            warn!(current = %refusal.current, requested = %refusal.requested, "{}", refusal.criterion);
            return Err(refusal);
        }

        let from = self.current;
        self.current = target;
        info!(from = %from, to = %target, "Advanced phase");
        Ok(target)
    }

    /// Whether `phase` has met its completion criterion
    ///
    /// - INTAKE: noise level below threshold, or the denoiser is exhausted
    /// - EVIDENCE: at least one evidence record applied and the evidence gap
    ///   ratio below threshold
    /// - FORMALIZATION: matching noise below threshold, or no legal-matching
    ///   questions outstanding
    ///
    /// A phase with no recorded measurements is not complete.
    pub fn is_phase_complete(&self, phase: Phase) -> bool {
        match phase {
            Phase::Intake => {
                self.number(phase, &PhaseKey::NoiseLevel)
                    .is_some_and(|n| n < self.criteria.intake_noise_threshold)
                    || self.flag(phase, &PhaseKey::Exhausted)
            }
            Phase::Evidence => {
                self.number(phase, &PhaseKey::EvidenceCount).is_some_and(|n| n >= 1.0)
                    && self
                        .number(phase, &PhaseKey::EvidenceGapRatio)
                        .is_some_and(|r| r < self.criteria.evidence_gap_threshold)
            }
            Phase::Formalization => {
                self.number(phase, &PhaseKey::MatchingNoise)
                    .is_some_and(|n| n < self.criteria.matching_noise_threshold)
                    || self
                        .number(phase, &PhaseKey::OutstandingLegalQuestions)
                        .is_some_and(|n| n == 0.0)
            }
        }
    }

    fn unmet_criterion(&self, phase: Phase) -> String {
        let shown = |key: &PhaseKey| {
            self.number(phase, key)
                .map(|n| format!("{:.3}", n))
                .unwrap_or_else(|| "unmeasured".to_string())
        };
        match phase {
            Phase::Intake => format!(
                "noise level {} is not below {:.3} and questions remain",
                shown(&PhaseKey::NoiseLevel),
                self.criteria.intake_noise_threshold
            ),
            Phase::Evidence if !self.number(phase, &PhaseKey::EvidenceCount).is_some_and(|n| n >= 1.0) => {
                "no evidence has been submitted".to_string()
            }
            Phase::Evidence => format!(
                "evidence gap ratio {} is not below {:.3}",
                shown(&PhaseKey::EvidenceGapRatio),
                self.criteria.evidence_gap_threshold
            ),
            Phase::Formalization => format!(
                "matching noise {} is not below {:.3} and legal questions remain",
                shown(&PhaseKey::MatchingNoise),
                self.criteria.matching_noise_threshold
            ),
        }
    }

    /// Set a value in `phase`'s namespace, returning the previous one
    pub fn update_phase_data(
        &mut self,
        phase: Phase,
        key: PhaseKey,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        let value = value.into();
        debug!(phase = %phase, key = %key, value = %value, "Updated phase data");
        self.data.entry(phase).or_default().insert(key, value)
    }

    /// Read a value from `phase`'s namespace
    pub fn get_phase_data(&self, phase: Phase, key: &PhaseKey) -> Option<&AttributeValue> {
        self.data.get(&phase).and_then(|d| d.get(key))
    }

    /// Everything stored for `phase`
    pub fn phase_data(&self, phase: Phase) -> Option<&PhaseData> {
        self.data.get(&phase)
    }

    fn number(&self, phase: Phase, key: &PhaseKey) -> Option<f64> {
        match self.get_phase_data(phase, key) {
            Some(AttributeValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn flag(&self, phase: Phase, key: &PhaseKey) -> bool {
        matches!(self.get_phase_data(phase, key), Some(AttributeValue::Flag(true)))
    }

    /// Append an iteration to the history of the current phase
    pub fn record_iteration(&mut self, noise_level: f64, metrics: IndexMap<String, f64>) -> &IterationRecord {
        let record = IterationRecord {
            sequence: self.history.len() + 1,
            phase: self.current,
            noise_level,
            metrics,
        };
        debug!(sequence = record.sequence, phase = %record.phase, noise_level, "Recorded iteration");
        self.history.push(record);
        &self.history[self.history.len() - 1]
    }

    /// Iterations recorded across all phases
    pub fn iteration_count(&self) -> usize {
        self.history.len()
    }

    /// Full iteration history, oldest first
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Whether the last `convergence_window` iterations of the current phase
    /// all stayed below the convergence threshold
    pub fn has_converged(&self) -> bool {
        let window = self.criteria.convergence_window;
        let in_phase: Vec<&IterationRecord> = self
            .history
            .iter()
            .rev()
            .take_while(|r| r.phase == self.current)
            .take(window)
            .collect();
        in_phase.len() == window
            && in_phase
                .iter()
                .all(|r| r.noise_level < self.criteria.convergence_threshold)
    }

    /// What to do next, from the current phase and its data alone
    pub fn get_next_action(&self) -> NextAction {
        if !self.is_phase_complete(self.current) {
            NextAction::AnswerQuestion
        } else if self.current.is_final() {
            NextAction::GenerateComplaint
        } else {
            NextAction::AdvancePhase
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PhaseManager {
        PhaseManager::new(PhaseCriteria::default())
    }

    fn into_evidence(pm: &mut PhaseManager) {
        pm.update_phase_data(Phase::Intake, PhaseKey::NoiseLevel, 0.1);
        pm.advance_to_phase(Phase::Evidence).unwrap();
    }

    #[test]
    fn test_starts_in_intake() {
        let pm = manager();
        assert_eq!(pm.current_phase(), Phase::Intake);
        assert_eq!(pm.iteration_count(), 0);
        assert_eq!(pm.get_next_action(), NextAction::AnswerQuestion);
    }

    #[test]
    fn test_cannot_skip_to_formalization() {
        let mut pm = manager();
        pm.update_phase_data(Phase::Intake, PhaseKey::NoiseLevel, 0.0);

        let refusal = pm.advance_to_phase(Phase::Formalization).unwrap_err();
        assert_eq!(refusal.current, Phase::Intake);
        assert_eq!(refusal.requested, Phase::Formalization);
        assert!(refusal.criterion.contains("EVIDENCE"));
        assert_eq!(pm.current_phase(), Phase::Intake);
    }

    #[test]
    fn test_cannot_revert_or_stay() {
        let mut pm = manager();
        into_evidence(&mut pm);
        assert!(pm.advance_to_phase(Phase::Intake).is_err());
        assert!(pm.advance_to_phase(Phase::Evidence).is_err());
        assert_eq!(pm.current_phase(), Phase::Evidence);
    }

    #[test]
    fn test_incomplete_intake_is_refused() {
        let mut pm = manager();
        pm.update_phase_data(Phase::Intake, PhaseKey::NoiseLevel, 0.6);

        let refusal = pm.advance_to_phase(Phase::Evidence).unwrap_err();
        assert!(refusal.criterion.contains("0.600"), "{}", refusal.criterion);
        assert_eq!(pm.current_phase(), Phase::Intake);
    }

    #[test]
    fn test_exhausted_intake_is_complete() {
        let mut pm = manager();
        pm.update_phase_data(Phase::Intake, PhaseKey::NoiseLevel, 0.9);
        assert!(!pm.is_phase_complete(Phase::Intake));
        pm.update_phase_data(Phase::Intake, PhaseKey::Exhausted, true);
        assert!(pm.is_phase_complete(Phase::Intake));
        assert_eq!(pm.get_next_action(), NextAction::AdvancePhase);
    }

    #[test]
    fn test_evidence_completion_follows_gap_ratio() {
        let mut pm = manager();
        into_evidence(&mut pm);
        assert!(!pm.is_phase_complete(Phase::Evidence));

        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceGapRatio, 1.0);
        assert!(!pm.is_phase_complete(Phase::Evidence));

        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceGapRatio, 0.25);
        assert!(!pm.is_phase_complete(Phase::Evidence));

        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceCount, 2.0);
        assert!(pm.is_phase_complete(Phase::Evidence));
    }

    #[test]
    fn test_evidence_needs_a_record_even_at_zero_gap() {
        let mut pm = manager();
        into_evidence(&mut pm);
        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceGapRatio, 0.0);
        assert!(!pm.is_phase_complete(Phase::Evidence));

        let refusal = pm.advance_to_phase(Phase::Formalization).unwrap_err();
        assert_eq!(refusal.current, Phase::Evidence);
        assert!(refusal.criterion.contains("no evidence"));
        assert_eq!(pm.current_phase(), Phase::Evidence);
    }

    #[test]
    fn test_formalization_completion() {
        let mut pm = manager();
        into_evidence(&mut pm);
        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceGapRatio, 0.0);
        pm.update_phase_data(Phase::Evidence, PhaseKey::EvidenceCount, 1.0);
        pm.advance_to_phase(Phase::Formalization).unwrap();

        pm.update_phase_data(Phase::Formalization, PhaseKey::MatchingNoise, 0.5);
        pm.update_phase_data(Phase::Formalization, PhaseKey::OutstandingLegalQuestions, 2.0);
        assert_eq!(pm.get_next_action(), NextAction::AnswerQuestion);

        pm.update_phase_data(Phase::Formalization, PhaseKey::OutstandingLegalQuestions, 0.0);
        assert_eq!(pm.get_next_action(), NextAction::GenerateComplaint);

        let refusal = pm.advance_to_phase(Phase::Formalization).unwrap_err();
        assert!(refusal.criterion.contains("final"));
    }

    #[test]
    fn test_phase_data_is_namespaced() {
        let mut pm = manager();
        pm.update_phase_data(Phase::Intake, PhaseKey::Custom("note".into()), "intake");
        assert!(pm
            .get_phase_data(Phase::Evidence, &PhaseKey::Custom("note".into()))
            .is_none());
        let previous = pm.update_phase_data(Phase::Intake, PhaseKey::Custom("note".into()), "again");
        assert_eq!(previous, Some(AttributeValue::from("intake")));
    }

    #[test]
    fn test_iteration_sequence_is_monotonic() {
        let mut pm = manager();
        for i in 0..4 {
            let record = pm.record_iteration(0.5, IndexMap::new());
            assert_eq!(record.sequence, i + 1);
        }
        assert_eq!(pm.iteration_count(), 4);
    }

    #[test]
    fn test_convergence_uses_trailing_window_of_current_phase() {
        let mut pm = manager();
        pm.record_iteration(0.9, IndexMap::new());
        pm.record_iteration(0.2, IndexMap::new());
        pm.record_iteration(0.1, IndexMap::new());
        assert!(!pm.has_converged());

        pm.record_iteration(0.1, IndexMap::new());
        assert!(pm.has_converged());

        into_evidence(&mut pm);
        assert!(!pm.has_converged());
    }
}
