//! Session driver composing the builders, denoiser, matcher and phase manager
//!
//! An [`Orchestrator`] handles exactly one case. Every operation runs to
//! completion before the next; an answer or evidence record that has been
//! applied stays applied. Operations that call the backend or the evidence store
//! do so before touching any graph, so a failure leaves the session unchanged.

use crate::{
    CaseGraphs, FormalComplaint, NextAction, PhaseCriteria, PhaseKey, PhaseManager, PhaseTransitionRejected,
    PipelineConfig, PipelineError, SessionMetrics, SessionStatus,
};
use docket_denoiser::{AnswerDiff, ComplaintDenoiser, ConversationTurn, Question};
use docket_domain::traits::{Backend, EvidenceStore};
use docket_domain::{
    DependencyGraph, Entity, EntityType, EvidenceHandle, EvidenceRecord, Phase, Relationship, RelationshipType,
};
use docket_extractor::{
    DependencyGraphBuilder, EvidenceApplication, KnowledgeGraphBuilder, LegalGraphBuilder, ENTITY_ID_ATTRIBUTE,
};
use docket_llm::LlmError;
use docket_matcher::{MatchResults, NeurosymbolicMatcher, ViabilityReport};
use docket_store::StoreError;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Source tag for knowledge-graph entities derived from evidence records
pub const SOURCE_EVIDENCE: &str = "evidence";

/// Result of applying one answer
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// What the answer changed
    pub diff: AnswerDiff,
    /// Phase loss after the answer (noise, evidence gap ratio or matching noise)
    pub noise_level: f64,
    /// Questions for the next turn
    pub questions: Vec<Question>,
    /// Recommended next step
    pub next_action: NextAction,
}

/// Result of applying one evidence record
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceOutcome {
    /// Receipt from the evidence store
    pub handle: EvidenceHandle,
    /// What the record did to the dependency graph
    pub application: EvidenceApplication,
    /// Knowledge-graph entity derived from the record
    pub entity_id: String,
    /// Evidence gap ratio after the record
    pub evidence_gap_ratio: f64,
}

/// Result of an `advance_phase` request
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The session moved on
    Advanced {
        /// Phase left
        from: Phase,
        /// Phase entered
        to: Phase,
        /// First questions of the new phase
        questions: Vec<Question>,
    },
    /// The phase manager refused; nothing changed
    Rejected(PhaseTransitionRejected),
}

/// Drives one case through INTAKE, EVIDENCE and FORMALIZATION
///
/// # Examples
///
/// ```
/// use docket_pipeline::{Orchestrator, PipelineConfig};
///
/// let mut session = Orchestrator::new("case-1", PipelineConfig::default()).unwrap();
/// let questions = session
///     .start("I was fired after I complained to HR about unequal pay.")
///     .unwrap();
/// assert!(!questions.is_empty());
///
/// let outcome = session.submit_answer(&questions[0].id, "Yes, in an email on 2023-03-01.").unwrap();
/// assert!(!outcome.diff.already_answered);
/// ```
pub struct Orchestrator {
    case_id: String,
    config: PipelineConfig,
    manager: PhaseManager,
    denoiser: ComplaintDenoiser,
    matcher: NeurosymbolicMatcher,
    kg_builder: KnowledgeGraphBuilder,
    dg_builder: DependencyGraphBuilder,
    lg_builder: LegalGraphBuilder,
    backend: Option<Box<dyn Backend<Error = LlmError>>>,
    evidence_store: Option<Box<dyn EvidenceStore<Error = StoreError>>>,
    asked: IndexMap<String, Question>,
    pending: IndexMap<String, Question>,
    conversation: Vec<ConversationTurn>,
    evidence: Vec<EvidenceRecord>,
    match_results: Option<MatchResults>,
    metrics: SessionMetrics,
    started: bool,
}

impl Orchestrator {
    /// Create a session, rejecting an invalid configuration
    pub fn new(case_id: impl Into<String>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        let denoiser = ComplaintDenoiser::new(config.denoiser.clone(), config.extractor.clone())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let matcher =
            NeurosymbolicMatcher::new(config.matcher.clone()).map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self {
            case_id: case_id.into(),
            manager: PhaseManager::new(PhaseCriteria::from(&config)),
            denoiser,
            matcher,
            kg_builder: KnowledgeGraphBuilder::new(config.extractor.clone()),
            dg_builder: DependencyGraphBuilder::new(config.extractor.clone()),
            lg_builder: LegalGraphBuilder::new(),
            backend: None,
            evidence_store: None,
            asked: IndexMap::new(),
            pending: IndexMap::new(),
            conversation: Vec::new(),
            evidence: Vec::new(),
            match_results: None,
            metrics: SessionMetrics::new(),
            started: false,
            config,
        })
    }

    /// Use a model backend for narrative extraction
    pub fn with_backend<B>(mut self, backend: B) -> Self
    where
        B: Backend<Error = LlmError> + 'static,
    {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Persist evidence records through a store
    pub fn with_evidence_store<S>(mut self, store: S) -> Self
    where
        S: EvidenceStore<Error = StoreError> + 'static,
    {
        self.evidence_store = Some(Box::new(store));
        self
    }

    /// Case id
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Session configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current phase
    pub fn current_phase(&self) -> Phase {
        self.manager.current_phase()
    }

    /// Phase manager (phase data, iteration history)
    pub fn phase_manager(&self) -> &PhaseManager {
        &self.manager
    }

    /// The live case graphs
    pub fn graphs(&self) -> &CaseGraphs {
        self.manager.graphs()
    }

    /// Owned copy of the case graphs, for persistence while the session continues
    pub fn snapshot(&self) -> CaseGraphs {
        self.manager.graphs().clone()
    }

    /// Questions offered and not yet answered, oldest first
    pub fn pending_questions(&self) -> Vec<&Question> {
        self.pending.values().collect()
    }

    /// Answered questions, in order
    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    /// Evidence records applied to this session
    pub fn evidence(&self) -> &[EvidenceRecord] {
        &self.evidence
    }

    /// Latest matching results (FORMALIZATION only)
    pub fn match_results(&self) -> Option<&MatchResults> {
        self.match_results.as_ref()
    }

    /// Session counters
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Extract graphs from the narrative and return the first questions
    ///
    /// With a backend configured, extraction is model-assisted; a backend
    /// failure is returned and the session stays unstarted.
    pub fn start(&mut self, narrative: &str) -> Result<Vec<Question>, PipelineError> {
        if self.started {
            return Err(PipelineError::AlreadyStarted);
        }

        let kg = match &self.backend {
            Some(backend) => self.kg_builder.build_from_text_with(narrative, backend)?,
            None => self.kg_builder.build_from_text(narrative),
        };
        let dg = self.dg_builder.build_from_knowledge_graph(&kg);
        info!(
            case_id = %self.case_id,
            entities = kg.entity_count(),
            claims = dg.claims().count(),
            "Started session"
        );

        let graphs = self.manager.graphs_mut();
        graphs.knowledge = kg;
        graphs.dependency = dg;
        self.started = true;
        self.denoiser.begin_phase(Phase::Intake);

        self.measure();
        Ok(self.next_questions())
    }

    /// Apply an answer to a previously offered question
    ///
    /// Submitting an answer to an already answered question changes nothing and
    /// returns a diff with `already_answered` set.
    pub fn submit_answer(&mut self, question_id: &str, answer: &str) -> Result<TurnOutcome, PipelineError> {
        self.ensure_started()?;
        let question = self
            .asked
            .get(question_id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownQuestion(question_id.to_string()))?;

        let graphs = self.manager.graphs_mut();
        let diff = self
            .denoiser
            .process_answer(&question, answer, &mut graphs.knowledge, &mut graphs.dependency);

        if diff.already_answered {
            self.metrics.record_duplicate();
            return Ok(TurnOutcome {
                diff,
                noise_level: self.phase_loss(),
                questions: self.pending.values().cloned().collect(),
                next_action: self.manager.get_next_action(),
            });
        }

        self.pending.shift_remove(question_id);
        self.conversation.push(ConversationTurn::new(&question.text, answer));
        self.metrics
            .record_answer(self.current_phase(), diff.requirements_satisfied.len());

        if self.current_phase() == Phase::Intake {
            let graphs = self.manager.graphs_mut();
            self.dg_builder
                .sync_with_knowledge_graph(&mut graphs.dependency, &graphs.knowledge);
        }

        let noise_level = self.measure();
        let questions = self.next_questions();
        Ok(TurnOutcome {
            diff,
            noise_level,
            questions,
            next_action: self.manager.get_next_action(),
        })
    }

    /// Store an evidence record and apply it to the graphs
    ///
    /// Available from EVIDENCE on. The record is stored first; a store failure
    /// leaves the graphs untouched.
    pub fn add_evidence(&mut self, record: EvidenceRecord) -> Result<EvidenceOutcome, PipelineError> {
        self.ensure_started()?;
        let phase = self.current_phase();
        if phase < Phase::Evidence {
            return Err(PipelineError::WrongPhase {
                operation: "add_evidence".to_string(),
                expected: Phase::Evidence,
                actual: phase,
            });
        }

        let handle = match self.evidence_store.as_mut() {
            Some(store) => store.store_evidence(&record)?,
            None => EvidenceHandle {
                evidence_id: record.id.clone(),
                case_id: record.case_id.clone(),
            },
        };

        let graphs = self.manager.graphs_mut();
        let application = self
            .dg_builder
            .add_evidence_to_graph(&mut graphs.dependency, &record, &record.claim_id);

        let claim_entity = application
            .claim_id
            .as_deref()
            .and_then(|id| graphs.dependency.get_node(id))
            .and_then(|node| node.attributes.get(ENTITY_ID_ATTRIBUTE))
            .and_then(|value| value.as_text())
            .map(str::to_string);

        let entity_id = graphs.knowledge.add_entity(
            Entity::new(EntityType::Evidence, &record.description)
                .with_confidence(record.confidence)
                .with_source(SOURCE_EVIDENCE)
                .with_attribute("evidence_id", record.id.as_str())
                .with_attribute("evidence_type", record.evidence_type.as_str()),
        );
        if let Some(claim_entity) = claim_entity.filter(|id| graphs.knowledge.get_entity(id).is_some()) {
            graphs.knowledge.add_relationship(
                Relationship::new(&entity_id, &claim_entity, RelationshipType::Supports)
                    .with_confidence(record.confidence),
            );
        }

        info!(
            evidence_id = %record.id,
            claim = %record.claim_id,
            satisfied = application.satisfied.len(),
            "Applied evidence"
        );
        self.metrics.record_evidence(application.satisfied.len());
        self.evidence.push(record);
        self.manager
            .update_phase_data(phase, PhaseKey::EvidenceCount, self.evidence.len() as f64);
        self.measure();

        Ok(EvidenceOutcome {
            handle,
            application,
            entity_id,
            evidence_gap_ratio: evidence_gap_ratio(&self.manager.graphs().dependency),
        })
    }

    /// Ask the phase manager to move to the next phase
    ///
    /// A refusal is returned as [`AdvanceOutcome::Rejected`] and changes
    /// nothing. Entering FORMALIZATION builds the legal graph for the case's
    /// claim types and runs the first matching pass.
    pub fn advance_phase(&mut self) -> Result<AdvanceOutcome, PipelineError> {
        self.ensure_started()?;
        let from = self.current_phase();
        let target = from.next().unwrap_or(from);

        let to = match self.manager.advance_to_phase(target) {
            Ok(to) => to,
            Err(refusal) => {
                self.metrics.record_rejection();
                return Ok(AdvanceOutcome::Rejected(refusal));
            }
        };
        self.metrics.record_transition();

        let summary = self.summary();
        self.manager.update_phase_data(from, PhaseKey::Summary, summary);

        self.denoiser.begin_phase(to);
        self.pending.clear();

        if to == Phase::Formalization {
            let claim_types: Vec<String> = self
                .manager
                .graphs()
                .dependency
                .claims()
                .filter_map(|c| c.claim_type.clone())
                .collect();
            let legal = self
                .lg_builder
                .build_for_claim_types(&claim_types, &self.config.jurisdiction);
            info!(
                elements = legal.element_count(),
                relations = legal.relation_count(),
                jurisdiction = %self.config.jurisdiction,
                "Built legal graph"
            );
            self.manager.graphs_mut().legal = legal;
        }

        self.measure();
        let questions = self.next_questions();
        Ok(AdvanceOutcome::Advanced { from, to, questions })
    }

    /// Draft the complaint from the current graphs
    ///
    /// Only available in FORMALIZATION. The rendered text is kept in the
    /// phase's data.
    pub fn generate_formal_complaint(&mut self) -> Result<FormalComplaint, PipelineError> {
        self.ensure_started()?;
        let phase = self.current_phase();
        if phase != Phase::Formalization {
            return Err(PipelineError::WrongPhase {
                operation: "generate_formal_complaint".to_string(),
                expected: Phase::Formalization,
                actual: phase,
            });
        }
        if !self.manager.is_phase_complete(phase) {
            warn!(case_id = %self.case_id, "Drafting complaint before FORMALIZATION is complete");
        }

        let evidence = match &self.evidence_store {
            Some(store) => store.list_evidence(&self.case_id)?,
            None => self.evidence.clone(),
        };
        let graphs = self.manager.graphs();
        let results = self
            .matcher
            .match_claims_to_law(&graphs.knowledge, &graphs.dependency, &graphs.legal);
        let viability = self.matcher.assess_claim_viability(&results);
        let complaint = FormalComplaint::build(
            &self.case_id,
            &self.config.jurisdiction,
            graphs,
            &results,
            &viability,
            &evidence,
        );

        info!(
            counts = complaint.counts.len(),
            viable = viability.viable_count,
            exhibits = complaint.exhibits.len(),
            "Generated formal complaint"
        );
        self.manager
            .update_phase_data(phase, PhaseKey::FormalComplaint, complaint.render());
        self.manager
            .update_phase_data(phase, PhaseKey::ViableClaims, viability.viable_count as f64);
        self.match_results = Some(results);
        Ok(complaint)
    }

    /// Viability of each claim against the legal graph (FORMALIZATION only)
    pub fn assess_viability(&self) -> Option<ViabilityReport> {
        self.match_results
            .as_ref()
            .map(|results| self.matcher.assess_claim_viability(results))
    }

    /// Readable narrative of what the session knows so far
    pub fn summary(&self) -> String {
        self.denoiser.synthesize_complaint_summary(
            &self.manager.graphs().knowledge,
            &self.conversation,
            &self.evidence,
        )
    }

    /// Point-in-time status
    pub fn status(&self) -> SessionStatus {
        let phase = self.current_phase();
        let noise_level = if self.started {
            Some(self.phase_loss())
        } else {
            None
        };
        let dependency = &self.manager.graphs().dependency;
        SessionStatus {
            case_id: self.case_id.clone(),
            started: self.started,
            phase,
            iteration_count: self.manager.iteration_count(),
            noise_level,
            phase_complete: self.manager.is_phase_complete(phase),
            converged: self.manager.has_converged(),
            stagnating: self.denoiser.is_stagnating(),
            readiness: dependency.get_claim_readiness().overall_readiness,
            claims: dependency.claims().count(),
            pending_questions: self.pending.len(),
            evidence_count: self.evidence.len(),
            next_action: self.manager.get_next_action(),
        }
    }

    fn ensure_started(&self) -> Result<(), PipelineError> {
        if self.started {
            Ok(())
        } else {
            Err(PipelineError::NotStarted)
        }
    }

    /// Loss the current phase is driving down
    fn phase_loss(&self) -> f64 {
        let graphs = self.manager.graphs();
        match self.current_phase() {
            Phase::Intake => self
                .denoiser
                .calculate_noise_level(&graphs.knowledge, &graphs.dependency),
            Phase::Evidence => evidence_gap_ratio(&graphs.dependency),
            Phase::Formalization => self
                .match_results
                .as_ref()
                .map(MatchResults::matching_noise)
                .unwrap_or(1.0),
        }
    }

    /// Measure the current phase, record an iteration and update phase data
    fn measure(&mut self) -> f64 {
        let phase = self.current_phase();
        if phase == Phase::Formalization {
            let graphs = self.manager.graphs();
            self.match_results = Some(self.matcher.match_claims_to_law(
                &graphs.knowledge,
                &graphs.dependency,
                &graphs.legal,
            ));
        }

        let graphs = self.manager.graphs();
        let noise = self
            .denoiser
            .calculate_noise_level(&graphs.knowledge, &graphs.dependency);
        let gap_ratio = evidence_gap_ratio(&graphs.dependency);
        let summary = graphs.dependency.summary();
        let loss = self.phase_loss();

        let mut metrics = IndexMap::new();
        metrics.insert("noise_level".to_string(), noise);
        metrics.insert("gaps".to_string(), graphs.knowledge.find_gaps().len() as f64);
        metrics.insert(
            "unsatisfied_requirements".to_string(),
            (summary.total_requirements - summary.satisfied_requirements) as f64,
        );
        metrics.insert("readiness".to_string(), summary.overall_readiness);
        metrics.insert("evidence_gap_ratio".to_string(), gap_ratio);

        self.manager.update_phase_data(phase, PhaseKey::NoiseLevel, noise);
        match phase {
            Phase::Intake => {}
            Phase::Evidence => {
                self.manager
                    .update_phase_data(phase, PhaseKey::EvidenceGapRatio, gap_ratio);
            }
            Phase::Formalization => {
                metrics.insert("matching_noise".to_string(), loss);
                self.manager.update_phase_data(phase, PhaseKey::MatchingNoise, loss);
            }
        }

        self.denoiser.record_noise(loss);
        self.manager.record_iteration(loss, metrics);
        debug!(phase = %phase, loss, noise, "Measured phase");
        loss
    }

    /// Per-turn question count, widened while stagnating
    fn questions_per_turn(&self) -> usize {
        if self.denoiser.is_stagnating() {
            (self.config.questions_per_turn + self.config.stagnation_widening).min(self.config.max_questions_per_turn)
        } else {
            self.config.questions_per_turn
        }
    }

    fn next_questions(&mut self) -> Vec<Question> {
        let phase = self.current_phase();
        let max = self.questions_per_turn();
        let graphs = self.manager.graphs();
        let questions = match phase {
            Phase::Intake => self
                .denoiser
                .generate_questions(&graphs.knowledge, &graphs.dependency, max),
            Phase::Evidence => self
                .denoiser
                .generate_evidence_questions(&graphs.knowledge, &graphs.dependency, max),
            Phase::Formalization => match &self.match_results {
                Some(results) => self.denoiser.generate_legal_matching_questions(results, max),
                None => Vec::new(),
            },
        };

        for question in &questions {
            self.asked.insert(question.id.clone(), question.clone());
            self.pending.insert(question.id.clone(), question.clone());
        }
        self.metrics.record_questions(phase, questions.len());

        match phase {
            Phase::Intake => {
                self.manager
                    .update_phase_data(phase, PhaseKey::Exhausted, self.denoiser.is_exhausted());
            }
            Phase::Evidence => {}
            Phase::Formalization => {
                let outstanding = if self.denoiser.is_exhausted() {
                    0
                } else {
                    self.pending.len()
                };
                self.manager
                    .update_phase_data(phase, PhaseKey::OutstandingLegalQuestions, outstanding as f64);
            }
        }
        debug!(phase = %phase, offered = questions.len(), pending = self.pending.len(), "Offered questions");
        questions
    }
}

/// Share of requirement nodes without any evidence attached
///
/// A graph with no requirement nodes has nothing evidenced and reports 1.0.
pub fn evidence_gap_ratio(dg: &DependencyGraph) -> f64 {
    let (total, missing) = dg.requirements().fold((0usize, 0usize), |(total, missing), node| {
        (total + 1, missing + usize::from(node.evidence_ids.is_empty()))
    });
    if total == 0 {
        1.0
    } else {
        missing as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::DependencyNode;

    const NARRATIVE: &str = "Employee fired after complaining about unequal pay";

    fn session() -> Orchestrator {
        Orchestrator::new("case-1", PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_evidence_gap_ratio() {
        let mut dg = DependencyGraph::new();
        assert_eq!(evidence_gap_ratio(&dg), 1.0);

        let claim = dg.add_node(DependencyNode::claim("Claim", "retaliation"));
        let a = dg.add_requirement(&claim, DependencyNode::requirement("A", "a"), true);
        dg.add_requirement(&claim, DependencyNode::requirement("B", "b"), true);
        assert_eq!(evidence_gap_ratio(&dg), 1.0);

        dg.attach_evidence(&a, "ev-1");
        assert_eq!(evidence_gap_ratio(&dg), 0.5);
    }

    #[test]
    fn test_operations_require_start() {
        let mut session = session();
        assert!(matches!(session.submit_answer("q:x", "yes"), Err(PipelineError::NotStarted)));
        assert!(matches!(session.advance_phase(), Err(PipelineError::NotStarted)));
        assert!(!session.status().started);
    }

    #[test]
    fn test_start_twice() {
        let mut session = session();
        session.start(NARRATIVE).unwrap();
        assert!(matches!(session.start(NARRATIVE), Err(PipelineError::AlreadyStarted)));
    }

    #[test]
    fn test_unknown_question() {
        let mut session = session();
        session.start(NARRATIVE).unwrap();
        let err = session.submit_answer("q:nope", "yes").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownQuestion(id) if id == "q:nope"));
    }

    #[test]
    fn test_evidence_not_accepted_during_intake() {
        let mut session = session();
        session.start(NARRATIVE).unwrap();
        let record = EvidenceRecord::new("case-1", "retaliation", "Email to HR");
        let err = session.add_evidence(record).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::WrongPhase {
                expected: Phase::Evidence,
                actual: Phase::Intake,
                ..
            }
        ));
        assert!(session.evidence().is_empty());
    }

    #[test]
    fn test_start_records_first_iteration() {
        let mut session = session();
        let questions = session.start(NARRATIVE).unwrap();
        assert!(questions.len() <= session.config().questions_per_turn);
        assert_eq!(session.phase_manager().iteration_count(), 1);
        assert_eq!(session.pending_questions().len(), questions.len());
        assert!(session
            .phase_manager()
            .get_phase_data(Phase::Intake, &PhaseKey::NoiseLevel)
            .is_some());
    }
}
