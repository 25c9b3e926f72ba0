//! The convergence engine
//!
//! Each turn the denoiser scores how much is still unknown about the case (the
//! noise level), offers the most valuable open questions, and folds answers back
//! into the graphs. A question is keyed by what it targets; once answered it is
//! closed for good, which makes re-submitting an answer a no-op.

use crate::question::{AnswerDiff, ConversationTurn, Question, QuestionTarget};
use crate::{DenoiserConfig, DenoiserError};
use docket_domain::{
    AttributeValue, DependencyGraph, Entity, EntityType, EvidenceRecord, GapKind, KnowledgeGraph, Phase,
    Relationship, RelationshipType,
};
use docket_extractor::catalog::display_name;
use docket_extractor::heuristics::{extract_dates, is_substantive};
use docket_extractor::{ExtractorConfig, KnowledgeGraphBuilder, ENTITY_ID_ATTRIBUTE, REQUIREMENT_KEY_ATTRIBUTE, SOURCE_ANSWER};
use docket_matcher::MatchResults;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

const FACT_NAME_CHARS: usize = 80;

/// Question-driven refinement of the knowledge and dependency graphs
#[derive(Debug)]
pub struct ComplaintDenoiser {
    config: DenoiserConfig,
    extractor: KnowledgeGraphBuilder,
    rng: StdRng,
    phase: Phase,
    momentum: HashMap<String, f64>,
    issued: HashSet<String>,
    answered: HashMap<String, AnswerDiff>,
    noise_history: Vec<f64>,
    open_candidates: Option<usize>,
}

impl ComplaintDenoiser {
    /// Create a denoiser, rejecting an invalid configuration
    pub fn new(config: DenoiserConfig, extractor: ExtractorConfig) -> Result<Self, DenoiserError> {
        config.validate().map_err(DenoiserError::Config)?;
        extractor.validate().map_err(DenoiserError::Config)?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.exploration.seed),
            config,
            extractor: KnowledgeGraphBuilder::new(extractor),
            phase: Phase::Intake,
            momentum: HashMap::new(),
            issued: HashSet::new(),
            answered: HashMap::new(),
            noise_history: Vec::new(),
            open_candidates: None,
        })
    }

    /// Denoiser configuration
    pub fn config(&self) -> &DenoiserConfig {
        &self.config
    }

    /// Phase questions are currently generated for
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Noise levels recorded in the current phase, oldest first
    pub fn noise_history(&self) -> &[f64] {
        &self.noise_history
    }

    /// Whether a question has been answered
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered.contains_key(question_id)
    }

    /// Number of answered questions across all phases
    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// Start generating questions for a new phase
    ///
    /// Resets the per-phase budget, momentum and noise history. Answered
    /// questions stay closed.
    pub fn begin_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.momentum.clear();
        self.issued.clear();
        self.noise_history.clear();
        self.open_candidates = None;
        debug!(phase = %phase, "Denoiser entered phase");
    }

    /// Weighted noise in `[0, 1]`
    ///
    /// - gap component: `min(1, gaps / (3 * claims))`, or 1.0 with no claims
    /// - requirement component: unsatisfied / total requirement nodes (0.0 with none)
    /// - uncertainty component: mean `1 - confidence` over entities and relationships
    pub fn calculate_noise_level(&self, kg: &KnowledgeGraph, dg: &DependencyGraph) -> f64 {
        let claims = kg.get_entities_by_type(EntityType::Claim).len();
        let gaps = kg.find_gaps().len();
        let gap_component = if claims == 0 {
            1.0
        } else {
            (gaps as f64 / (3 * claims) as f64).min(1.0)
        };

        let total = dg.requirements().count();
        let requirement_component = if total == 0 {
            0.0
        } else {
            dg.find_unsatisfied_requirements().len() as f64 / total as f64
        };

        let uncertainty_component = kg.mean_uncertainty();

        let c = &self.config;
        let weight_sum = c.gap_weight + c.requirement_weight + c.uncertainty_weight;
        let noise = (c.gap_weight * gap_component
            + c.requirement_weight * requirement_component
            + c.uncertainty_weight * uncertainty_component)
            / weight_sum;
        noise.clamp(0.0, 1.0)
    }

    /// Up to `max` intake questions over open gaps and unsatisfied requirements
    pub fn generate_questions(&mut self, kg: &KnowledgeGraph, dg: &DependencyGraph, max: usize) -> Vec<Question> {
        let mut candidates = self.gap_questions(kg, false);
        for node in dg.find_unsatisfied_requirements() {
            let Some(claim) = dg.claim_for_requirement(&node.id) else {
                continue;
            };
            let key = node.requirement_key.clone().unwrap_or_default();
            candidates.push(Question::new(
                format!(
                    "Regarding your {} claim, what happened that shows {}? ({})",
                    claim.name,
                    node.name.to_lowercase(),
                    node.description
                ),
                QuestionTarget::Requirement {
                    requirement_id: node.id.clone(),
                    claim_id: claim.id.clone(),
                    requirement_key: key,
                },
                0.8 * (1.0 - 0.5 * node.confidence),
                self.phase,
            ));
        }
        self.select(candidates, max)
    }

    /// Up to `max` questions asking for evidence behind unsupported claims and
    /// unsatisfied requirements
    pub fn generate_evidence_questions(
        &mut self,
        kg: &KnowledgeGraph,
        dg: &DependencyGraph,
        max: usize,
    ) -> Vec<Question> {
        let mut candidates = self.gap_questions(kg, true);
        for node in dg.find_unsatisfied_requirements() {
            let Some(claim) = dg.claim_for_requirement(&node.id) else {
                continue;
            };
            candidates.push(Question::new(
                format!(
                    "Do you have documents, messages or witnesses showing {} for your {} claim?",
                    node.name.to_lowercase(),
                    claim.name
                ),
                QuestionTarget::Evidence {
                    requirement_id: node.id.clone(),
                    claim_id: claim.id.clone(),
                    requirement_key: node.requirement_key.clone().unwrap_or_default(),
                },
                0.9 * (1.0 - 0.5 * node.confidence),
                self.phase,
            ));
        }
        self.select(candidates, max)
    }

    /// Up to `max` questions about legal requirements no claim element establishes
    pub fn generate_legal_matching_questions(&mut self, results: &MatchResults, max: usize) -> Vec<Question> {
        let candidates = results
            .unmatched_requirements
            .iter()
            .map(|u| {
                Question::new(
                    format!(
                        "To plead {}, the complaint must establish {}: {}. What facts establish it?",
                        display_name(&u.claim_type),
                        u.name.to_lowercase(),
                        u.description
                    ),
                    QuestionTarget::LegalRequirement {
                        requirement_id: u.requirement_id.clone(),
                        claim_id: u.claim_id.clone(),
                        requirement_key: u.requirement_key.clone(),
                    },
                    0.9,
                    self.phase,
                )
            })
            .collect();
        self.select(candidates, max)
    }

    /// Apply an answer to the graphs
    ///
    /// Answering a question twice is a no-op that returns a diff with
    /// `already_answered` set. A non-substantive answer ("I don't know") closes
    /// the question without changing anything. A target that no longer exists
    /// is a local no-op.
    pub fn process_answer(
        &mut self,
        question: &Question,
        answer: &str,
        kg: &mut KnowledgeGraph,
        dg: &mut DependencyGraph,
    ) -> AnswerDiff {
        if self.answered.contains_key(&question.id) {
            debug!(question_id = %question.id, "Question already answered");
            let mut diff = AnswerDiff::new(&question.id);
            diff.already_answered = true;
            return diff;
        }

        let mut diff = AnswerDiff::new(&question.id);
        if is_substantive(answer) {
            let answer = answer.trim();
            match &question.target {
                QuestionTarget::Gap { entity_id, kind, .. } => self.apply_gap_answer(entity_id, kind, answer, kg, &mut diff),
                QuestionTarget::Requirement {
                    requirement_id,
                    claim_id,
                    requirement_key,
                } => self.apply_requirement_answer(
                    Some(requirement_id),
                    claim_id,
                    requirement_key,
                    EntityType::Fact,
                    answer,
                    kg,
                    dg,
                    &mut diff,
                ),
                QuestionTarget::Evidence {
                    requirement_id,
                    claim_id,
                    requirement_key,
                } => self.apply_requirement_answer(
                    Some(requirement_id),
                    claim_id,
                    requirement_key,
                    EntityType::Evidence,
                    answer,
                    kg,
                    dg,
                    &mut diff,
                ),
                QuestionTarget::LegalRequirement {
                    claim_id,
                    requirement_key,
                    ..
                } => self.apply_requirement_answer(
                    None,
                    claim_id,
                    requirement_key,
                    EntityType::Fact,
                    answer,
                    kg,
                    dg,
                    &mut diff,
                ),
            }
            self.merge_mentions(answer, kg, &mut diff);
        } else {
            debug!(question_id = %question.id, "Non-substantive answer closes question");
        }

        info!(
            question_id = %question.id,
            entities = diff.entities_added.len(),
            attributes = diff.attributes_set.len(),
            satisfied = diff.requirements_satisfied.len(),
            "Processed answer"
        );
        self.momentum.remove(&question.id);
        self.answered.insert(question.id.clone(), diff.clone());
        diff
    }

    /// Append a noise measurement to the current phase's history
    pub fn record_noise(&mut self, noise: f64) {
        self.noise_history.push(noise);
    }

    /// Whether the last `stagnation_window` iterations reduced noise by less than
    /// `stagnation_epsilon`
    pub fn is_stagnating(&self) -> bool {
        let window = self.config.stagnation_window;
        let n = self.noise_history.len();
        if n <= window {
            return false;
        }
        let reduction = self.noise_history[n - 1 - window] - self.noise_history[n - 1];
        reduction < self.config.stagnation_epsilon
    }

    /// Whether there is nothing left to ask in this phase
    ///
    /// True once a generation pass found no open candidates, or once the phase's
    /// question budget is spent and every issued question has been answered.
    pub fn is_exhausted(&self) -> bool {
        if self.open_candidates == Some(0) {
            return true;
        }
        self.issued.len() >= self.config.max_questions_per_phase
            && self.issued.iter().all(|id| self.answered.contains_key(id))
    }

    /// Readable narrative of what is known
    pub fn synthesize_complaint_summary(
        &self,
        kg: &KnowledgeGraph,
        conversation: &[ConversationTurn],
        evidence: &[EvidenceRecord],
    ) -> String {
        let mut out = String::new();
        let claims = kg.get_entities_by_type(EntityType::Claim);

        if claims.is_empty() {
            out.push_str("No claims have been identified yet.\n");
        } else {
            out.push_str("Claims:\n");
            for claim in &claims {
                let description = claim.text_attribute("description").unwrap_or("no description yet");
                match claim.text_attribute("date") {
                    Some(date) => out.push_str(&format!("- {} ({}): {}\n", claim.name, date, description)),
                    None => out.push_str(&format!("- {}: {}\n", claim.name, description)),
                }
            }
        }

        let parties: Vec<&str> = kg
            .entities()
            .filter(|e| matches!(e.entity_type, EntityType::Person | EntityType::Organization))
            .map(|e| e.name.as_str())
            .collect();
        if !parties.is_empty() {
            out.push_str(&format!("Parties: {}\n", parties.join(", ")));
        }

        let dates: Vec<&str> = kg
            .get_entities_by_type(EntityType::Date)
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        if !dates.is_empty() {
            out.push_str(&format!("Key dates: {}\n", dates.join(", ")));
        }

        let amounts: Vec<&str> = kg
            .get_entities_by_type(EntityType::Amount)
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        if !amounts.is_empty() {
            out.push_str(&format!("Amounts at issue: {}\n", amounts.join(", ")));
        }

        let facts = kg.get_entities_by_type(EntityType::Fact);
        if !facts.is_empty() {
            out.push_str("Facts:\n");
            for fact in facts {
                let text = fact.text_attribute("text").unwrap_or(&fact.name);
                out.push_str(&format!("- {}\n", text));
            }
        }

        if !evidence.is_empty() {
            out.push_str("Evidence:\n");
            for record in evidence {
                out.push_str(&format!("- [{}] {}\n", record.evidence_type, record.description));
            }
        }

        if !conversation.is_empty() {
            out.push_str(&format!("Based on {} answered question(s).\n", conversation.len()));
        }
        out
    }

    // ------------------------------------------------------------------
    // Candidate generation and selection
    // ------------------------------------------------------------------

    fn gap_questions(&self, kg: &KnowledgeGraph, evidence: bool) -> Vec<Question> {
        kg.find_gaps()
            .into_iter()
            .filter(|gap| !evidence || gap.kind == GapKind::MissingSupport)
            .map(|gap| {
                let entity = kg.get_entity(&gap.entity_id);
                let name = entity.map(|e| e.name.as_str()).unwrap_or(gap.entity_id.as_str());
                let (text, base) = match &gap.kind {
                    GapKind::MissingSupport if evidence => (
                        format!("What evidence do you have for your {} claim (documents, emails, witnesses)?", name),
                        1.0,
                    ),
                    GapKind::MissingSupport => (
                        format!("What facts support your {} claim? Describe what happened and who was involved.", name),
                        1.0,
                    ),
                    GapKind::MissingAttribute(attr) if attr == "description" => {
                        (format!("Can you describe your {} claim in more detail?", name), 0.7)
                    }
                    GapKind::MissingAttribute(attr) if attr == "date" => {
                        (format!("When did the events behind your {} claim happen?", name), 0.6)
                    }
                    GapKind::MissingAttribute(attr) => (format!("What is the {} for {}?", attr, name), 0.5),
                    GapKind::DanglingReference { .. } => (
                        format!("Your account mentions something we could not identify ({}). Who or what is it?", name),
                        0.3,
                    ),
                };
                let confidence = entity.map(|e| e.confidence).unwrap_or(0.0);
                Question::new(
                    text,
                    QuestionTarget::Gap {
                        gap_id: gap.id,
                        entity_id: gap.entity_id,
                        kind: gap.kind,
                    },
                    base * (1.0 - 0.5 * confidence),
                    self.phase,
                )
            })
            .collect()
    }

    fn select(&mut self, candidates: Vec<Question>, max: usize) -> Vec<Question> {
        let mut open: Vec<Question> = candidates
            .into_iter()
            .filter(|q| !self.answered.contains_key(&q.id))
            .collect();
        self.open_candidates = Some(open.len());

        let beta = self.config.exploration.momentum_beta;
        for question in &mut open {
            let smoothed = match self.momentum.get(&question.id) {
                Some(previous) => beta * previous + (1.0 - beta) * question.priority,
                None => question.priority,
            };
            self.momentum.insert(question.id.clone(), smoothed);
            question.priority = smoothed;
        }

        // Budget is spent in priority order
        open.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal));

        let mut remaining_budget = self.config.max_questions_per_phase.saturating_sub(self.issued.len());
        open.retain(|q| {
            if self.issued.contains(&q.id) {
                true
            } else if remaining_budget > 0 {
                remaining_budget -= 1;
                true
            } else {
                false
            }
        });

        let epsilon = self.config.exploration.epsilon;
        let mut selected = Vec::with_capacity(max.min(open.len()));
        while selected.len() < max && !open.is_empty() {
            let index = if open.len() > 1 && self.rng.gen::<f64>() < epsilon {
                self.rng.gen_range(0..open.len())
            } else {
                0
            };
            selected.push(open.remove(index));
        }

        for question in &selected {
            self.issued.insert(question.id.clone());
        }
        debug!(
            phase = %self.phase,
            candidates = self.open_candidates.unwrap_or(0),
            selected = selected.len(),
            "Selected questions"
        );
        selected
    }

    // ------------------------------------------------------------------
    // Answer application
    // ------------------------------------------------------------------

    fn apply_gap_answer(
        &self,
        entity_id: &str,
        kind: &GapKind,
        answer: &str,
        kg: &mut KnowledgeGraph,
        diff: &mut AnswerDiff,
    ) {
        match kind {
            GapKind::MissingAttribute(attr) => {
                let value = if attr == "date" {
                    extract_dates(answer).into_iter().next().unwrap_or_else(|| answer.to_string())
                } else {
                    answer.to_string()
                };
                if kg.set_entity_attribute(entity_id, attr, AttributeValue::Text(value)).is_some() {
                    diff.attributes_set.push((entity_id.to_string(), attr.clone()));
                } else {
                    warn!(entity_id, "Gap entity no longer exists");
                }
            }
            GapKind::MissingSupport => {
                if kg.get_entity(entity_id).is_some() {
                    self.add_supporting(kg, entity_id, EntityType::Fact, answer, None, diff);
                } else {
                    warn!(entity_id, "Gap entity no longer exists");
                }
            }
            GapKind::DanglingReference { .. } => {
                if kg.get_entity(entity_id).is_none() {
                    let entity = Entity::new(EntityType::Other, short_name(answer))
                        .with_id(entity_id)
                        .with_source(SOURCE_ANSWER)
                        .with_confidence(self.extractor.config().answer_confidence)
                        .with_attribute("text", answer);
                    diff.entities_added.push(kg.add_entity(entity));
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_requirement_answer(
        &self,
        requirement_id: Option<&String>,
        claim_id: &str,
        requirement_key: &str,
        support_type: EntityType,
        answer: &str,
        kg: &mut KnowledgeGraph,
        dg: &mut DependencyGraph,
        diff: &mut AnswerDiff,
    ) {
        let node_id = match requirement_id {
            Some(id) => Some(id.clone()),
            None => dg
                .requirements_for_claim(claim_id)
                .into_iter()
                .find(|n| n.requirement_key.as_deref() == Some(requirement_key))
                .map(|n| n.id.clone()),
        };

        let entity_id = dg
            .get_node(claim_id)
            .and_then(|c| c.attributes.get(ENTITY_ID_ATTRIBUTE))
            .and_then(|v| v.as_text())
            .map(str::to_string);
        let support_id = match entity_id {
            Some(entity_id) if kg.get_entity(&entity_id).is_some() => Some(self.add_supporting(
                kg,
                &entity_id,
                support_type,
                answer,
                Some(requirement_key),
                diff,
            )),
            _ => {
                debug!(claim_id, "Claim has no knowledge-graph entity to support");
                None
            }
        };

        let Some(node_id) = node_id else {
            warn!(claim_id, requirement_key, "Requirement no longer exists");
            return;
        };
        if support_type == EntityType::Evidence {
            let reference = support_id.unwrap_or_else(|| diff.question_id.clone());
            dg.attach_evidence(&node_id, &reference);
        }
        if dg.satisfy_requirement(&node_id, self.extractor.config().answer_confidence) {
            diff.requirements_satisfied.push(node_id);
        }
    }

    fn add_supporting(
        &self,
        kg: &mut KnowledgeGraph,
        claim_entity_id: &str,
        entity_type: EntityType,
        answer: &str,
        requirement_key: Option<&str>,
        diff: &mut AnswerDiff,
    ) -> String {
        let confidence = self.extractor.config().answer_confidence;
        let mut entity = Entity::new(entity_type, short_name(answer))
            .with_source(SOURCE_ANSWER)
            .with_confidence(confidence)
            .with_attribute("text", answer);
        if let Some(key) = requirement_key.filter(|k| !k.is_empty()) {
            entity = entity.with_attribute(REQUIREMENT_KEY_ATTRIBUTE, key);
        }
        let support_id = kg.add_entity(entity);
        let rel_id = kg.add_relationship(
            Relationship::new(&support_id, claim_entity_id, RelationshipType::Supports).with_confidence(confidence),
        );
        diff.entities_added.push(support_id.clone());
        diff.relationships_added.push(rel_id);
        support_id
    }

    fn merge_mentions(&self, answer: &str, kg: &mut KnowledgeGraph, diff: &mut AnswerDiff) {
        let mentioned = self.extractor.extract_from_answer(answer);
        for entity in mentioned.entities() {
            let wanted = matches!(
                entity.entity_type,
                EntityType::Person | EntityType::Organization | EntityType::Date | EntityType::Amount
            );
            if wanted && kg.find_by_name(entity.entity_type, &entity.name).is_none() {
                diff.entities_added.push(kg.add_entity(entity.clone()));
            }
        }
    }
}

impl Default for ComplaintDenoiser {
    fn default() -> Self {
        let config = DenoiserConfig::default();
        Self {
            rng: StdRng::seed_from_u64(config.exploration.seed),
            config,
            extractor: KnowledgeGraphBuilder::default(),
            phase: Phase::Intake,
            momentum: HashMap::new(),
            issued: HashSet::new(),
            answered: HashMap::new(),
            noise_history: Vec::new(),
            open_candidates: None,
        }
    }
}

fn short_name(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(FACT_NAME_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}
