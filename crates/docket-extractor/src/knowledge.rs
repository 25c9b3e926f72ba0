//! Knowledge graph builder

use crate::catalog;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::heuristics::{self, ClaimMatch};
use crate::parser::{parse_llm_response, ParsedExtraction};
use crate::prompt::PromptBuilder;
use docket_domain::traits::Backend;
use docket_domain::{AttributeValue, Entity, EntityType, KnowledgeGraph, Relationship, RelationshipType};
use docket_llm::LlmError;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Provenance tag for entities derived from the opening narrative
pub const SOURCE_NARRATIVE: &str = "narrative";

/// Provenance tag for entities derived from answers
pub const SOURCE_ANSWER: &str = "answer";

/// Builds knowledge graphs from free text
///
/// Extraction never fails on the text itself: empty, malformed or hostile input
/// yields a valid, possibly empty graph. The only error surfaced is a failed
/// backend call in [`KnowledgeGraphBuilder::build_from_text_with`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraphBuilder {
    config: ExtractorConfig,
}

impl KnowledgeGraphBuilder {
    /// Create a builder
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Builder configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Keyword pass over a narrative, entities tagged `source = "narrative"`
    pub fn build_from_text(&self, text: &str) -> KnowledgeGraph {
        let kg = self.extract(text, SOURCE_NARRATIVE, self.config.heuristic_confidence);
        info!(
            entities = kg.entity_count(),
            relationships = kg.relationship_count(),
            "Built knowledge graph from narrative"
        );
        kg
    }

    /// Model-assisted pass over a narrative, merged onto the keyword pass
    ///
    /// Unusable model output (bad JSON, no entities) falls back to the keyword
    /// graph alone. A backend failure is returned as [`ExtractorError::Backend`]
    /// and nothing is built.
    pub fn build_from_text_with<B>(&self, text: &str, backend: &B) -> Result<KnowledgeGraph, ExtractorError>
    where
        B: Backend<Error = LlmError> + ?Sized,
    {
        let mut kg = self.extract(text, SOURCE_NARRATIVE, self.config.heuristic_confidence);
        if !self.config.llm_extraction || text.trim().is_empty() {
            return Ok(kg);
        }

        let prompt = PromptBuilder::new(self.truncate(text)).build();
        debug!(prompt_len = prompt.len(), "Requesting model extraction");
        let response = backend.invoke(&prompt)?;

        match parse_llm_response(&response) {
            Ok(parsed) if !parsed.is_empty() => {
                let model_graph = self.graph_from_candidates(parsed, SOURCE_NARRATIVE);
                let added = kg.merge(model_graph);
                info!(added, total = kg.entity_count(), "Merged model extraction into knowledge graph");
            }
            Ok(_) => warn!("Model returned no entities; using keyword extraction only"),
            Err(e) => warn!("Unusable model output ({}); using keyword extraction only", e),
        }
        Ok(kg)
    }

    /// Keyword pass over an answer, entities tagged `source = "answer"`
    pub fn extract_from_answer(&self, answer: &str) -> KnowledgeGraph {
        self.extract(answer, SOURCE_ANSWER, self.config.answer_confidence)
    }

    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.config.max_text_length) {
            Some((idx, _)) => {
                warn!(
                    max = self.config.max_text_length,
                    "Text exceeds maximum length, truncating"
                );
                &text[..idx]
            }
            None => text,
        }
    }

    fn extract(&self, text: &str, source: &str, confidence: f64) -> KnowledgeGraph {
        let text = self.truncate(text);
        let mut kg = KnowledgeGraph::new();
        if text.trim().is_empty() {
            return kg;
        }

        let entity = |entity_type: EntityType, name: &str| {
            Entity::new(entity_type, name)
                .with_source(source)
                .with_confidence(confidence)
        };

        let claims: Vec<(String, ClaimMatch)> = heuristics::detect_claim_types(text)
            .into_iter()
            .map(|m| {
                let sentence_text = m.sentences.join(" ");
                let mut claim = entity(EntityType::Claim, m.info.display_name)
                    .with_attribute("claim_type", m.claim_type())
                    .with_attribute("description", m.description())
                    .with_attribute(
                        "keywords",
                        m.keywords.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                    );
                if let Some(date) = heuristics::extract_dates(&sentence_text).into_iter().next() {
                    claim = claim.with_attribute("date", date);
                }
                (kg.add_entity(claim), m)
            })
            .collect();

        let parties: Vec<(String, bool)> = heuristics::extract_parties(text)
            .into_iter()
            .map(|p| {
                let entity_type = if p.organization {
                    EntityType::Organization
                } else {
                    EntityType::Person
                };
                (kg.add_entity(entity(entity_type, p.name.as_str())), p.organization)
            })
            .collect();

        for (party_id, _) in &parties {
            for (claim_id, _) in &claims {
                kg.add_relationship(
                    Relationship::new(party_id, claim_id, RelationshipType::Involves).with_confidence(confidence),
                );
            }
        }
        if let Some((org_id, _)) = parties.iter().find(|(_, org)| *org) {
            for (person_id, _) in parties.iter().filter(|(_, org)| !*org) {
                kg.add_relationship(
                    Relationship::new(person_id, org_id, RelationshipType::EmployedBy).with_confidence(confidence),
                );
            }
        }

        for date in heuristics::extract_dates(text) {
            let date_id = kg.add_entity(entity(EntityType::Date, date.as_str()));
            for (claim_id, m) in &claims {
                if m.sentences.iter().any(|s| s.contains(&date)) {
                    kg.add_relationship(
                        Relationship::new(claim_id, &date_id, RelationshipType::OccurredOn).with_confidence(confidence),
                    );
                }
            }
        }

        for amount in heuristics::extract_amounts(text) {
            let mut amount_entity = entity(EntityType::Amount, amount.as_str());
            if let Some(value) = heuristics::amount_value(&amount) {
                amount_entity = amount_entity.with_attribute("value", value);
            }
            let amount_id = kg.add_entity(amount_entity);
            for (claim_id, m) in &claims {
                if m.sentences.iter().any(|s| s.contains(&amount)) {
                    kg.add_relationship(
                        Relationship::new(&amount_id, claim_id, RelationshipType::RelatedTo).with_confidence(confidence),
                    );
                }
            }
        }

        debug!(
            claims = claims.len(),
            parties = parties.len(),
            entities = kg.entity_count(),
            "Keyword extraction complete"
        );
        kg
    }

    fn graph_from_candidates(&self, parsed: ParsedExtraction, source: &str) -> KnowledgeGraph {
        let mut kg = KnowledgeGraph::new();
        let mut ids_by_name: HashMap<String, String> = HashMap::new();

        for candidate in parsed.entities.into_iter().take(self.config.max_llm_entities) {
            let mut entity = Entity::new(candidate.entity_type, &candidate.name)
                .with_source(source)
                .with_confidence(candidate.confidence.unwrap_or(self.config.heuristic_confidence));
            entity.attributes = candidate.attributes;

            if entity.entity_type == EntityType::Claim && !entity.has_attribute("claim_type") {
                let claim_type = infer_claim_type(&entity);
                entity
                    .attributes
                    .insert("claim_type".to_string(), AttributeValue::Text(claim_type));
            }

            let key = candidate.name.to_lowercase();
            let id = kg.add_entity(entity);
            ids_by_name.entry(key).or_insert(id);
        }

        for candidate in parsed.relationships {
            let source_id = ids_by_name.get(&candidate.source.to_lowercase());
            let target_id = ids_by_name.get(&candidate.target.to_lowercase());
            match (source_id, target_id) {
                (Some(s), Some(t)) => {
                    let rel = Relationship::new(s, t, candidate.relationship_type)
                        .with_confidence(candidate.confidence.unwrap_or(self.config.heuristic_confidence));
                    kg.add_relationship(rel);
                }
                _ => warn!(
                    "Skipping relationship {} -> {}: unknown entity name",
                    candidate.source, candidate.target
                ),
            }
        }

        kg
    }
}

/// Claim type for a model-proposed claim without one: keyword match on its name
/// and description, else its name in snake case
fn infer_claim_type(entity: &Entity) -> String {
    let text = format!(
        "{} {}",
        entity.name,
        entity.text_attribute("description").unwrap_or_default()
    );
    heuristics::detect_claim_types(&text)
        .first()
        .map(|m| m.claim_type().to_string())
        .unwrap_or_else(|| {
            let snake = entity
                .name
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join("_");
            match catalog::claim_type_info(&snake) {
                Some(info) => info.claim_type.to_string(),
                None if snake.is_empty() => "other".to_string(),
                None => snake,
            }
        })
}
