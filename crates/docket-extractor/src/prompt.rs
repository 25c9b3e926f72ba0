//! Prompt construction for model-assisted extraction

use docket_domain::{EntityType, RelationshipType};

/// Builds the extraction prompt for one piece of text
pub struct PromptBuilder {
    text: String,
    known_entities: Vec<(EntityType, String)>,
    question: Option<String>,
}

impl PromptBuilder {
    /// Create a prompt builder for `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            known_entities: Vec::new(),
            question: None,
        }
    }

    /// Entities already in the graph, listed so the model reuses their names
    pub fn with_known_entities(mut self, entities: Vec<(EntityType, String)>) -> Self {
        self.known_entities = entities;
        self
    }

    /// The question the text answers, when extracting from an answer
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\nAllowed entity types: ");
        prompt.push_str(&join_names(EntityType::ALL.iter().map(|t| t.as_str())));
        prompt.push_str("\nAllowed relationship types: ");
        prompt.push_str(&join_names(RelationshipType::ALL.iter().map(|t| t.as_str())));
        prompt.push_str("\n\n");

        if !self.known_entities.is_empty() {
            prompt.push_str("Entities already known (reuse these names exactly):\n");
            for (entity_type, name) in self.known_entities.iter().take(30) {
                prompt.push_str(&format!("- {} ({})\n", name, entity_type));
            }
            prompt.push('\n');
        }

        if let Some(question) = &self.question {
            prompt.push_str("The text below answers this question:\n");
            prompt.push_str(question);
            prompt.push_str("\n\n");
        }

        prompt.push_str("Text to analyze:\n---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are helping prepare an employment complaint. Extract the people, organizations, dates, amounts, legal claims and supporting facts from the text.

Rules:
- A "claim" entity names a legal theory (e.g. discrimination, retaliation) and carries a "claim_type" attribute
- Give each claim a "description" attribute and a "date" attribute when the text states one
- A "fact" entity is a concrete event; link it to the claim it supports with a "supports" relationship
- Use lower confidence for hedged statements ("I think", "maybe")
- Do not invent facts that are not in the text"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{
  "entities": [
    {"name": "...", "type": "claim", "confidence": 0.0-1.0, "attributes": {"claim_type": "...", "description": "..."}}
  ],
  "relationships": [
    {"source": "entity name", "target": "entity name", "type": "supports", "confidence": 0.0-1.0}
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text() {
        let prompt = PromptBuilder::new("I was fired on May 2, 2023").build();
        assert!(prompt.contains("I was fired on May 2, 2023"));
        assert!(prompt.contains("Allowed entity types: person, organization"));
        assert!(prompt.contains("\"relationships\""));
    }

    #[test]
    fn test_prompt_includes_known_entities_and_question() {
        let prompt = PromptBuilder::new("Yes, on May 2")
            .with_known_entities(vec![(EntityType::Claim, "Retaliation".to_string())])
            .with_question("When were you fired?")
            .build();
        assert!(prompt.contains("- Retaliation (claim)"));
        assert!(prompt.contains("When were you fired?"));
    }
}
