//! Parse model output into entity and relationship candidates

use crate::error::ExtractorError;
use docket_domain::{AttributeValue, Attributes, EntityType, RelationshipType};
use serde_json::{Map, Value};
use tracing::warn;

/// An entity proposed by the model
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCandidate {
    /// Entity name
    pub name: String,
    /// Entity type (unknown names map to `other`)
    pub entity_type: EntityType,
    /// Confidence in [0, 1]
    pub confidence: Option<f64>,
    /// Attributes
    pub attributes: Attributes,
}

/// A relationship proposed by the model, endpoints by entity name
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipCandidate {
    /// Source entity name
    pub source: String,
    /// Target entity name
    pub target: String,
    /// Relationship type (unknown names map to `related_to`)
    pub relationship_type: RelationshipType,
    /// Confidence in [0, 1]
    pub confidence: Option<f64>,
}

/// Everything usable in one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExtraction {
    /// Valid entities, response order
    pub entities: Vec<EntityCandidate>,
    /// Valid relationships, response order
    pub relationships: Vec<RelationshipCandidate>,
}

impl ParsedExtraction {
    /// Whether nothing usable was found
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// Parse a model response
///
/// Accepts either `{"entities": [...], "relationships": [...]}` or a bare array
/// of entities, optionally wrapped in a markdown code fence or surrounded by
/// prose. Invalid items are skipped with a warning; only a response with no
/// recognisable JSON structure is an error.
pub fn parse_llm_response(response: &str) -> Result<ParsedExtraction, ExtractorError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let (entities, relationships) = match &json {
        Value::Array(items) => (items.as_slice(), &[][..]),
        Value::Object(obj) => (
            array_field(obj, "entities"),
            array_field(obj, "relationships"),
        ),
        _ => {
            return Err(ExtractorError::InvalidFormat(
                "Expected JSON object or array".to_string(),
            ))
        }
    };

    let mut parsed = ParsedExtraction::default();
    for (idx, item) in entities.iter().enumerate() {
        match parse_entity(item) {
            Ok(entity) => parsed.entities.push(entity),
            Err(e) => warn!("Skipping entity {}: {}", idx, e),
        }
    }
    for (idx, item) in relationships.iter().enumerate() {
        match parse_relationship(item) {
            Ok(rel) => parsed.relationships.push(rel),
            Err(e) => warn!("Skipping relationship {}: {}", idx, e),
        }
    }

    Ok(parsed)
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Pull the JSON payload out of a response
///
/// Handles markdown fences (with or without a language tag) and leading or
/// trailing prose around the outermost object or array.
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();

    let body = if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        lines[1..end].join("\n")
    } else {
        trimmed.to_string()
    };

    let start = body.find(['{', '[']);
    let end = body.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(body[s..=e].to_string()),
        _ => Err(ExtractorError::InvalidFormat("No JSON found in response".to_string())),
    }
}

fn confidence_field(obj: &Map<String, Value>) -> Result<Option<f64>, String> {
    match obj.get("confidence") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let c = v.as_f64().ok_or_else(|| "Invalid 'confidence'".to_string())?;
            if (0.0..=1.0).contains(&c) {
                Ok(Some(c))
            } else {
                Err(format!("Confidence {} out of range", c))
            }
        }
    }
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_entity(json: &Value) -> Result<EntityCandidate, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Entity is not a JSON object".to_string())?;

    let name = non_empty_str(obj, "name")
        .ok_or_else(|| "Missing or invalid 'name'".to_string())?
        .to_string();
    let entity_type = non_empty_str(obj, "type")
        .map(EntityType::parse_lenient)
        .unwrap_or(EntityType::Other);
    let confidence = confidence_field(obj)?;

    let mut attributes = Attributes::new();
    if let Some(Value::Object(attrs)) = obj.get("attributes") {
        for (key, value) in attrs {
            if let Some(value) = to_attribute(value) {
                attributes.insert(key.clone(), value);
            }
        }
    }

    Ok(EntityCandidate {
        name,
        entity_type,
        confidence,
        attributes,
    })
}

fn parse_relationship(json: &Value) -> Result<RelationshipCandidate, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Relationship is not a JSON object".to_string())?;

    let source = non_empty_str(obj, "source")
        .ok_or_else(|| "Missing or invalid 'source'".to_string())?
        .to_string();
    let target = non_empty_str(obj, "target")
        .ok_or_else(|| "Missing or invalid 'target'".to_string())?
        .to_string();
    let relationship_type = non_empty_str(obj, "type")
        .map(RelationshipType::parse_lenient)
        .unwrap_or(RelationshipType::RelatedTo);

    Ok(RelationshipCandidate {
        source,
        target,
        relationship_type,
        confidence: confidence_field(obj)?,
    })
}

fn to_attribute(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::String(s) => Some(AttributeValue::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(AttributeValue::Number),
        Value::Bool(b) => Some(AttributeValue::Flag(*b)),
        Value::Array(items) => Some(AttributeValue::List(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_form() {
        let response = r#"{
            "entities": [
                {"name": "Retaliation", "type": "claim", "confidence": 0.8,
                 "attributes": {"claim_type": "retaliation", "keywords": ["fired", "complained"]}},
                {"name": "Acme Corp", "type": "organization"}
            ],
            "relationships": [
                {"source": "Acme Corp", "target": "Retaliation", "type": "involves"}
            ]
        }"#;

        let parsed = parse_llm_response(response).unwrap();
        assert_eq!(parsed.entities.len(), 2);
        assert_eq!(parsed.entities[0].entity_type, EntityType::Claim);
        assert_eq!(parsed.entities[0].confidence, Some(0.8));
        assert_eq!(
            parsed.entities[0].attributes.get("claim_type"),
            Some(&AttributeValue::Text("retaliation".to_string()))
        );
        assert_eq!(parsed.relationships.len(), 1);
        assert_eq!(parsed.relationships[0].relationship_type, RelationshipType::Involves);
    }

    #[test]
    fn test_parse_bare_array_in_markdown() {
        let response = "```json\n[{\"name\": \"Jane\", \"type\": \"person\"}]\n```";
        let parsed = parse_llm_response(response).unwrap();
        assert_eq!(parsed.entities.len(), 1);
        assert_eq!(parsed.entities[0].entity_type, EntityType::Person);
        assert!(parsed.relationships.is_empty());
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let response = "Sure! Here is the JSON:\n{\"entities\": [{\"name\": \"HR\", \"type\": \"team\"}]}\nHope this helps.";
        let parsed = parse_llm_response(response).unwrap();
        assert_eq!(parsed.entities[0].entity_type, EntityType::Other);
    }

    #[test]
    fn test_partial_success_skips_invalid_items() {
        let response = r#"{"entities": [
            {"name": "Valid", "type": "fact"},
            {"type": "fact"},
            {"name": "Overconfident", "confidence": 1.5},
            "just a string",
            {"name": "Also valid", "confidence": 0.4}
        ], "relationships": [{"source": "Valid"}]}"#;

        let parsed = parse_llm_response(response).unwrap();
        let names: Vec<_> = parsed.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Valid", "Also valid"]);
        assert!(parsed.relationships.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_llm_response("This is not JSON").is_err());
        assert!(parse_llm_response("{ broken").is_err());
        assert!(parse_llm_response("```").is_err());
        assert!(parse_llm_response("42").is_err());
    }

    #[test]
    fn test_empty_object_is_empty_extraction() {
        let parsed = parse_llm_response("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
