//! Legal graph builder
//!
//! Statutes become `statute` elements, claim types become `requirement` elements
//! drawn from the requirement catalog, and every statute that covers a claim type
//! `provides` that claim type's requirements. Rules of procedure are a fixed set
//! of pleading requirements tagged with a jurisdiction.

use crate::catalog::{default_statutes, requirements_for, Statute};
use docket_domain::{LegalElement, LegalElementType, LegalGraph, LegalRelation, LegalRelationType};
use tracing::{debug, info};

/// Attribute carrying the catalog key of a requirement element
pub const REQUIREMENT_KEY_ATTRIBUTE: &str = "requirement_key";

const FEDERAL: &str = "federal";

struct ProceduralRule {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    federal_citation: &'static str,
}

const PROCEDURAL_RULES: [ProceduralRule; 4] = [
    ProceduralRule {
        key: "jurisdiction_statement",
        name: "Statement of jurisdiction",
        description: "A short and plain statement of the grounds for the court's jurisdiction",
        federal_citation: "Fed. R. Civ. P. 8(a)(1)",
    },
    ProceduralRule {
        key: "statement_of_claim",
        name: "Statement of the claim",
        description: "A short and plain statement of the claim showing that the pleader is entitled to relief",
        federal_citation: "Fed. R. Civ. P. 8(a)(2)",
    },
    ProceduralRule {
        key: "demand_for_relief",
        name: "Demand for relief",
        description: "A demand for the relief sought, which may include relief in the alternative",
        federal_citation: "Fed. R. Civ. P. 8(a)(3)",
    },
    ProceduralRule {
        key: "caption",
        name: "Caption",
        description: "A caption naming the court, the parties, the file number and the pleading designation",
        federal_citation: "Fed. R. Civ. P. 10(a)",
    },
];

/// Builds legal requirement graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct LegalGraphBuilder;

impl LegalGraphBuilder {
    /// Create a builder
    pub fn new() -> Self {
        Self
    }

    /// Statute elements, requirement elements per claim type, and `provides` edges
    ///
    /// Requirement ids are `req:{claim_type}:{key}` so graphs built separately
    /// merge cleanly. Duplicate claim types are built once.
    pub fn build_from_statutes<S: AsRef<str>>(&self, statutes: &[Statute], claim_types: &[S]) -> LegalGraph {
        let mut lg = LegalGraph::new();

        let mut requirement_ids: Vec<(String, Vec<String>)> = Vec::new();
        for claim_type in claim_types.iter().map(AsRef::as_ref) {
            if requirement_ids.iter().any(|(t, _)| t == claim_type) {
                continue;
            }
            let ids = requirements_for(claim_type)
                .iter()
                .map(|template| {
                    lg.add_element(
                        LegalElement::new(LegalElementType::Requirement, template.name)
                            .with_id(requirement_id(claim_type, template.key))
                            .with_description(template.description)
                            .with_claim_types([claim_type])
                            .with_attribute(REQUIREMENT_KEY_ATTRIBUTE, template.key),
                    )
                })
                .collect();
            requirement_ids.push((claim_type.to_string(), ids));
        }

        for statute in statutes {
            let covered: Vec<&String> = requirement_ids
                .iter()
                .map(|(t, _)| t)
                .filter(|t| statute.covers(t))
                .collect();
            let statute_id = lg.add_element(
                LegalElement::new(LegalElementType::Statute, &statute.name)
                    .with_id(format!("statute:{}", slug(&statute.name)))
                    .with_citation(&statute.citation)
                    .with_jurisdiction(&statute.jurisdiction)
                    .with_description(&statute.description)
                    .with_claim_types(covered.iter().map(|t| t.as_str())),
            );
            for (claim_type, ids) in &requirement_ids {
                if !statute.covers(claim_type) {
                    continue;
                }
                for requirement in ids {
                    lg.add_relation(LegalRelation::new(&statute_id, requirement, LegalRelationType::Provides));
                }
            }
        }

        info!(
            statutes = statutes.len(),
            elements = lg.element_count(),
            relations = lg.relation_count(),
            "Built legal graph from statutes"
        );
        lg
    }

    /// The four pleading requirements, tagged with `jurisdiction`
    ///
    /// Federal rules carry their FRCP citation; other jurisdictions leave it empty.
    pub fn build_rules_of_procedure(&self, jurisdiction: &str) -> LegalGraph {
        let jurisdiction = jurisdiction.trim().to_lowercase();
        let mut lg = LegalGraph::new();
        for rule in &PROCEDURAL_RULES {
            let citation = if jurisdiction == FEDERAL { rule.federal_citation } else { "" };
            lg.add_element(
                LegalElement::new(LegalElementType::ProceduralRequirement, rule.name)
                    .with_id(format!("proc:{}:{}", jurisdiction, rule.key))
                    .with_description(rule.description)
                    .with_citation(citation)
                    .with_jurisdiction(jurisdiction.as_str())
                    .with_attribute(REQUIREMENT_KEY_ATTRIBUTE, rule.key),
            );
        }
        debug!(jurisdiction = %jurisdiction, "Built rules of procedure");
        lg
    }

    /// Default statutes for the claim types plus the rules of procedure
    pub fn build_for_claim_types<S: AsRef<str>>(&self, claim_types: &[S], jurisdiction: &str) -> LegalGraph {
        let mut lg = self.build_from_statutes(&default_statutes(claim_types), claim_types);
        lg.merge(self.build_rules_of_procedure(jurisdiction));
        lg
    }
}

/// Id of the requirement element for a claim type and catalog key
pub fn requirement_id(claim_type: &str, key: &str) -> String {
    format!("req:{}:{}", claim_type, key)
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_federal_rules_of_procedure() {
        let lg = LegalGraphBuilder::new().build_rules_of_procedure("federal");
        assert_eq!(lg.element_count(), 4);
        assert_eq!(lg.relation_count(), 0);
        for element in lg.elements() {
            assert_eq!(element.element_type, LegalElementType::ProceduralRequirement);
            assert_eq!(element.jurisdiction, "federal");
            assert!(element.citation.starts_with("Fed. R. Civ. P."));
        }
        assert!(lg.get_element("proc:federal:caption").is_some());
    }

    #[test]
    fn test_state_rules_have_no_federal_citation() {
        let lg = LegalGraphBuilder::new().build_rules_of_procedure("California");
        assert_eq!(lg.element_count(), 4);
        assert_eq!(lg.elements_with_citations(), 0);
        assert!(lg.elements().all(|e| e.jurisdiction == "california"));
    }

    #[test]
    fn test_build_from_statutes_discrimination() {
        let statutes = vec![
            Statute::new("Title VII", "42 U.S.C. § 2000e-2").for_claim_types(["discrimination"]),
            Statute::new("Fair Labor Standards Act", "29 U.S.C. § 201").for_claim_types(["wage_violation"]),
        ];
        let lg = LegalGraphBuilder::new().build_from_statutes(&statutes, &["discrimination", "discrimination"]);

        let keys: Vec<_> = lg
            .get_requirements_for_claim_type("discrimination")
            .iter()
            .filter_map(|e| e.attributes.get(REQUIREMENT_KEY_ATTRIBUTE).and_then(|v| v.as_text()))
            .map(str::to_string)
            .collect();
        assert_eq!(keys, vec!["protected_class", "adverse_action", "causal_connection"]);

        let title_vii = lg.get_element("statute:title_vii").unwrap();
        assert_eq!(title_vii.applicable_claim_types, vec!["discrimination"]);
        assert_eq!(lg.relations_from(&title_vii.id).len(), 3);
        assert!(lg
            .relations()
            .all(|r| r.relation_type == LegalRelationType::Provides && r.source_id == title_vii.id));
        let flsa = lg.get_element("statute:fair_labor_standards_act").unwrap();
        assert!(flsa.applicable_claim_types.is_empty());
    }

    #[test]
    fn test_unrestricted_statute_provides_every_requirement() {
        let statutes = vec![Statute::new("State Civil Code", "")];
        let lg = LegalGraphBuilder::new().build_from_statutes(&statutes, &["retaliation", "defamation"]);
        // 3 retaliation elements plus 2 generic ones
        assert_eq!(lg.relation_count(), 5);
    }

    #[test]
    fn test_build_for_claim_types_merges_procedure() {
        let lg = LegalGraphBuilder::new().build_for_claim_types(&["retaliation"], "federal");
        assert_eq!(lg.elements_of_type(LegalElementType::ProceduralRequirement).len(), 4);
        assert_eq!(lg.elements_of_type(LegalElementType::Statute).len(), 2);
        assert_eq!(lg.get_requirements_for_claim_type("retaliation").len(), 3);
        assert_eq!(lg.requirements_coverage().claim_types_covered, 1);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Title VII Anti-Retaliation Provision"), "title_vii_anti_retaliation_provision");
        assert_eq!(slug("  Equal Pay Act of 1963 "), "equal_pay_act_of_1963");
    }
}
