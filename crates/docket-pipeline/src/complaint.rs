//! Draft complaint assembled from the case graphs

use crate::CaseGraphs;
use docket_domain::{EntityType, EvidenceRecord, LegalElementType, LegalRelationType};
use docket_extractor::ENTITY_ID_ATTRIBUTE;
use docket_matcher::{MatchResults, Viability, ViabilityReport};
use std::fmt;

const FEDERAL: &str = "federal";

/// One element of a count and whether the case establishes it
#[derive(Debug, Clone, PartialEq)]
pub struct CountElement {
    /// Element name
    pub name: String,
    /// Whether a satisfied requirement or supporting fact establishes it
    pub established: bool,
}

/// A cause of action
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintCount {
    /// 1-based count number
    pub number: usize,
    /// Count title, e.g. "Retaliation"
    pub title: String,
    /// Claim type
    pub claim_type: String,
    /// Viability band from the matcher
    pub viability: Viability,
    /// Citations of the authorities providing the elements
    pub authorities: Vec<String>,
    /// Elements in legal-graph order
    pub elements: Vec<CountElement>,
    /// Names of the facts and evidence supporting the claim
    pub support: Vec<String>,
}

/// An evidence record attached to the complaint
#[derive(Debug, Clone, PartialEq)]
pub struct Exhibit {
    /// "Exhibit A", "Exhibit B", ...
    pub label: String,
    /// Evidence description
    pub description: String,
    /// Evidence kind
    pub evidence_type: String,
    /// Evidence id in the store
    pub evidence_id: String,
}

/// A structurally complete draft complaint
///
/// Not a court-ready filing: the document mirrors what the graphs know and
/// marks elements that nothing establishes yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalComplaint {
    /// Case the complaint was drafted for
    pub case_id: String,
    /// Court heading
    pub court: String,
    /// Jurisdiction name
    pub jurisdiction: String,
    /// Basis for the court's jurisdiction
    pub jurisdiction_statement: String,
    /// Named individuals
    pub individuals: Vec<String>,
    /// Named organizations, captioned as defendants
    pub defendants: Vec<String>,
    /// Numbered factual allegations
    pub allegations: Vec<String>,
    /// Causes of action
    pub counts: Vec<ComplaintCount>,
    /// Relief requested
    pub prayer_for_relief: Vec<String>,
    /// Evidence attached
    pub exhibits: Vec<Exhibit>,
    /// Rules of procedure the draft is structured against
    pub pleading_requirements: Vec<String>,
}

impl FormalComplaint {
    /// Assemble a complaint from the graphs, matching results and evidence
    pub fn build(
        case_id: &str,
        jurisdiction: &str,
        graphs: &CaseGraphs,
        results: &MatchResults,
        viability: &ViabilityReport,
        evidence: &[EvidenceRecord],
    ) -> Self {
        let kg = &graphs.knowledge;
        let dg = &graphs.dependency;
        let lg = &graphs.legal;
        let jurisdiction = jurisdiction.trim().to_lowercase();

        let names = |entity_type: EntityType| -> Vec<String> {
            kg.get_entities_by_type(entity_type)
                .into_iter()
                .map(|e| e.name.clone())
                .collect()
        };

        let mut allegations = Vec::new();
        for claim in kg.get_entities_by_type(EntityType::Claim) {
            if let Some(description) = claim.text_attribute("description") {
                match claim.text_attribute("date") {
                    Some(date) => allegations.push(format!("On or about {}, {}", date, sentence(description))),
                    None => allegations.push(sentence(description)),
                }
            }
        }
        for fact in kg.get_entities_by_type(EntityType::Fact) {
            let text = sentence(&fact.name);
            if !allegations.contains(&text) {
                allegations.push(text);
            }
        }

        let counts = viability
            .claim_assessments
            .iter()
            .zip(1..)
            .map(|(assessment, number)| {
                let summary = results.claims.iter().find(|c| c.claim_id == assessment.claim_id);
                let elements: Vec<CountElement> = summary
                    .map(|s| {
                        s.legal_requirements
                            .iter()
                            .filter_map(|id| lg.get_element(id))
                            .map(|element| CountElement {
                                name: element.name.clone(),
                                established: s.satisfied_requirements.contains(&element.id),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let mut authorities: Vec<String> = Vec::new();
                for requirement_id in summary.map(|s| s.legal_requirements.as_slice()).unwrap_or_default() {
                    for source in lg.sources_of(requirement_id, LegalRelationType::Provides) {
                        let cited = if source.has_citation() {
                            source.citation.clone()
                        } else {
                            source.name.clone()
                        };
                        if !authorities.contains(&cited) {
                            authorities.push(cited);
                        }
                    }
                }

                let support: Vec<String> = dg
                    .get_node(&assessment.claim_id)
                    .and_then(|node| node.attributes.get(ENTITY_ID_ATTRIBUTE))
                    .and_then(|id| id.as_text())
                    .map(|entity_id| {
                        kg.supporting_entities(entity_id)
                            .into_iter()
                            .map(|e| e.name.clone())
                            .collect()
                    })
                    .unwrap_or_default();

                ComplaintCount {
                    number,
                    title: assessment.claim_name.clone(),
                    claim_type: assessment.claim_type.clone(),
                    viability: assessment.viability,
                    authorities,
                    elements,
                    support,
                }
            })
            .collect();

        let exhibits = evidence
            .iter()
            .enumerate()
            .map(|(i, record)| Exhibit {
                label: format!("Exhibit {}", exhibit_letter(i)),
                description: record.description.clone(),
                evidence_type: record.evidence_type.clone(),
                evidence_id: record.id.clone(),
            })
            .collect();

        let pleading_requirements = lg
            .elements_of_type(LegalElementType::ProceduralRequirement)
            .into_iter()
            .map(|e| {
                if e.has_citation() {
                    format!("{} ({})", e.name, e.citation)
                } else {
                    e.name.clone()
                }
            })
            .collect();

        Self {
            case_id: case_id.to_string(),
            court: court_heading(&jurisdiction),
            jurisdiction_statement: jurisdiction_statement(&jurisdiction),
            jurisdiction,
            individuals: names(EntityType::Person),
            defendants: names(EntityType::Organization),
            allegations,
            counts,
            prayer_for_relief: prayer_for_relief(&names(EntityType::Amount)),
            exhibits,
            pleading_requirements,
        }
    }

    /// Counts assessed as moderate or strong
    pub fn viable_counts(&self) -> impl Iterator<Item = &ComplaintCount> {
        self.counts.iter().filter(|c| c.viability.is_viable())
    }

    /// The complaint as plain text
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FormalComplaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.court)?;
        writeln!(f)?;
        let defendants = if self.defendants.is_empty() {
            "DEFENDANT".to_string()
        } else {
            self.defendants.join(", ").to_uppercase()
        };
        writeln!(f, "PLAINTIFF,")?;
        writeln!(f, "    v.                                  Case No. {}", self.case_id)?;
        writeln!(f, "{},", defendants)?;
        writeln!(f)?;
        writeln!(f, "COMPLAINT")?;
        writeln!(f)?;

        writeln!(f, "JURISDICTION")?;
        writeln!(f, "{}", self.jurisdiction_statement)?;
        writeln!(f)?;

        writeln!(f, "PARTIES")?;
        if self.individuals.is_empty() && self.defendants.is_empty() {
            writeln!(f, "The parties have not yet been identified.")?;
        }
        for person in &self.individuals {
            writeln!(f, "- {}, an individual", person)?;
        }
        for organization in &self.defendants {
            writeln!(f, "- {}, Defendant", organization)?;
        }
        writeln!(f)?;

        writeln!(f, "FACTUAL ALLEGATIONS")?;
        if self.allegations.is_empty() {
            writeln!(f, "No factual allegations have been established.")?;
        }
        for (i, allegation) in self.allegations.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, allegation)?;
        }

        for count in &self.counts {
            writeln!(f)?;
            writeln!(f, "COUNT {}: {} ({})", roman(count.number), count.title.to_uppercase(), count.viability)?;
            if !count.authorities.is_empty() {
                writeln!(f, "Under {}.", count.authorities.join("; "))?;
            }
            for element in &count.elements {
                let mark = if element.established { "x" } else { " " };
                writeln!(f, "  [{}] {}", mark, element.name)?;
            }
            for support in &count.support {
                writeln!(f, "  Supported by: {}", support)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "PRAYER FOR RELIEF")?;
        writeln!(f, "WHEREFORE, Plaintiff requests:")?;
        for (i, relief) in self.prayer_for_relief.iter().enumerate() {
            writeln!(f, "  {}. {}", exhibit_letter(i).to_lowercase(), relief)?;
        }

        if !self.exhibits.is_empty() {
            writeln!(f)?;
            writeln!(f, "EXHIBITS")?;
            for exhibit in &self.exhibits {
                writeln!(f, "{}: {} ({})", exhibit.label, exhibit.description, exhibit.evidence_type)?;
            }
        }

        if !self.pleading_requirements.is_empty() {
            writeln!(f)?;
            writeln!(f, "PLEADING REQUIREMENTS")?;
            for requirement in &self.pleading_requirements {
                writeln!(f, "- {}", requirement)?;
            }
        }
        Ok(())
    }
}

fn court_heading(jurisdiction: &str) -> String {
    if jurisdiction == FEDERAL {
        "UNITED STATES DISTRICT COURT".to_string()
    } else {
        format!("COURT OF {}", jurisdiction.to_uppercase())
    }
}

fn jurisdiction_statement(jurisdiction: &str) -> String {
    if jurisdiction == FEDERAL {
        "This Court has subject-matter jurisdiction under 28 U.S.C. § 1331 because the claims arise under federal law."
            .to_string()
    } else {
        format!("This Court has jurisdiction over this action under the laws of {}.", jurisdiction)
    }
}

fn prayer_for_relief(amounts: &[String]) -> Vec<String> {
    let damages = match amounts.first() {
        Some(amount) => format!("Compensatory damages of no less than {}", amount),
        None => "Compensatory damages in an amount to be proven at trial".to_string(),
    };
    vec![
        damages,
        "Pre-judgment and post-judgment interest".to_string(),
        "Reasonable attorneys' fees and costs".to_string(),
        "Such other relief as the Court deems just and proper".to_string(),
    ]
}

fn sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

fn exhibit_letter(index: usize) -> String {
    let mut n = index;
    let mut label = String::new();
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

fn roman(n: usize) -> String {
    const TABLE: [(usize, &str); 9] = [
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut n = n;
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::{Entity, Relationship, RelationshipType};
    use docket_extractor::{ClaimSpec, DependencyGraphBuilder, LegalGraphBuilder};
    use docket_matcher::NeurosymbolicMatcher;

    fn case() -> CaseGraphs {
        let mut graphs = CaseGraphs::default();
        let kg = &mut graphs.knowledge;
        let claim = kg.add_entity(
            Entity::new(EntityType::Claim, "Retaliation")
                .with_attribute("claim_type", "retaliation")
                .with_attribute("description", "I was fired after I reported unequal pay")
                .with_attribute("date", "2023-03-15"),
        );
        kg.add_entity(Entity::new(EntityType::Organization, "Acme Corp"));
        kg.add_entity(Entity::new(EntityType::Amount, "$50,000"));
        let fact = kg.add_entity(Entity::new(EntityType::Fact, "Reported pay gap to HR in writing"));
        kg.add_relationship(Relationship::new(&fact, &claim, RelationshipType::Supports));

        graphs.dependency = DependencyGraphBuilder::default().build_from_knowledge_graph(&graphs.knowledge);
        graphs.legal = LegalGraphBuilder::new().build_for_claim_types(&["retaliation"], "federal");
        graphs
    }

    fn complaint(graphs: &CaseGraphs, evidence: &[EvidenceRecord]) -> FormalComplaint {
        let matcher = NeurosymbolicMatcher::default();
        let results = matcher.match_claims_to_law(&graphs.knowledge, &graphs.dependency, &graphs.legal);
        let viability = matcher.assess_claim_viability(&results);
        FormalComplaint::build("case-1", "Federal", graphs, &results, &viability, evidence)
    }

    #[test]
    fn test_federal_complaint_sections() {
        let graphs = case();
        let evidence = vec![EvidenceRecord::new("case-1", "claim", "Email to HR").with_type("email")];
        let complaint = complaint(&graphs, &evidence);

        assert_eq!(complaint.court, "UNITED STATES DISTRICT COURT");
        assert!(complaint.jurisdiction_statement.contains("28 U.S.C. § 1331"));
        assert_eq!(complaint.defendants, vec!["Acme Corp".to_string()]);
        assert_eq!(complaint.counts.len(), 1);
        assert_eq!(complaint.counts[0].claim_type, "retaliation");
        assert!(!complaint.counts[0].elements.is_empty());
        assert!(!complaint.counts[0].authorities.is_empty());
        assert_eq!(complaint.counts[0].support, vec!["Reported pay gap to HR in writing".to_string()]);
        assert!(complaint.prayer_for_relief[0].contains("$50,000"));
        assert_eq!(complaint.exhibits[0].label, "Exhibit A");
        assert_eq!(complaint.pleading_requirements.len(), 4);
        assert_eq!(
            complaint.allegations[0],
            "On or about 2023-03-15, I was fired after I reported unequal pay."
        );

        let text = complaint.render();
        for heading in ["COMPLAINT", "JURISDICTION", "PARTIES", "FACTUAL ALLEGATIONS", "COUNT I: RETALIATION", "PRAYER FOR RELIEF", "EXHIBITS"] {
            assert!(text.contains(heading), "missing {}", heading);
        }
    }

    #[test]
    fn test_empty_case_still_renders() {
        let graphs = CaseGraphs::default();
        let complaint = complaint(&graphs, &[]);
        assert!(complaint.counts.is_empty());
        let text = complaint.render();
        assert!(text.contains("The parties have not yet been identified."));
        assert!(text.contains("amount to be proven at trial"));
    }

    #[test]
    fn test_state_court_heading() {
        assert_eq!(court_heading("california"), "COURT OF CALIFORNIA");
        assert!(jurisdiction_statement("california").contains("laws of california"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(exhibit_letter(0), "A");
        assert_eq!(exhibit_letter(25), "Z");
        assert_eq!(exhibit_letter(26), "AA");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(14), "XIV");
    }
}
