//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use docket_denoiser::Question;
use docket_domain::{LegalElementType, LegalGraph};
use docket_matcher::ViabilityReport;
use docket_pipeline::{FormalComplaint, SessionStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the questions currently offered to the user.
    ///
    /// Table output numbers them from 1 so the REPL can accept a bare number
    /// as the question reference.
    pub fn format_questions(&self, questions: &[Question]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = questions
                    .iter()
                    .map(|q| {
                        serde_json::json!({
                            "id": q.id,
                            "text": q.text,
                            "priority": q.priority,
                            "phase": q.phase.as_str(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if questions.is_empty() {
                    return Ok(self.colorize("No open questions.", "yellow"));
                }
                let lines: Vec<String> = questions
                    .iter()
                    .enumerate()
                    .map(|(i, q)| format!("{} {}", self.colorize(&format!("[{}]", i + 1), "cyan"), q.text))
                    .collect();
                Ok(lines.join("\n"))
            }
            OutputFormat::Quiet => Ok(questions.iter().map(|q| q.id.as_str()).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Format a session status report.
    pub fn format_status(&self, status: &SessionStatus) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "case_id": status.case_id,
                    "started": status.started,
                    "phase": status.phase.as_str(),
                    "iteration_count": status.iteration_count,
                    "noise_level": status.noise_level,
                    "phase_complete": status.phase_complete,
                    "converged": status.converged,
                    "stagnating": status.stagnating,
                    "readiness": status.readiness,
                    "claims": status.claims,
                    "pending_questions": status.pending_questions,
                    "evidence_count": status.evidence_count,
                    "next_action": status.next_action.as_str(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                let noise = status
                    .noise_level
                    .map(|n| format!("{:.3}", n))
                    .unwrap_or_else(|| "-".to_string());

                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["Case", status.case_id.as_str()]);
                builder.push_record(["Phase", &status.phase.to_string()]);
                builder.push_record(["Iterations", &status.iteration_count.to_string()]);
                builder.push_record(["Noise", &noise]);
                builder.push_record(["Phase complete", yes_no(status.phase_complete)]);
                builder.push_record(["Converged", yes_no(status.converged)]);
                builder.push_record(["Readiness", &format!("{:.0}%", status.readiness * 100.0)]);
                builder.push_record(["Claims", &status.claims.to_string()]);
                builder.push_record(["Open questions", &status.pending_questions.to_string()]);
                builder.push_record(["Evidence", &status.evidence_count.to_string()]);
                builder.push_record(["Next", status.next_action.as_str()]);
                Ok(self.finish_table(builder))
            }
            OutputFormat::Quiet => Ok(status.next_action.as_str().to_string()),
        }
    }

    /// Format the elements of a legal graph, grouped by element type.
    pub fn format_rules(&self, graph: &LegalGraph) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = graph
                    .elements()
                    .map(|e| {
                        serde_json::json!({
                            "id": e.id,
                            "type": e.element_type.as_str(),
                            "name": e.name,
                            "citation": e.citation,
                            "jurisdiction": e.jurisdiction,
                            "required": e.required,
                            "claim_types": e.applicable_claim_types,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if graph.element_count() == 0 {
                    return Ok(self.colorize("No rules found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Type", "Name", "Citation", "Required"]);
                let order = [
                    LegalElementType::ProceduralRequirement,
                    LegalElementType::Statute,
                    LegalElementType::Regulation,
                    LegalElementType::CaseLaw,
                    LegalElementType::Requirement,
                ];
                for element_type in order {
                    for element in graph.elements_of_type(element_type) {
                        builder.push_record([
                            element.element_type.as_str(),
                            &element.name,
                            &element.citation,
                            yes_no(element.required),
                        ]);
                    }
                }
                Ok(self.finish_table(builder))
            }
            OutputFormat::Quiet => Ok(graph.elements().map(|e| e.id.as_str()).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Format a viability report.
    pub fn format_viability(&self, report: &ViabilityReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "viable_count": report.viable_count,
                    "claims": report
                        .claim_assessments
                        .iter()
                        .map(|a| {
                            serde_json::json!({
                                "claim_id": a.claim_id,
                                "claim_type": a.claim_type,
                                "viability": a.viability.as_str(),
                                "confidence": a.confidence,
                                "satisfied_fraction": a.satisfied_fraction,
                            })
                        })
                        .collect::<Vec<_>>(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if report.claim_assessments.is_empty() {
                    return Ok(self.colorize("No claims assessed.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Claim", "Type", "Viability", "Established", "Confidence"]);
                for assessment in &report.claim_assessments {
                    builder.push_record([
                        assessment.claim_name.as_str(),
                        &assessment.claim_type,
                        assessment.viability.as_str(),
                        &format!("{:.0}%", assessment.satisfied_fraction * 100.0),
                        &format!("{:.2}", assessment.confidence),
                    ]);
                }
                let table = self.finish_table(builder);
                let footer = format!("{} of {} claim(s) viable", report.viable_count, report.claim_assessments.len());
                Ok(format!("{}\n{}", table, footer))
            }
            OutputFormat::Quiet => Ok(report.viable_count.to_string()),
        }
    }

    /// Format a drafted complaint.
    pub fn format_complaint(&self, complaint: &FormalComplaint) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "case_id": complaint.case_id,
                    "court": complaint.court,
                    "jurisdiction": complaint.jurisdiction,
                    "jurisdiction_statement": complaint.jurisdiction_statement,
                    "individuals": complaint.individuals,
                    "defendants": complaint.defendants,
                    "allegations": complaint.allegations,
                    "counts": complaint
                        .counts
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "number": c.number,
                                "title": c.title,
                                "claim_type": c.claim_type,
                                "viability": c.viability.as_str(),
                                "authorities": c.authorities,
                                "support": c.support,
                            })
                        })
                        .collect::<Vec<_>>(),
                    "prayer_for_relief": complaint.prayer_for_relief,
                    "exhibits": complaint
                        .exhibits
                        .iter()
                        .map(|e| serde_json::json!({ "label": e.label, "evidence_id": e.evidence_id }))
                        .collect::<Vec<_>>(),
                    "pleading_requirements": complaint.pleading_requirements,
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table | OutputFormat::Quiet => Ok(complaint.render()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn finish_table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_denoiser::QuestionTarget;
    use docket_domain::Phase;
    use docket_extractor::LegalGraphBuilder;
    use docket_pipeline::NextAction;

    fn status() -> SessionStatus {
        SessionStatus {
            case_id: "case-1".to_string(),
            started: true,
            phase: Phase::Evidence,
            iteration_count: 4,
            noise_level: Some(0.42),
            phase_complete: false,
            converged: false,
            stagnating: false,
            readiness: 0.5,
            claims: 2,
            pending_questions: 3,
            evidence_count: 1,
            next_action: NextAction::AnswerQuestion,
        }
    }

    #[test]
    fn test_status_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_status(&status()).unwrap();
        assert!(output.contains("EVIDENCE"));
        assert!(output.contains("0.420"));
        assert!(output.contains("answer_question"));
    }

    #[test]
    fn test_status_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_status(&status()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["phase"], "evidence");
        assert_eq!(value["claims"], 2);
    }

    #[test]
    fn test_questions_are_numbered() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let target = |key: &str| QuestionTarget::Requirement {
            requirement_id: format!("req-{}", key),
            claim_id: "claim-1".to_string(),
            requirement_key: key.to_string(),
        };
        let questions = vec![
            Question::new("When did it happen?", target("adverse_action"), 0.9, Phase::Intake),
            Question::new("Who was involved?", target("protected_activity"), 0.5, Phase::Intake),
        ];
        let output = formatter.format_questions(&questions).unwrap();
        assert!(output.contains("[1] When did it happen?"));
        assert!(output.contains("[2] Who was involved?"));

        let quiet = Formatter::new(OutputFormat::Quiet, false).format_questions(&questions).unwrap();
        assert_eq!(quiet.lines().count(), 2);
    }

    #[test]
    fn test_rules_table_lists_procedure() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let graph = LegalGraphBuilder::new().build_rules_of_procedure("federal");
        let output = formatter.format_rules(&graph).unwrap();
        assert!(output.contains("procedural_requirement"));
    }

    #[test]
    fn test_messages_without_color() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
