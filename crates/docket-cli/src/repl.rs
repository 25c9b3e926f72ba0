//! Interactive interview loop.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docket_domain::{DependencyGraph, EvidenceRecord};
use docket_pipeline::{AdvanceOutcome, NextAction, Orchestrator};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A question reference typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionRef {
    /// 1-based position in the open question list
    Index(usize),
    /// Question id
    Id(String),
}

/// A claim reference typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimRef {
    /// 1-based position in the claim list
    Index(usize),
    /// Dependency-graph claim node id
    Id(String),
}

/// Interview command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Leave the interview
    Exit,
    /// Print the command list
    Help,
    /// List the open questions
    Questions,
    /// Answer an open question
    Answer {
        /// Which question
        question: QuestionRef,
        /// Answer text
        text: String,
    },
    /// List the claims and their requirement keys
    Claims,
    /// Submit an evidence record for a claim
    Evidence {
        /// Which claim
        claim: ClaimRef,
        /// Requirement keys the record supports (empty means every requirement)
        supports: Vec<String>,
        /// What the evidence is
        description: String,
    },
    /// Request the next phase
    Advance,
    /// Print the session status
    Status,
    /// Print the narrative summary
    Summary,
    /// Print claim viability
    Viability,
    /// Draft the complaint
    Complaint,
    /// Write the three graphs as JSON
    Save(Option<PathBuf>),
    /// Print the session counters
    Metrics,
}

/// Run the interview until the user exits.
pub fn run_interview(session: &mut Orchestrator, config: &Config, formatter: &Formatter, save_dir: &Path) -> Result<()> {
    println!();
    println!(
        "{}",
        formatter.info("Answer with '<n> <text>'. Type 'help' for commands, 'exit' to quit")
    );

    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config)?;

    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = format!("docket [{}]> ", session.current_phase().as_str());

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute_repl_command(cmd, session, formatter, save_dir) {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    editor.save_history(&history_path).ok();

    Ok(())
}

/// Parse one interview line.
pub fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }

    // "<n> <text>" answers question n
    if let Ok(index) = parts[0].parse::<usize>() {
        return parse_answer(QuestionRef::Index(index), &parts[1..]);
    }

    match parts[0] {
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "questions" | "qs" => Ok(ReplCommand::Questions),
        "answer" | "a" => parse_answer_command(&parts[1..]),
        "claims" => Ok(ReplCommand::Claims),
        "evidence" | "ev" => parse_evidence_command(&parts[1..]),
        "advance" | "next" => Ok(ReplCommand::Advance),
        "status" => Ok(ReplCommand::Status),
        "summary" => Ok(ReplCommand::Summary),
        "viability" => Ok(ReplCommand::Viability),
        "complaint" => Ok(ReplCommand::Complaint),
        "save" => Ok(ReplCommand::Save(parts.get(1).map(PathBuf::from))),
        "metrics" => Ok(ReplCommand::Metrics),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            parts[0]
        ))),
    }
}

fn parse_answer_command(args: &[&str]) -> Result<ReplCommand> {
    let Some(first) = args.first() else {
        return Err(CliError::InvalidInput("Usage: answer <n|question-id> <text>".to_string()));
    };

    let question = match first.parse::<usize>() {
        Ok(index) => QuestionRef::Index(index),
        Err(_) => QuestionRef::Id(first.to_string()),
    };
    parse_answer(question, &args[1..])
}

fn parse_answer(question: QuestionRef, words: &[&str]) -> Result<ReplCommand> {
    if words.is_empty() {
        return Err(CliError::InvalidInput("The answer is empty".to_string()));
    }
    if question == QuestionRef::Index(0) {
        return Err(CliError::InvalidInput("Questions are numbered from 1".to_string()));
    }
    Ok(ReplCommand::Answer {
        question,
        text: words.join(" "),
    })
}

fn parse_evidence_command(args: &[&str]) -> Result<ReplCommand> {
    if args.len() < 2 {
        return Err(CliError::InvalidInput(
            "Usage: evidence <claim n|claim-id> [supports=key1,key2] <description>".to_string(),
        ));
    }

    let claim = match args[0].parse::<usize>() {
        Ok(0) => return Err(CliError::InvalidInput("Claims are numbered from 1".to_string())),
        Ok(index) => ClaimRef::Index(index),
        Err(_) => ClaimRef::Id(args[0].to_string()),
    };

    let (supports, rest) = match args[1].strip_prefix("supports=") {
        Some(keys) => (
            keys.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            &args[2..],
        ),
        None => (Vec::new(), &args[1..]),
    };

    if rest.is_empty() {
        return Err(CliError::InvalidInput("The evidence description is empty".to_string()));
    }

    Ok(ReplCommand::Evidence {
        claim,
        supports,
        description: rest.join(" "),
    })
}

/// Execute one interview command against the session.
pub fn execute_repl_command(
    cmd: ReplCommand,
    session: &mut Orchestrator,
    formatter: &Formatter,
    save_dir: &Path,
) -> Result<()> {
    match cmd {
        ReplCommand::Questions => {
            let pending: Vec<_> = session.pending_questions().into_iter().cloned().collect();
            println!("{}", formatter.format_questions(&pending)?);
        }
        ReplCommand::Answer { question, text } => {
            let id = resolve_question(session, &question)?;
            let outcome = session.submit_answer(&id, &text)?;
            if outcome.diff.already_answered {
                println!("{}", formatter.warning("That question was already answered"));
                return Ok(());
            }

            println!(
                "{}",
                formatter.success(&format!(
                    "Recorded: {} entities, {} requirement(s) satisfied, loss {:.3}",
                    outcome.diff.entities_added.len(),
                    outcome.diff.requirements_satisfied.len(),
                    outcome.noise_level
                ))
            );
            print_next(session, formatter)?;
        }
        ReplCommand::Claims => {
            print_claims(&session.graphs().dependency);
        }
        ReplCommand::Evidence {
            claim,
            supports,
            description,
        } => {
            let dg = &session.graphs().dependency;
            let claim_id = resolve_claim(dg, &claim)?;
            let supports = if supports.is_empty() {
                dg.requirements_for_claim(&claim_id)
                    .iter()
                    .filter_map(|r| r.requirement_key.clone())
                    .collect()
            } else {
                supports
            };

            let record = EvidenceRecord::new(session.case_id(), &claim_id, description).supporting(supports);
            let outcome = session.add_evidence(record)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Evidence {} stored, {} requirement(s) satisfied, gap ratio {:.3}",
                    outcome.handle.evidence_id,
                    outcome.application.satisfied.len(),
                    outcome.evidence_gap_ratio
                ))
            );
            if !outcome.application.met_threshold {
                println!(
                    "{}",
                    formatter.warning("Confidence below threshold; attached to the claim only")
                );
            }
        }
        ReplCommand::Advance => match session.advance_phase()? {
            AdvanceOutcome::Advanced { from, to, questions } => {
                info!(from = %from, to = %to, "Phase advanced");
                println!("{}", formatter.success(&format!("{} complete, now in {}", from, to)));
                println!("{}", formatter.format_questions(&questions)?);
            }
            AdvanceOutcome::Rejected(refusal) => {
                println!("{}", formatter.warning(&refusal.to_string()));
            }
        },
        ReplCommand::Status => {
            println!("{}", formatter.format_status(&session.status())?);
        }
        ReplCommand::Summary => {
            println!("{}", session.summary());
        }
        ReplCommand::Viability => match session.assess_viability() {
            Some(report) => println!("{}", formatter.format_viability(&report)?),
            None => println!("{}", formatter.info("Viability is assessed during FORMALIZATION")),
        },
        ReplCommand::Complaint => {
            let complaint = session.generate_formal_complaint()?;
            println!("{}", formatter.format_complaint(&complaint)?);
        }
        ReplCommand::Save(dir) => {
            let dir = dir.unwrap_or_else(|| save_dir.to_path_buf());
            save_graphs(session, &dir)?;
            println!("{}", formatter.success(&format!("Graphs saved to {}", dir.display())));
        }
        ReplCommand::Metrics => {
            println!("{}", session.metrics().summary());
        }
        ReplCommand::Exit | ReplCommand::Help => {}
    }

    Ok(())
}

/// Write the knowledge, dependency and legal graphs into `dir`.
pub fn save_graphs(session: &Orchestrator, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let graphs = session.graphs();
    docket_store::save(&graphs.knowledge, dir.join("knowledge_graph.json"))?;
    docket_store::save(&graphs.dependency, dir.join("dependency_graph.json"))?;
    docket_store::save(&graphs.legal, dir.join("legal_graph.json"))?;
    info!(case_id = %session.case_id(), dir = %dir.display(), "Saved case graphs");
    Ok(())
}

fn resolve_question(session: &Orchestrator, question: &QuestionRef) -> Result<String> {
    match question {
        QuestionRef::Id(id) => Ok(id.clone()),
        QuestionRef::Index(index) => session
            .pending_questions()
            .get(index - 1)
            .map(|q| q.id.clone())
            .ok_or_else(|| CliError::InvalidInput(format!("No open question numbered {}", index))),
    }
}

fn resolve_claim(dg: &DependencyGraph, claim: &ClaimRef) -> Result<String> {
    match claim {
        ClaimRef::Id(id) => Ok(id.clone()),
        ClaimRef::Index(index) => dg
            .claims()
            .nth(index - 1)
            .map(|c| c.id.clone())
            .ok_or_else(|| CliError::InvalidInput(format!("No claim numbered {}", index))),
    }
}

fn print_claims(dg: &DependencyGraph) {
    for (i, claim) in dg.claims().enumerate() {
        println!(
            "[{}] {} ({})",
            i + 1,
            claim.name,
            claim.claim_type.as_deref().unwrap_or("unknown")
        );
        for requirement in dg.requirements_for_claim(&claim.id) {
            let mark = if requirement.satisfied == Some(true) { "x" } else { " " };
            println!(
                "    [{}] {}",
                mark,
                requirement.requirement_key.as_deref().unwrap_or(&requirement.name)
            );
        }
    }
}

fn print_next(session: &Orchestrator, formatter: &Formatter) -> Result<()> {
    let status = session.status();
    match status.next_action {
        NextAction::AnswerQuestion => {
            let pending: Vec<_> = session.pending_questions().into_iter().cloned().collect();
            if pending.is_empty() {
                warn!(phase = %status.phase, "No open questions left");
            }
            println!("{}", formatter.format_questions(&pending)?);
        }
        NextAction::AdvancePhase => {
            println!("{}", formatter.info(&format!("{} is complete. Type 'advance' to continue", status.phase)));
        }
        NextAction::GenerateComplaint => {
            println!("{}", formatter.info("Type 'complaint' to draft the complaint"));
        }
    }
    Ok(())
}

fn get_history_path() -> Result<PathBuf> {
    let dir = Config::dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  <n> <text>                       - Answer open question n");
    println!("  answer <n|id> <text>             - Answer a question by number or id");
    println!("  questions                        - List open questions");
    println!("  claims                           - List claims and their requirements");
    println!("  evidence <claim> [supports=k1,k2] <description>");
    println!("                                   - Submit evidence (EVIDENCE phase onward)");
    println!("  advance                          - Move to the next phase");
    println!("  status                           - Show session status");
    println!("  summary                          - Show what the session knows");
    println!("  viability                        - Show claim viability");
    println!("  complaint                        - Draft the complaint (FORMALIZATION)");
    println!("  save [dir]                       - Write the case graphs as JSON");
    println!("  metrics                          - Show session counters");
    println!("  help, ?                          - Show this help");
    println!("  exit, quit, q                    - Leave the interview");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_pipeline::PipelineConfig;
    use tempfile::TempDir;

    #[test]
    fn test_bare_number_answers() {
        let cmd = parse_repl_command("2 It was on March 15").unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Answer {
                question: QuestionRef::Index(2),
                text: "It was on March 15".to_string(),
            }
        );
    }

    #[test]
    fn test_answer_by_id() {
        let cmd = parse_repl_command("answer q:gap:abc yes").unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Answer {
                question: QuestionRef::Id("q:gap:abc".to_string()),
                text: "yes".to_string(),
            }
        );
    }

    #[test]
    fn test_answer_needs_text() {
        assert!(parse_repl_command("3").is_err());
        assert!(parse_repl_command("0 something").is_err());
        assert!(parse_repl_command("answer").is_err());
    }

    #[test]
    fn test_evidence_with_supports() {
        let cmd = parse_repl_command("evidence 1 supports=protected_activity,causation Email to HR").unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Evidence {
                claim: ClaimRef::Index(1),
                supports: vec!["protected_activity".to_string(), "causation".to_string()],
                description: "Email to HR".to_string(),
            }
        );
    }

    #[test]
    fn test_evidence_without_supports() {
        let cmd = parse_repl_command("ev claim_01 Termination letter").unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Evidence {
                claim: ClaimRef::Id("claim_01".to_string()),
                supports: Vec::new(),
                description: "Termination letter".to_string(),
            }
        );
        assert!(parse_repl_command("evidence 1 supports=a").is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_repl_command("exit").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_repl_command("next").unwrap(), ReplCommand::Advance);
        assert_eq!(
            parse_repl_command("save out").unwrap(),
            ReplCommand::Save(Some(PathBuf::from("out")))
        );
        assert!(parse_repl_command("connect").is_err());
    }

    #[test]
    fn test_answer_and_save_through_session() {
        let mut session = Orchestrator::new("case-r", PipelineConfig::default()).unwrap();
        session
            .start("Employee fired after complaining about unequal pay")
            .unwrap();
        let formatter = Formatter::new(crate::config::OutputFormat::Quiet, false);
        let dir = TempDir::new().unwrap();

        let cmd = parse_repl_command("1 I told Acme Corp in writing on 2023-03-15.").unwrap();
        execute_repl_command(cmd, &mut session, &formatter, dir.path()).unwrap();
        assert_eq!(session.conversation().len(), 1);

        let missing = parse_repl_command("99 anything at all here").unwrap();
        assert!(execute_repl_command(missing, &mut session, &formatter, dir.path()).is_err());

        execute_repl_command(ReplCommand::Save(None), &mut session, &formatter, dir.path()).unwrap();
        assert!(dir.path().join("knowledge_graph.json").exists());
        assert!(dir.path().join("legal_graph.json").exists());
    }
}
