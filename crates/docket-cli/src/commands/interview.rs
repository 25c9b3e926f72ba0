//! Interview command implementation.

use crate::cli::InterviewArgs;
use crate::config::{BackendKind, Config};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::repl;
use docket_llm::OllamaBackend;
use docket_pipeline::{Orchestrator, PipelineConfig};
use docket_store::SqliteEvidenceStore;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Start a session from the narrative and hand it to the interview loop.
pub fn execute_interview(args: InterviewArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let narrative = read_narrative(&args, formatter)?;
    let mut session = build_session(&args, config)?;

    let questions = session.start(&narrative)?;
    info!(
        case_id = %session.case_id(),
        claims = session.graphs().dependency.claims().count(),
        "Session started"
    );

    println!("{}", formatter.success(&format!("Case {} opened", session.case_id())));
    println!("{}", formatter.format_status(&session.status())?);
    println!();
    println!("{}", formatter.format_questions(&questions)?);

    let save_dir = args
        .save_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(session.case_id()));
    repl::run_interview(&mut session, config, formatter, &save_dir)
}

/// Build the orchestrator the arguments and configuration describe.
pub fn build_session(args: &InterviewArgs, config: &Config) -> Result<Orchestrator> {
    let pipeline: PipelineConfig = match args.preset {
        Some(preset) => preset.into(),
        None => config.pipeline.clone(),
    };
    let case_id = args
        .case_id
        .clone()
        .unwrap_or_else(|| docket_domain::new_id("case"));

    let mut session = Orchestrator::new(case_id, pipeline)?;

    let backend = args.backend.map(Into::into).unwrap_or(config.backend.kind);
    if backend == BackendKind::Ollama {
        let ollama = OllamaBackend::new(&config.backend.endpoint, &config.backend.model)
            .with_timeout(Duration::from_secs(config.backend.timeout_secs));
        info!(endpoint = %ollama.endpoint(), model = %ollama.model(), "Using Ollama backend");
        session = session.with_backend(ollama);
    }

    if let Some(path) = &args.evidence_db {
        session = session.with_evidence_store(SqliteEvidenceStore::new(path)?);
    }

    Ok(session)
}

fn read_narrative(args: &InterviewArgs, formatter: &Formatter) -> Result<String> {
    let narrative = if let Some(text) = &args.narrative {
        text.clone()
    } else if let Some(path) = &args.file {
        std::fs::read_to_string(path)?
    } else {
        eprintln!("{}", formatter.info("Describe what happened, then press Ctrl-D"));
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let narrative = narrative.trim().to_string();
    if narrative.is_empty() {
        return Err(CliError::InvalidInput("The narrative is empty".to_string()));
    }
    Ok(narrative)
}
