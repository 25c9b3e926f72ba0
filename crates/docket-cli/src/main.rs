//! Docket CLI - interview a complainant and draft a legal complaint.

use clap::Parser;
use docket_cli::commands;
use docket_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> docket_cli::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        None => {
            commands::execute_interview(Default::default(), &config, &formatter)?;
        }
        Some(Command::Interview(args)) => {
            commands::execute_interview(args, &config, &formatter)?;
        }
        Some(Command::Rules(args)) => {
            commands::execute_rules(args, &formatter)?;
        }
        Some(Command::Config(args)) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing() {
    let filter = std::env::var("DOCKET_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
