//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Docket - turn a complaint narrative into a draft legal complaint.
#[derive(Debug, Parser)]
#[command(name = "docket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids and bare values only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an interactive interview for one case
    Interview(InterviewArgs),

    /// Show rules of procedure and claim elements
    Rules(RulesArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the interview command.
#[derive(Debug, Default, Parser)]
pub struct InterviewArgs {
    /// Narrative text (prompted for when neither this nor --file is given)
    pub narrative: Option<String>,

    /// Read the narrative from a file
    #[arg(long, conflicts_with = "narrative")]
    pub file: Option<PathBuf>,

    /// Case identifier (generated when omitted)
    #[arg(long)]
    pub case_id: Option<String>,

    /// Override the configured backend
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendArg>,

    /// SQLite database for evidence records
    #[arg(long)]
    pub evidence_db: Option<PathBuf>,

    /// Directory the `save` command writes graphs to
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Threshold preset replacing the configured pipeline settings
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,
}

/// Arguments for the rules command.
#[derive(Debug, Parser)]
pub struct RulesArgs {
    /// Jurisdiction for the rules of procedure
    #[arg(short, long, default_value = "federal")]
    pub jurisdiction: String,

    /// Also list the elements and authorities of these claim types
    #[arg(short = 't', long = "claim-type")]
    pub claim_types: Vec<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Threshold preset to start from
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,
    },

    /// Print the configuration file path
    Path,
}

/// Backend argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendArg {
    /// Keyword extraction only, no model
    None,
    /// Local Ollama server
    Ollama,
}

/// Pipeline preset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Defaults
    Default,
    /// Loose thresholds, short interviews
    Aggressive,
    /// Strict thresholds, long interviews
    Lenient,
}

impl From<PresetArg> for docket_pipeline::PipelineConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => docket_pipeline::PipelineConfig::default(),
            PresetArg::Aggressive => docket_pipeline::PipelineConfig::aggressive(),
            PresetArg::Lenient => docket_pipeline::PipelineConfig::lenient(),
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<BackendArg> for crate::config::BackendKind {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::None => crate::config::BackendKind::None,
            BackendArg::Ollama => crate::config::BackendKind::Ollama,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["docket"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_interview_command() {
        let cli = Cli::parse_from([
            "docket",
            "interview",
            "I was fired after I complained",
            "--case-id",
            "case-1",
            "--backend",
            "ollama",
        ]);
        match cli.command {
            Some(Command::Interview(args)) => {
                assert_eq!(args.narrative.as_deref(), Some("I was fired after I complained"));
                assert_eq!(args.case_id.as_deref(), Some("case-1"));
                assert_eq!(args.backend, Some(BackendArg::Ollama));
            }
            _ => panic!("Expected Interview command"),
        }
    }

    #[test]
    fn test_rules_command() {
        let cli = Cli::parse_from(["docket", "rules", "-t", "retaliation", "-t", "harassment"]);
        match cli.command {
            Some(Command::Rules(args)) => {
                assert_eq!(args.jurisdiction, "federal");
                assert_eq!(args.claim_types, vec!["retaliation", "harassment"]);
            }
            _ => panic!("Expected Rules command"),
        }
    }

    #[test]
    fn test_narrative_and_file_conflict() {
        let result = Cli::try_parse_from(["docket", "interview", "text", "--file", "narrative.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preset_conversion() {
        let config: docket_pipeline::PipelineConfig = PresetArg::Aggressive.into();
        assert_eq!(config, docket_pipeline::PipelineConfig::aggressive());
    }
}
