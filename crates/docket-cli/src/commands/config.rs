//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Show, create or locate the configuration file.
pub fn execute_config(args: ConfigArgs, config: &Config, path: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force, preset } => {
            let target = match path {
                Some(path) => path.to_path_buf(),
                None => Config::path()?,
            };
            if target.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                )));
            }

            let fresh = Config {
                pipeline: preset.map(Into::into).unwrap_or_default(),
                ..Config::default()
            };
            let written = fresh.save(Some(&target))?;
            println!("{}", formatter.success(&format!("Wrote {}", written.display())));
        }
        ConfigAction::Path => {
            let target = match path {
                Some(path) => path.to_path_buf(),
                None => Config::path()?,
            };
            println!("{}", target.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PresetArg;
    use crate::config::OutputFormat;
    use docket_pipeline::PipelineConfig;
    use tempfile::TempDir;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[test]
    fn test_init_writes_preset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let args = ConfigArgs {
            action: ConfigAction::Init {
                force: false,
                preset: Some(PresetArg::Lenient),
            },
        };

        execute_config(args, &Config::default(), Some(&path), &formatter()).unwrap();
        let written = Config::load(Some(&path)).unwrap();
        assert_eq!(written.pipeline, PipelineConfig::lenient());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save(Some(&path)).unwrap();

        let args = ConfigArgs {
            action: ConfigAction::Init {
                force: false,
                preset: None,
            },
        };
        let result = execute_config(args, &Config::default(), Some(&path), &formatter());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
