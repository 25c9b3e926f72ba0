//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use docket_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model backend
    #[serde(default)]
    pub backend: BackendSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Pipeline thresholds and component settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Which model backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Keyword extraction only
    None,
    /// Local Ollama server
    Ollama,
}

/// Backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Backend kind
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,

    /// Ollama endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Ollama model
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Interview history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the configuration file and interview history.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docket"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from `path` (or the default path), or defaults when
    /// no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.pipeline.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to `path` (or the default path).
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            settings: Settings::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_backend_kind() -> BackendKind {
    BackendKind::None
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}
