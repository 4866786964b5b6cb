//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.voyage-dash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".voyage-dash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Passenger dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Annotation storage settings.
    #[serde(default)]
    pub annotations: AnnotationsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the passenger rows come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the passenger rows: a `.csv` file or a JSON array.
    #[serde(default = "default_source")]
    pub source: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
        }
    }
}

fn default_source() -> PathBuf {
    PathBuf::from("TitanicDataset.csv")
}

/// Durable annotation storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationsConfig {
    /// Directory holding the annotation snapshot.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".voyage-dash")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format: `markdown` or `json`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Output file. Empty means standard output.
    #[serde(default)]
    pub output: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output: String::new(),
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.store_dir {
            self.annotations.store_dir = dir.clone();
        }

        if let crate::cli::Command::Stats(ref stats) = args.command {
            if let Some(ref source) = stats.source {
                self.dataset.source = source.clone();
            }
            if let Some(format) = stats.format {
                self.report.format = format.as_str().to_string();
            }
            if let Some(ref output) = stats.output {
                self.report.output = output.display().to_string();
            }
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Output file for reports, if one is configured.
    pub fn report_output(&self) -> Option<PathBuf> {
        if self.report.output.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.report.output))
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
