//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Voyage Dash - passenger manifest dashboard data layer
///
/// Derive chart-ready survival statistics from the passenger manifest and
/// keep per-dashboard notes between sessions.
///
/// Examples:
///   voyage-dash stats --source fixtures/passengers.json
///   voyage-dash stats --format json --output charts.json
///   voyage-dash note add overview "Third class numbers look low"
///   voyage-dash note list overview
///   voyage-dash init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .voyage-dash.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for persisted annotations
    #[arg(long, value_name = "DIR", global = true, env = "VOYAGE_DASH_STORE")]
    pub store_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load the passenger dataset and print every derived chart
    Stats(StatsArgs),

    /// Manage dashboard annotations
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Generate a default .voyage-dash.toml configuration file
    InitConfig,
}

/// Options for the `stats` command.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Passenger rows: a `.csv` file with a header line, or a JSON array
    #[arg(short, long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to this file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Annotation commands.
#[derive(Subcommand, Debug, Clone)]
pub enum NoteAction {
    /// Set the pending (unsubmitted) text for a dashboard
    Draft { dashboard: String, text: String },

    /// Commit the dashboard's pending text as a new note
    ///
    /// If TEXT is given it replaces the pending text first.
    Add {
        dashboard: String,
        text: Option<String>,
    },

    /// List notes, optionally for one dashboard
    List { dashboard: Option<String> },

    /// Count notes, optionally for one dashboard
    Count { dashboard: Option<String> },

    /// Enter or leave edit mode for a note
    Toggle { id: String },

    /// Change the unsaved text of a note in edit mode
    Revise { id: String, text: String },

    /// Commit the unsaved text of a note
    Save { id: String },

    /// Delete a note
    Delete { id: String },

    /// Delete every note on every dashboard
    Clear,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a format name from the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref config) = self.config {
            if !config.exists() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        if let Some(ref dir) = self.store_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Store path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        if let Command::Note { ref action } = self.command {
            let dashboard = match action {
                NoteAction::Draft { dashboard, .. } | NoteAction::Add { dashboard, .. } => {
                    Some(dashboard)
                }
                _ => None,
            };
            if dashboard.is_some_and(|d| d.trim().is_empty()) {
                return Err("Dashboard id must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            config: None,
            store_dir: None,
            verbose: false,
            quiet: false,
            command,
        }
    }

    #[test]
    fn test_parse_stats() {
        let args = Args::try_parse_from([
            "voyage-dash",
            "stats",
            "--source",
            "rows.json",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Command::Stats(stats) => {
                assert_eq!(stats.source, Some(PathBuf::from("rows.json")));
                assert_eq!(stats.format, Some(OutputFormat::Json));
                assert!(stats.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_note_add_with_global_flag() {
        let args =
            Args::try_parse_from(["voyage-dash", "note", "add", "overview", "hello", "-v"]).unwrap();

        assert!(args.verbose);
        match args.command {
            Command::Note {
                action: NoteAction::Add { dashboard, text },
            } => {
                assert_eq!(dashboard, "overview");
                assert_eq!(text.as_deref(), Some("hello"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_blank_dashboard() {
        let args = make_args(Command::Note {
            action: NoteAction::Draft {
                dashboard: "  ".to_string(),
                text: "x".to_string(),
            },
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_name("pdf"), None);
        assert_eq!(OutputFormat::Json.as_str(), "json");
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
