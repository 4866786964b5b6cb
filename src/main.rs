//! Voyage Dash - passenger manifest dashboard data layer
//!
//! A CLI driver around two independent stores: the dataset store, which
//! loads passenger rows once and derives chart-ready survival statistics,
//! and the annotation store, which keeps per-dashboard notes on disk.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, unreadable config, write failure)

mod analysis;
mod annotations;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;
mod source;
mod storage;

use annotations::AnnotationStore;
use anyhow::{Context, Result};
use cli::{Args, Command, NoteAction, OutputFormat};
use config::Config;
use dataset::DatasetStore;
use indicatif::{ProgressBar, ProgressStyle};
use models::Annotation;
use source::FileSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{FileStorage, MemoryStorage, Storage};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Config is read before logging so its verbose flag can raise the level.
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, config.general.verbose);

    info!("Voyage Dash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Command failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .voyage-dash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to choose the dataset source, note storage, and report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the parsed command.
async fn run(args: Args, mut config: Config) -> Result<()> {
    config.merge_with_args(&args);

    match args.command {
        Command::Stats(_) => run_stats(&config, args.quiet).await,
        Command::Note { action } => {
            run_note(&config, action);
            Ok(())
        }
        Command::InitConfig => handle_init_config(),
    }
}

/// Load the dataset once, wait for it, and emit the report.
async fn run_stats(config: &Config, quiet: bool) -> Result<()> {
    // Dataset snapshots only need to live as long as this session.
    let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let store = DatasetStore::new(session);

    let source_path = config.dataset.source.clone();
    info!("Loading passenger rows from {}", source_path.display());

    let spinner = (!quiet).then(|| loading_spinner(&source_path));
    let _load = store.load(FileSource::from_path(&source_path));
    let dataset = store.wait_ready().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    info!("Dataset ready with {} records", dataset.records.len());

    let report = report::StatsReport::from_store(&store, &source_path.display().to_string());

    let format = OutputFormat::from_name(&config.report.format).unwrap_or_else(|| {
        warn!(
            "Unknown report format '{}', falling back to markdown",
            config.report.format
        );
        OutputFormat::Markdown
    });

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.report_output() {
        Some(path) => {
            report::write_report(&output, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn loading_spinner(source: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Loading {}", source.display()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Apply one annotation command against durable storage.
fn run_note(config: &Config, action: NoteAction) {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.annotations.store_dir));
    let mut store = AnnotationStore::new(storage);

    match action {
        NoteAction::Draft { dashboard, text } => {
            store.set_draft_text(&dashboard, text);
            println!("📝 Draft saved for {}", dashboard);
        }
        NoteAction::Add { dashboard, text } => {
            let inline = text.is_some();
            match store.add_comment_with_text(&dashboard, text) {
                Some(id) => println!("✅ Added note {} to {}", id, dashboard),
                None if inline => println!("⚠️  Nothing to add: the note text is empty"),
                None => println!("⚠️  Nothing to add: the draft for {} is empty", dashboard),
            }
        }
        NoteAction::List { dashboard } => {
            let notes: Vec<&Annotation> = match dashboard {
                Some(ref d) => store.by_dashboard(d),
                None => store.all().iter().collect(),
            };
            print!("{}", report::generate_notes_listing(&notes));
        }
        NoteAction::Count { dashboard } => match dashboard {
            Some(ref d) => println!("{}", store.count_by_dashboard(d)),
            None => println!("{}", store.total_count()),
        },
        NoteAction::Toggle { id } => {
            if store.toggle_edit(&id) {
                let editing = store.get(&id).is_some_and(|n| n.is_editing);
                if editing {
                    println!("✏️  Editing note {}", id);
                } else {
                    println!("👁️  Stopped editing note {} (unsaved changes discarded)", id);
                }
            } else {
                println!("⚠️  No note with id {}", id);
            }
        }
        NoteAction::Revise { id, text } => {
            if store.set_edit_text(&id, text) {
                println!("📝 Draft updated for note {}", id);
            } else {
                println!("⚠️  Note {} is not being edited", id);
            }
        }
        NoteAction::Save { id } => {
            if store.save_edit(&id) {
                println!("✅ Saved note {}", id);
            } else {
                println!("⚠️  Nothing saved: note {} not found or its draft is empty", id);
            }
        }
        NoteAction::Delete { id } => {
            if store.delete_comment(&id) {
                println!("🗑️  Deleted note {}", id);
            } else {
                println!("⚠️  No note with id {}", id);
            }
        }
        NoteAction::Clear => {
            let removed = store.total_count();
            store.clear_all();
            println!("🗑️  Cleared {} notes", removed);
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before the subscriber is installed, so problems with the default
/// config file go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", config::CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
