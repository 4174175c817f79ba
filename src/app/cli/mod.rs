//! CLI Adapter.

mod admin;
mod query;
mod refresh;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::app::AppContext;
use crate::app::config::{load_settings, open_context};
use crate::domain::{AppError, RemoteSource};

#[derive(Parser)]
#[command(name = "yamlprops")]
#[command(version)]
#[command(about = "Shared YAML configuration registry with remote refresh", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = "YAMLPROPS_SETTINGS")]
    settings: Option<PathBuf>,
    /// Override the registry state file from settings
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the registry with the configs in a batch file
    Apply {
        /// Batch file (YAML)
        file: PathBuf,
    },
    /// Check a batch file without applying it
    Validate {
        /// Batch file (YAML)
        file: PathBuf,
    },
    /// Print a config's mapping (the default config when no name is given)
    Get {
        /// Config name
        name: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },
    /// List config names
    #[clap(visible_alias = "ls")]
    Names {
        /// Only names in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories
    Categories,
    /// Refresh remote configs now
    Refresh {
        /// Refresh only this config
        name: Option<String>,
    },
    /// Fetch a remote file once and check that it is a YAML mapping
    Check {
        /// Repository owner
        owner: String,
        /// Repository name
        repository: String,
        /// Path within the repository
        path: String,
        /// Branch, tag, or commit (default branch when omitted)
        #[arg(short, long, default_value = "")]
        r#ref: String,
        /// Credential id from settings
        #[arg(short, long)]
        credential: String,
    },
    /// Set the refresh interval in minutes (0 or less disables scheduled refresh)
    Interval {
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Run the refresh scheduler until interrupted
    Watch {
        /// Refresh once immediately on start
        #[arg(long)]
        now: bool,
    },
}

/// Output encoding for structured results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Json,
    Yaml,
}

/// Entry point for the CLI.
pub fn run() {
    let Cli { settings, state, command } = Cli::parse();

    let result: Result<i32, AppError> = match command {
        // Validation touches neither settings nor state.
        Commands::Validate { file } => admin::run_validate(&file).map(|_| 0),
        command => context(settings, state).and_then(|ctx| dispatch(&ctx, command)),
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn context(settings: Option<PathBuf>, state: Option<PathBuf>) -> Result<AppContext, AppError> {
    let settings = load_settings(settings.as_deref())?;
    open_context(&settings, state.as_deref())
}

fn dispatch(ctx: &AppContext, command: Commands) -> Result<i32, AppError> {
    match command {
        Commands::Apply { file } => admin::run_apply(ctx, &file).map(|_| 0),
        Commands::Validate { file } => admin::run_validate(&file).map(|_| 0),
        Commands::Get { name, format } => query::run_get(ctx, name.as_deref(), format).map(|_| 0),
        Commands::Names { category } => query::run_names(ctx, category.as_deref()).map(|_| 0),
        Commands::Categories => query::run_categories(ctx).map(|_| 0),
        Commands::Refresh { name } => refresh::run_refresh(ctx, name.as_deref()),
        Commands::Check { owner, repository, path, r#ref, credential } => {
            refresh::run_check(ctx, RemoteSource::new(owner, repository, r#ref, path, credential))
        }
        Commands::Interval { minutes } => admin::run_interval(ctx, minutes).map(|_| 0),
        Commands::Watch { now } => refresh::run_watch(ctx, now).map(|_| 0),
    }
}
