//! itrack - Minimal file-backed issue tracker
//!
//! All issues live in a single JSON file.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "itrack")]
#[command(about = "Minimal file-backed issue tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Issues file (overrides the configured storage path)
    #[arg(long, global = true, env = "ITRACK_FILE")]
    file: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true, env = "ITRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new issue
    Create {
        /// Issue description
        #[arg(short, long)]
        description: String,

        /// Parent issue ID
        #[arg(long)]
        parent_id: Option<String>,
    },

    /// Update the status of an issue
    UpdateStatus {
        /// Issue ID
        #[arg(long)]
        id: String,

        /// New status (OPEN, IN_PROGRESS, CLOSED)
        #[arg(long)]
        status: String,
    },

    /// List issues with the given status
    List {
        /// Status to filter by (OPEN, IN_PROGRESS, CLOSED)
        #[arg(short, long)]
        status: String,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a default config file if none exists
    Init,
    /// Print the config file location
    Path,
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let config_path = cli.config.or_else(itrack_core::Config::default_path);
    let ctx = commands::Context::load(config_path, cli.file, cli.json)?;
    if !ctx.config.display.colors {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Create {
            description,
            parent_id,
        } => commands::create(&ctx, &description, parent_id.as_deref()),
        Commands::UpdateStatus { id, status } => commands::update_status(&ctx, &id, &status),
        Commands::List { status } => commands::list(&ctx, &status),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Init) => commands::config_init(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
        },
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let (message, code) = commands::render_error(&err);
            eprintln!("{} {}", "error:".red().bold(), message);
            ExitCode::from(code)
        }
    }
}
