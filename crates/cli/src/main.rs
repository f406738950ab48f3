//! CapForge CLI — the main entry point.
//!
//! Commands:
//! - `export`  — Assemble a target and write its worker source
//! - `check`   — Start a worker, report the crash-window verdict, stop it
//! - `run`     — Run a worker until Ctrl-C
//! - `status`  — Show exported targets
//! - `list`    — List a worker's capabilities of one kind
//! - `invoke`  — Call one of a worker's tools
//! - `read`    — Read one of a worker's resources
//! - `prompt`  — Render one of a worker's prompts

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod project;

#[derive(Parser)]
#[command(
    name = "capforge",
    about = "CapForge — compose capability fragments into MCP worker programs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a build target and write its worker source to the workers dir
    Export {
        /// Project file describing fragments and targets
        #[arg(short, long)]
        project: PathBuf,

        /// Build target id
        target: String,
    },

    /// Start a worker, report whether it survived the crash window, stop it
    Check {
        #[arg(short, long)]
        project: PathBuf,

        target: String,
    },

    /// Run a worker in the foreground until Ctrl-C
    Run {
        #[arg(short, long)]
        project: PathBuf,

        target: String,
    },

    /// Show exported targets under the workers directory
    Status,

    /// List capabilities of one kind exposed by an exported worker
    List {
        target: String,

        /// Capability kind: tool, resource, or prompt
        #[arg(short, long, default_value = "tool")]
        kind: String,
    },

    /// Invoke a tool on an exported worker
    Invoke {
        target: String,

        /// Tool name
        name: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Read a resource from an exported worker
    Read {
        target: String,

        /// Resource URI
        uri: String,
    },

    /// Render a prompt from an exported worker
    Prompt {
        target: String,

        /// Prompt name
        name: String,

        /// Prompt arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Export { project, target } => commands::export::run(project, target).await?,
        Commands::Check { project, target } => commands::check::run(project, target).await?,
        Commands::Run { project, target } => commands::run_cmd::run(project, target).await?,
        Commands::Status => commands::status::run().await?,
        Commands::List { target, kind } => commands::capability::list(target, kind).await?,
        Commands::Invoke { target, name, args } => {
            commands::capability::invoke(target, name, args).await?
        }
        Commands::Read { target, uri } => commands::capability::read(target, uri).await?,
        Commands::Prompt { target, name, args } => {
            commands::capability::prompt(target, name, args).await?
        }
    }

    Ok(())
}
