//! Binary entry point for fragmind.
//!
//! This binary provides the CLI interface for the fragment graph and
//! dialogue engine.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use fragmind::cli::{self, GraphOutputFormat};
use fragmind::config::FragmindConfig;
use fragmind::observability::{self, LoggingConfig};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Fragmind - knowledge fragment graph and contextual dialogue.
#[derive(Parser)]
#[command(name = "fragmind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "FRAGMIND_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the fragment graph and print it.
    Graph {
        /// JSON array of fragments ("-" for stdin); defaults to the data directory store.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format: summary or json.
        #[arg(short, long, default_value = "summary")]
        format: GraphOutputFormat,

        /// Seed for reproducible layout jitter.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print graph statistics.
    Stats {
        /// JSON array of fragments ("-" for stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the preamble and tags for selected fragments.
    Context {
        /// JSON array of fragments ("-" for stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fragment ids to include (comma-separated); all when omitted.
        #[arg(long)]
        ids: Option<String>,
    },

    /// Send one message with selected fragments as context.
    Chat {
        /// Message to send.
        #[arg(short, long)]
        message: String,

        /// JSON array of fragments ("-" for stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fragment ids to include (comma-separated); all when omitted.
        #[arg(long)]
        ids: Option<String>,

        /// Answer with canned replies instead of calling the endpoint.
        #[arg(long)]
        offline: bool,
    },

    /// Configuration management.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match FragmindConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose)
        .and_then(observability::init);
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    // The endpoint client blocks, so commands run on the blocking pool.
    let result = tokio::task::spawn_blocking(move || run_command(cli.command, &config)).await;

    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!("Error: command task failed: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &FragmindConfig) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Graph {
            input,
            format,
            seed,
        } => {
            let fragments = cli::load_fragments(input.as_deref(), config)?;
            let graph = cli::graph_builder(config, seed).build(&fragments);
            cli::write_graph(&mut out, &graph, format)?;
        },

        Commands::Stats { input } => {
            let fragments = cli::load_fragments(input.as_deref(), config)?;
            let graph = cli::graph_builder(config, None).build(&fragments);
            cli::write_stats(&mut out, &graph.stats())?;
        },

        Commands::Context { input, ids } => {
            let fragments = cli::load_fragments(input.as_deref(), config)?;
            let selected = cli::select_fragments(fragments, ids.as_deref())?;
            cli::write_context(&mut out, &cli::preview_context(&selected))?;
        },

        Commands::Chat {
            message,
            input,
            ids,
            offline,
        } => {
            let fragments = cli::load_fragments(input.as_deref(), config)?;
            let selected = cli::select_fragments(fragments, ids.as_deref())?;
            let endpoint = cli::build_endpoint(config, offline);
            let session = cli::run_chat(config, endpoint.as_ref(), &selected, &message)
                .context("sending message")?;
            cli::write_transcript(&mut out, &session)?;
        },

        Commands::Config { show } => {
            if show {
                cli::write_config(&mut out, config)?;
            } else {
                writeln!(out, "Use --show to display configuration")?;
            }
        },
    }

    out.flush()?;
    Ok(())
}
