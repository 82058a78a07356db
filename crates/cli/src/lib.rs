//! CLI for cpubench.
//!
//! This crate provides the `cpubench` command: running benchmark sessions,
//! browsing and comparing recorded runs, pruning them, and an interactive
//! menu over the same commands.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod display;
pub mod menu;
pub mod progress;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpubench_benchmarks::BenchConfig;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cpubench CLI.
#[derive(Parser, Debug)]
#[command(name = "cpubench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./cpubench.toml when present).
    #[arg(short, long, global = true, env = "CPUBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Result store path, overriding the configuration.
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every workload and append the results to the store.
    Run {
        /// Label naming this system or session.
        #[arg(short, long)]
        label: String,

        /// Timed trials per workload.
        #[arg(short, long)]
        trials: Option<usize>,

        /// Run even when the system load exceeds `max_load`.
        #[arg(long)]
        force: bool,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every recorded run.
    History {
        /// Print raw JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Show all runs with a label.
    Show {
        /// Label to show.
        label: String,
    },

    /// Compare a run with the one recorded before it.
    Compare {
        /// Compare the latest run with this label instead of the latest run.
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Delete every run with a label.
    Delete {
        /// Label to delete.
        label: String,
    },

    /// Generate a markdown report of the history.
    Report {
        /// Write the report here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include per-run statistics.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the effective configuration.
    Config,

    /// Interactive menu.
    Menu,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = BenchConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(store) = cli.store {
        config = config.with_store_path(store);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Run {
            label,
            trials,
            force,
            json,
        } => {
            if let Some(trials) = trials {
                config = config.with_trials(trials);
                config.validate()?;
            }
            commands::run_session(&config, &label, force, json, &mut out)
        }
        Commands::History { json } => commands::history(&config, json, &mut out),
        Commands::Show { label } => commands::show(&config, &label, &mut out),
        Commands::Compare { label } => commands::compare_runs(&config, label.as_deref(), &mut out),
        Commands::Delete { label } => commands::delete(&config, &label, &mut out),
        Commands::Report { output, detailed } => {
            commands::report(&config, output.as_deref(), detailed, &mut out)
        }
        Commands::Config => commands::show_config(&config, &mut out),
        Commands::Menu => {
            let stdin = io::stdin();
            menu::run_menu(&config, &mut stdin.lock(), &mut out)
        }
    }
}
