//! Command implementations shared by the subcommands and the interactive menu.

use crate::display;
use crate::progress::SpinnerObserver;
use anyhow::{bail, Context, Result};
use cpubench_benchmarks::probe::{check_load, LoadCheck};
use cpubench_benchmarks::compare::compare_at;
use cpubench_benchmarks::{markdown, normalize_label, BenchConfig, HostProbe, ResultStore, Session};
use std::io::Write;
use std::path::Path;
use tracing::warn;

fn store(config: &BenchConfig) -> ResultStore {
    ResultStore::new(&config.store_path)
}

/// Run a full benchmark session and print its outcome.
pub fn run_session(config: &BenchConfig, label: &str, force: bool, json: bool, out: &mut dyn Write) -> Result<()> {
    let label = normalize_label(label).context("A non-empty label is required")?;

    match check_load(&HostProbe, config.max_load) {
        LoadCheck::TooHigh { load, max } if !force => {
            bail!("System load {load:.2} exceeds the configured maximum {max:.2}; use --force to run anyway")
        }
        LoadCheck::TooHigh { load, max } => {
            warn!(load, max, "System load is high, results may be skewed");
        }
        LoadCheck::Unknown => warn!("Could not read system load"),
        LoadCheck::Ok => {}
    }

    let mut session = Session::new(config.clone(), store(config), Box::new(HostProbe));
    let mut observer = SpinnerObserver::new();
    let outcome = session
        .run_observed(&label, &mut observer)
        .context("Benchmark session failed")?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&outcome.record)?)?;
    } else {
        write!(out, "{}", display::outcome(&outcome))?;
    }
    Ok(())
}

/// Print every stored run.
pub fn history(config: &BenchConfig, json: bool, out: &mut dyn Write) -> Result<()> {
    let records = store(config).load_all().context("Failed to read result store")?;
    if json {
        for record in &records {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        }
    } else {
        write!(out, "{}", display::history(&records))?;
    }
    Ok(())
}

/// Print the details of every run labelled `label`.
pub fn show(config: &BenchConfig, label: &str, out: &mut dyn Write) -> Result<()> {
    let records = store(config)
        .find_by_label(label)
        .context("Failed to read result store")?;
    if records.is_empty() {
        writeln!(out, "No results labelled '{label}'.")?;
    }
    for record in &records {
        write!(out, "{}", display::record(record))?;
    }
    Ok(())
}

/// Compare the latest run labelled `label` (or the latest run overall) with
/// the run before it.
pub fn compare_runs(config: &BenchConfig, label: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let history = store(config).load_all().context("Failed to read result store")?;
    let index = match label {
        Some(label) => history.iter().rposition(|r| r.system_label == label),
        None => history.len().checked_sub(1),
    };
    let Some(index) = index else {
        match label {
            Some(label) => writeln!(out, "No results labelled '{label}'.")?,
            None => writeln!(out, "No benchmark results recorded yet.")?,
        }
        return Ok(());
    };

    let current = &history[index];
    writeln!(out, "Run {} ({})", current.system_label, current.timestamp_display())?;
    write!(out, "{}", display::comparison(&compare_at(&history, index)))?;
    Ok(())
}

/// Delete every run labelled `label`.
pub fn delete(config: &BenchConfig, label: &str, out: &mut dyn Write) -> Result<()> {
    let removed = store(config)
        .delete_by_label(label)
        .context("Failed to rewrite result store")?;
    if removed == 0 {
        writeln!(out, "Nothing deleted: no results labelled '{label}'.")?;
    } else {
        writeln!(out, "Deleted {removed} result(s) labelled '{label}'.")?;
    }
    Ok(())
}

/// Write a markdown report, or print it when no path is given.
pub fn report(config: &BenchConfig, output: Option<&Path>, detailed: bool, out: &mut dyn Write) -> Result<()> {
    let store = store(config);
    match output {
        Some(path) => {
            let count = cpubench_benchmarks::write_report(&store, path, detailed)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            writeln!(out, "Report of {count} run(s) written to {}", path.display())?;
        }
        None => {
            let records = store.load_all().context("Failed to read result store")?;
            let text = if detailed {
                markdown::generate_detailed_report(&records)
            } else {
                markdown::generate_summary(&records)
            };
            write!(out, "{text}")?;
        }
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn show_config(config: &BenchConfig, out: &mut dyn Write) -> Result<()> {
    let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
    write!(out, "{text}")?;
    Ok(())
}
