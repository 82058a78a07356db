//! Interactive menu.
//!
//! Each input line is handed to [`dispatch`], which runs one command and
//! tells the driver loop whether to keep going.

use crate::commands;
use anyhow::Result;
use cpubench_benchmarks::BenchConfig;
use std::io::{BufRead, Write};

/// Whether the menu loop should read another line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Prompt again.
    Continue,
    /// Leave the menu.
    Stop,
}

const HELP: &str = "\
Commands:
  1 | run <label>        Run a benchmark session
  2 | history            List recorded runs
  3 | compare [label]    Compare a run with the one before it
  4 | show <label>       Show the runs with a label
  5 | delete <label>     Delete every run with a label
  6 | report             Print a markdown summary
  h | help               Show this help
  q | quit               Exit
";

/// Run one menu command.
///
/// Command failures are printed and the menu continues; only a broken output
/// stream is returned as an error.
pub fn dispatch(line: &str, config: &BenchConfig, out: &mut dyn Write) -> Result<Flow> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let result: Result<()> = match command {
        "" => Ok(()),
        "q" | "quit" | "exit" => return Ok(Flow::Stop),
        "h" | "help" | "?" => write!(out, "{HELP}").map_err(Into::into),
        "1" | "run" => {
            if arg.is_empty() {
                writeln!(out, "Usage: run <label>").map_err(Into::into)
            } else {
                commands::run_session(config, arg, false, false, out)
            }
        }
        "2" | "history" => commands::history(config, false, out),
        "3" | "compare" => commands::compare_runs(config, (!arg.is_empty()).then_some(arg), out),
        "4" | "show" => commands::show(config, arg, out),
        "5" | "delete" => {
            if arg.is_empty() {
                writeln!(out, "Usage: delete <label>").map_err(Into::into)
            } else {
                commands::delete(config, arg, out)
            }
        }
        "6" | "report" => commands::report(config, None, false, out),
        other => writeln!(out, "Unknown command '{other}'. Type 'help' for options.").map_err(Into::into),
    };

    if let Err(e) = result {
        writeln!(out, "Error: {e:#}")?;
    }
    Ok(Flow::Continue)
}

/// Prompt and dispatch until the user quits or input ends.
pub fn run_menu(config: &BenchConfig, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    write!(out, "{HELP}")?;
    loop {
        write!(out, "cpubench> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }
        if dispatch(&line, config, out)? == Flow::Stop {
            return Ok(());
        }
    }
}
