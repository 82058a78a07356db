// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Statistical CPU benchmarking with a persistent result history.
//!
//! This crate runs a fixed battery of synthetic workloads (prime counting,
//! Monte-Carlo pi, chained SHA-256 and a memory scan), summarizes repeated
//! trials, validates each workload's output, and keeps every session in an
//! append-only JSON Lines store that can be browsed, compared and pruned.
//!
//! # Quick Start
//!
//! ```no_run
//! use cpubench_benchmarks::{BenchConfig, HostProbe, ResultStore, Session};
//!
//! let config = BenchConfig::load()?;
//! let store = ResultStore::new(&config.store_path);
//! let mut session = Session::new(config, store, Box::new(HostProbe));
//!
//! let outcome = session.run("workstation")?;
//! for validation in outcome.failed_validations() {
//!     eprintln!("{}: {}", validation.kind, validation.message);
//! }
//! # Ok::<(), cpubench_benchmarks::BenchError>(())
//! ```
//!
//! # Modules
//!
//! - [`workload`] - The pluggable timed workloads
//! - [`stats`] - Trial statistics and the workload runner
//! - [`validate`] - Output correctness checks
//! - [`record`] - The persisted `ResultRecord` and its on-disk shapes
//! - [`store`] - The append-only result store
//! - [`identity`] - Unique label assignment
//! - [`compare`] - Run-over-run comparison
//! - [`session`] - Full session orchestration
//! - [`probe`] - Host frequency and load probes
//! - [`markdown`] - Markdown report generation
//! - [`config`] - Layered configuration

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod config;
pub mod error;
pub mod identity;
pub mod markdown;
pub mod probe;
pub mod record;
pub mod session;
pub mod stats;
pub mod store;
pub mod validate;
pub mod workload;

pub use compare::{compare, compare_at, compare_latest, Comparison, ComparisonReport};
pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use identity::{normalize_label, resolve_unique};
pub use probe::{HostProbe, SystemProbe};
pub use record::{RecordShape, ResultRecord};
pub use session::{Session, SessionObserver, SessionOutcome};
pub use stats::{run_trials, TrialStatistics};
pub use store::ResultStore;
pub use validate::{validate, Validation};
pub use workload::{Workload, WorkloadKind, WorkloadOutput};

/// Write a markdown report of every record in `store` to `path`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the report written.
pub fn write_report(store: &ResultStore, path: impl AsRef<std::path::Path>, detailed: bool) -> Result<usize> {
    let records = store.load_all()?;
    let report = if detailed {
        markdown::generate_detailed_report(&records)
    } else {
        markdown::generate_summary(&records)
    };
    if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report)?;
    Ok(records.len())
}
