// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Full benchmark sessions.
//!
//! A session runs every workload in order on the calling thread, validates
//! each output, persists one record under a unique label and compares it with
//! the store history. Validation failures are carried in the outcome; only
//! store errors abort the session.

use crate::compare::{compare_latest, Comparison};
use crate::config::BenchConfig;
use crate::error::Result;
use crate::identity::{normalize_label, resolve_unique};
use crate::probe::{detect_environment, SystemProbe};
use crate::record::ResultRecord;
use crate::stats::{run_workload, TrialStatistics};
use crate::store::ResultStore;
use crate::validate::{validate, Validation};
use crate::workload::{standard_workloads, Workload, WorkloadKind};
use std::collections::BTreeMap;
use tracing::{info, info_span};

/// Progress notifications for a running session.
pub trait SessionObserver {
    /// A workload is about to warm up and run.
    fn workload_started(&mut self, _kind: WorkloadKind) {}

    /// A workload finished and its output was validated.
    fn workload_finished(&mut self, _stats: &TrialStatistics, _validation: &Validation) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Label as requested, after trimming.
    pub requested_label: String,
    /// The persisted record; its label may carry a uniqueness suffix.
    pub record: ResultRecord,
    /// One validation per workload, in session order.
    pub validations: Vec<Validation>,
    /// Comparison with the preceding run.
    pub comparison: Comparison,
}

impl SessionOutcome {
    /// Validations that did not pass.
    pub fn failed_validations(&self) -> impl Iterator<Item = &Validation> {
        self.validations.iter().filter(|v| !v.ok)
    }

    /// Whether the requested label was already taken.
    pub fn label_was_renamed(&self) -> bool {
        self.record.system_label != self.requested_label
    }
}

/// Runs workloads and records the result.
pub struct Session {
    config: BenchConfig,
    store: ResultStore,
    probe: Box<dyn SystemProbe>,
    workloads: Vec<Box<dyn Workload>>,
}

impl Session {
    /// Session over the standard workloads, sized from `config`.
    pub fn new(config: BenchConfig, store: ResultStore, probe: Box<dyn SystemProbe>) -> Self {
        let workloads = standard_workloads(&config);
        Self {
            config,
            store,
            probe,
            workloads,
        }
    }

    /// Replace the workloads run by this session.
    pub fn with_workloads(mut self, workloads: Vec<Box<dyn Workload>>) -> Self {
        self.workloads = workloads;
        self
    }

    /// The store this session appends to.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Run a session labelled `label`.
    pub fn run(&mut self, label: &str) -> Result<SessionOutcome> {
        self.run_observed(label, &mut NoopObserver)
    }

    /// Run a session, reporting progress to `observer`.
    pub fn run_observed(&mut self, label: &str, observer: &mut dyn SessionObserver) -> Result<SessionOutcome> {
        let requested_label = normalize_label(label)?;
        let span = info_span!("session", label = %requested_label);
        let _guard = span.enter();

        let environment = detect_environment(self.probe.as_ref());
        info!(
            cores = ?environment.cpu_cores,
            freq_mhz = ?environment.cpu_freq_mhz,
            trials = self.config.trials,
            "Starting benchmark session"
        );

        let mut stats = BTreeMap::new();
        let mut validations = Vec::with_capacity(self.workloads.len());
        for workload in &mut self.workloads {
            let kind = workload.kind();
            observer.workload_started(kind);

            let result = run_workload(workload.as_mut(), self.config.trials);
            let validation = validate(kind, result.result.as_ref(), &self.config);
            observer.workload_finished(&result, &validation);

            validations.push(validation);
            stats.insert(kind, result);
        }

        let existing = self.store.labels()?;
        let unique_label = resolve_unique(&requested_label, &existing);
        if unique_label != requested_label {
            info!(requested = %requested_label, assigned = %unique_label, "Label already taken");
        }

        let record = ResultRecord::new(unique_label, environment, stats);
        self.store.append(&record)?;

        // The appended record is the last one loaded.
        let history = self.store.load_all()?;
        let comparison = compare_latest(&history);

        Ok(SessionOutcome {
            requested_label,
            record,
            validations,
            comparison,
        })
    }
}
