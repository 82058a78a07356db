// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trial statistics and the workload runner.

use crate::workload::{Workload, WorkloadOutput};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Timing summary of one workload over repeated trials, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialStatistics {
    /// Median duration.
    pub median: f64,
    /// Fastest trial.
    pub min: f64,
    /// Slowest trial.
    pub max: f64,
    /// Sample standard deviation (0 for a single trial).
    pub stddev: f64,
    /// Number of timed trials.
    pub trials: usize,
    /// Output of the last trial. Absent only on records stored without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkloadOutput>,
}

impl TrialStatistics {
    /// Summarize `samples` (seconds).
    ///
    /// An empty slice yields all-zero statistics with `trials == 0`.
    pub fn from_samples(samples: &[f64], result: Option<WorkloadOutput>) -> Self {
        if samples.is_empty() {
            return Self {
                result,
                ..Self::default()
            };
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        let stddev = if n > 1 {
            let mean = sorted.iter().sum::<f64>() / n as f64;
            let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            median,
            min: sorted[0],
            max: sorted[n - 1],
            stddev,
            trials: n,
            result,
        }
    }

    /// Relative spread of the trials as a percentage of the median.
    pub fn relative_stddev_pct(&self) -> f64 {
        if self.median > 0.0 {
            self.stddev / self.median * 100.0
        } else {
            0.0
        }
    }
}

/// Run `warmup` once, then `trial` exactly `trials` times, sequentially.
///
/// `trials` of zero is treated as one. Only the timed trials contribute to the
/// statistics; the representative result is the last trial's output.
pub fn run_trials<W, F>(trials: usize, warmup: W, mut trial: F) -> TrialStatistics
where
    W: FnOnce(),
    F: FnMut() -> (Duration, WorkloadOutput),
{
    let trials = trials.max(1);
    warmup();

    let mut samples = Vec::with_capacity(trials);
    let mut last = None;
    for i in 0..trials {
        let (elapsed, output) = trial();
        debug!(trial = i + 1, seconds = elapsed.as_secs_f64(), "Trial finished");
        samples.push(elapsed.as_secs_f64());
        last = Some(output);
    }

    TrialStatistics::from_samples(&samples, last)
}

/// Run a [`Workload`] through [`run_trials`].
pub fn run_workload(workload: &mut dyn Workload, trials: usize) -> TrialStatistics {
    let kind = workload.kind();
    // Warmup and trials both need the workload mutably, one after the other.
    workload.warmup();
    let stats = run_trials(trials, || {}, || workload.run());
    info!(
        workload = %kind,
        median = stats.median,
        stddev = stats.stddev,
        trials = stats.trials,
        "Workload finished"
    );
    stats
}
