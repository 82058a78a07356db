//! Spinner feedback while a session runs.

use cpubench_benchmarks::{SessionObserver, TrialStatistics, Validation, WorkloadKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows one spinner per workload.
#[derive(Default)]
pub struct SpinnerObserver {
    current: Option<ProgressBar>,
}

impl SpinnerObserver {
    /// Create an observer with no active spinner.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionObserver for SpinnerObserver {
    fn workload_started(&mut self, kind: WorkloadKind) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("Running {}...", kind.title()));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current = Some(pb);
    }

    fn workload_finished(&mut self, stats: &TrialStatistics, validation: &Validation) {
        if let Some(pb) = self.current.take() {
            let mark = if validation.ok { "✓" } else { "!" };
            pb.finish_with_message(format!(
                "{mark} {} median {:.4}s over {} trial(s)",
                validation.kind.title(),
                stats.median,
                stats.trials
            ));
        }
    }
}
