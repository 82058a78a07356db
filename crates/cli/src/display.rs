//! Console formatting for records, sessions and comparisons.

use colored::Colorize;
use cpubench_benchmarks::compare::{consistency, ConsistencyClass, Direction};
use cpubench_benchmarks::{Comparison, RecordShape, ResultRecord, SessionOutcome, WorkloadKind};
use std::fmt::Write;

fn cell(value: Option<f64>) -> String {
    value.map(|s| format!("{s:>9.4}")).unwrap_or_else(|| format!("{:>9}", "-"))
}

/// One line per record, oldest first.
pub fn history(records: &[ResultRecord]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        writeln!(out, "No benchmark results recorded yet.").unwrap();
        return out;
    }

    writeln!(
        out,
        "{:<19}  {:<20}  {:<7}  {:>9}  {:>9}  {:>9}  {:>9}",
        "Timestamp", "Label", "Shape", "Primes", "Pi", "Hash", "Memory"
    ).unwrap();
    for record in records {
        writeln!(
            out,
            "{:<19}  {:<20}  {:<7}  {}  {}  {}  {}",
            record.timestamp_display(),
            record.system_label,
            record.shape.name(),
            cell(record.median(WorkloadKind::Primes)),
            cell(record.median(WorkloadKind::Pi)),
            cell(record.median(WorkloadKind::Hash)),
            cell(record.median(WorkloadKind::Memory)),
        ).unwrap();
    }
    writeln!(out, "{} run(s)", records.len()).unwrap();
    out
}

/// Full details of one record.
pub fn record(record: &ResultRecord) -> String {
    let mut out = String::new();
    writeln!(out, "{}", record.system_label.bold()).unwrap();
    writeln!(out, "  Timestamp: {}", record.timestamp_display()).unwrap();
    writeln!(out, "  Platform:  {} ({})", record.platform, record.architecture).unwrap();
    match record.environment.cpu_cores {
        Some(cores) => {
            writeln!(out, "  Cores:     {cores}").unwrap();
        }
        None => {
            writeln!(out, "  Cores:     unknown").unwrap();
        }
    }
    match record.environment.cpu_freq_mhz {
        Some(mhz) => {
            writeln!(out, "  Clock:     {mhz:.0} MHz").unwrap();
        }
        None => {
            writeln!(out, "  Clock:     unknown").unwrap();
        }
    }

    match &record.shape {
        RecordShape::Legacy(times) => {
            writeln!(out, "  (legacy record: single duration per workload)").unwrap();
            for (kind, time) in times {
                writeln!(out, "  {:<14} {time:.4}s", kind.title()).unwrap();
            }
        }
        RecordShape::Current(stats) => {
            for (kind, s) in stats {
                let result = s.result.as_ref().map(ToString::to_string).unwrap_or_default();
                writeln!(
                    out,
                    "  {:<14} median {:.4}s  min {:.4}s  max {:.4}s  ±{:.4}s  [{}]",
                    kind.title(),
                    s.median,
                    s.min,
                    s.max,
                    s.stddev,
                    result
                ).unwrap();
            }
            if let Some(c) = consistency(record) {
                writeln!(out, "  Variance:  {:.2}% ({})", c.variance_pct, styled_class(c.class)).unwrap();
            }
        }
    }
    out
}

fn styled_class(class: ConsistencyClass) -> colored::ColoredString {
    let text = class.to_string();
    match class {
        ConsistencyClass::Consistent => text.green(),
        ConsistencyClass::Acceptable => text.yellow(),
        ConsistencyClass::HighVariance => text.red(),
    }
}

/// Comparison against the previous run.
pub fn comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    let Some(report) = comparison.report() else {
        writeln!(out, "No prior run to compare.").unwrap();
        return out;
    };

    writeln!(out, "Compared with {}:", report.previous_label.bold()).unwrap();
    for delta in &report.deltas {
        let change = delta.to_string();
        let change = match delta.direction {
            Direction::Faster => change.green(),
            Direction::Slower => change.red(),
        };
        writeln!(
            out,
            "  {:<14} {:.4}s -> {:.4}s  {}",
            delta.kind.title(),
            delta.previous,
            delta.current,
            change
        ).unwrap();
    }
    if let Some(rank) = report.rank {
        writeln!(
            out,
            "  Primes rank: {} (faster than or equal to {:.0}% of runs)",
            rank,
            rank.percentile()
        ).unwrap();
    }
    if let Some(c) = report.consistency {
        writeln!(out, "  Consistency: {:.2}% ({})", c.variance_pct, styled_class(c.class)).unwrap();
    }
    out
}

/// Summary of a finished session.
pub fn outcome(outcome: &SessionOutcome) -> String {
    let mut out = String::new();
    if outcome.label_was_renamed() {
        writeln!(
            out,
            "Label '{}' already exists, saved as '{}'.",
            outcome.requested_label, outcome.record.system_label
        ).unwrap();
    }
    write!(out, "{}", record(&outcome.record)).unwrap();

    let failures: Vec<_> = outcome.failed_validations().collect();
    if failures.is_empty() {
        writeln!(out, "{}", "All workload outputs validated.".green()).unwrap();
    } else {
        for v in failures {
            writeln!(out, "{} {}: {}", "warning:".yellow().bold(), v.kind.title(), v.message).unwrap();
        }
    }
    write!(out, "{}", comparison(&outcome.comparison)).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpubench_benchmarks::record::Environment;
    use cpubench_benchmarks::TrialStatistics;
    use std::collections::BTreeMap;

    fn plain() {
        colored::control::set_override(false);
    }

    fn current(label: &str, primes: f64) -> ResultRecord {
        ResultRecord::new(
            label,
            Environment::default(),
            BTreeMap::from([(WorkloadKind::Primes, TrialStatistics::from_samples(&[primes], None))]),
        )
    }

    #[test]
    fn test_empty_history() {
        plain();
        assert!(history(&[]).contains("No benchmark results"));
    }

    #[test]
    fn test_history_rows() {
        plain();
        let text = history(&[current("alpha", 1.5), current("beta", 2.0)]);
        assert!(text.contains("alpha"));
        assert!(text.contains("   1.5000"));
        assert!(text.contains("2 run(s)"));
    }

    #[test]
    fn test_comparison_text() {
        plain();
        let records = vec![current("a", 10.0), current("b", 8.0)];
        let text = comparison(&cpubench_benchmarks::compare::compare_at(&records, 1));
        assert!(text.contains("Compared with a"));
        assert!(text.contains("20.0% faster"));
        assert!(text.contains("#1 of 2"));

        let none = comparison(&Comparison::NoPrior);
        assert_eq!(none.trim(), "No prior run to compare.");
    }

    #[test]
    fn test_legacy_record_details() {
        plain();
        let legacy = ResultRecord {
            timestamp: None,
            system_label: "old".into(),
            platform: "Linux".into(),
            architecture: "x86_64".into(),
            environment: Environment::default(),
            shape: RecordShape::Legacy(BTreeMap::from([(WorkloadKind::Hash, 3.25)])),
        };
        let text = record(&legacy);
        assert!(text.contains("legacy record"));
        assert!(text.contains("3.2500s"));
        assert!(text.contains("Cores:     unknown"));
    }
}
