// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run-over-run comparison.
//!
//! A run is compared with the record immediately before it in the store:
//! percent change of each workload median, the run's rank among every
//! recorded primes median, and how noisy its own trials were.

use crate::record::{RecordShape, ResultRecord};
use crate::workload::WorkloadKind;
use serde::Serialize;
use std::fmt;

/// Relative variance below this is consistent.
pub const CONSISTENT_BELOW_PCT: f64 = 5.0;

/// Relative variance above this is high.
pub const HIGH_VARIANCE_ABOVE_PCT: f64 = 10.0;

/// Whether a workload got faster or slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Median went down.
    Faster,
    /// Median went up or stayed the same.
    Slower,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Faster => "faster",
            Self::Slower => "slower",
        })
    }
}

/// Change of one workload relative to the previous run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadDelta {
    /// Workload compared.
    pub kind: WorkloadKind,
    /// Previous median, seconds.
    pub previous: f64,
    /// Current median, seconds.
    pub current: f64,
    /// `(current - previous) / previous * 100`; 0 when previous is 0.
    pub percent: f64,
    /// Classification of `percent`.
    pub direction: Direction,
}

impl WorkloadDelta {
    /// Compute the delta between two medians.
    pub fn new(kind: WorkloadKind, previous: f64, current: f64) -> Self {
        let percent = if previous != 0.0 {
            (current - previous) / previous * 100.0
        } else {
            0.0
        };
        // Exactly zero counts as slower.
        let direction = if percent < 0.0 {
            Direction::Faster
        } else {
            Direction::Slower
        };
        Self {
            kind,
            previous,
            current,
            percent,
            direction,
        }
    }
}

impl fmt::Display for WorkloadDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}% {}", self.percent.abs(), self.direction)
    }
}

/// 1-based position of a run among all recorded primes medians, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentileRank {
    /// Position, 1 = fastest.
    pub position: usize,
    /// Number of ranked runs.
    pub total: usize,
}

impl PercentileRank {
    /// Share of ranked runs at or slower than this one, as a percentage.
    pub fn percentile(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.position + 1) as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for PercentileRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} of {}", self.position, self.total)
    }
}

/// How noisy a run's trials were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyClass {
    /// Under 5% relative variance.
    Consistent,
    /// Between 5% and 10%.
    Acceptable,
    /// Over 10%.
    HighVariance,
}

impl fmt::Display for ConsistencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consistent => "consistent",
            Self::Acceptable => "acceptable",
            Self::HighVariance => "high variance",
        })
    }
}

/// Relative variance of a run's core workloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Consistency {
    /// `avg(stddev) / avg(median) * 100`.
    pub variance_pct: f64,
    /// Classification of `variance_pct`.
    pub class: ConsistencyClass,
}

/// Comparison of one run against the store history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Label of the run compared against.
    pub previous_label: String,
    /// Per-workload changes, in session order.
    pub deltas: Vec<WorkloadDelta>,
    /// Rank by primes median, when the run reports primes.
    pub rank: Option<PercentileRank>,
    /// Trial noise, for current-shape runs with all core workloads.
    pub consistency: Option<Consistency>,
}

impl ComparisonReport {
    /// Delta for `kind`, if both runs measured it.
    pub fn delta(&self, kind: WorkloadKind) -> Option<&WorkloadDelta> {
        self.deltas.iter().find(|d| d.kind == kind)
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    /// Nothing precedes the run.
    NoPrior,
    /// Comparison against the preceding run.
    Report(ComparisonReport),
}

impl Comparison {
    /// The report, if there was a prior run.
    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            Self::NoPrior => None,
            Self::Report(report) => Some(report),
        }
    }
}

/// Compare `current`, a run not yet in `history`, with the last record of
/// `history`.
///
/// `current` joins the rank population.
pub fn compare(history: &[ResultRecord], current: &ResultRecord) -> Comparison {
    let Some(previous) = history.last() else {
        return Comparison::NoPrior;
    };
    let rank = percentile_rank(history.iter().chain(std::iter::once(current)), current);
    report(previous, current, rank)
}

/// Compare `history[index]` with the record stored just before it.
///
/// The rank population is all of `history`. An index past the end has no
/// prior.
pub fn compare_at(history: &[ResultRecord], index: usize) -> Comparison {
    let Some(current) = history.get(index) else {
        return Comparison::NoPrior;
    };
    let Some(previous) = index.checked_sub(1).map(|i| &history[i]) else {
        return Comparison::NoPrior;
    };
    let rank = percentile_rank(history, current);
    report(previous, current, rank)
}

/// Compare the last record of `history` with the one before it.
pub fn compare_latest(history: &[ResultRecord]) -> Comparison {
    match history.len() {
        0 => Comparison::NoPrior,
        len => compare_at(history, len - 1),
    }
}

fn report(previous: &ResultRecord, current: &ResultRecord, rank: Option<PercentileRank>) -> Comparison {
    let deltas = WorkloadKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let prev = previous.median(kind)?;
            let cur = current.median(kind)?;
            Some(WorkloadDelta::new(kind, prev, cur))
        })
        .collect();

    Comparison::Report(ComparisonReport {
        previous_label: previous.system_label.clone(),
        deltas,
        rank,
        consistency: consistency(current),
    })
}

/// Rank of `current` by primes median among `population`.
///
/// Ties take the position of the first equal value.
pub fn percentile_rank<'a, I>(population: I, current: &ResultRecord) -> Option<PercentileRank>
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let target = current.median(WorkloadKind::Primes)?;
    let mut medians: Vec<f64> = population
        .into_iter()
        .filter_map(|r| r.median(WorkloadKind::Primes))
        .collect();
    medians.sort_by(f64::total_cmp);

    let index = medians.iter().position(|m| *m == target)?;
    Some(PercentileRank {
        position: index + 1,
        total: medians.len(),
    })
}

/// Relative variance of the primes, pi and hash workloads.
///
/// `None` for legacy records and runs missing a core workload.
pub fn consistency(record: &ResultRecord) -> Option<Consistency> {
    let RecordShape::Current(stats) = &record.shape else {
        return None;
    };

    let core = WorkloadKind::CORE
        .iter()
        .map(|kind| stats.get(kind))
        .collect::<Option<Vec<_>>>()?;

    let count = core.len() as f64;
    let avg_median = core.iter().map(|s| s.median).sum::<f64>() / count;
    let avg_stddev = core.iter().map(|s| s.stddev).sum::<f64>() / count;
    let variance_pct = if avg_median > 0.0 {
        avg_stddev / avg_median * 100.0
    } else {
        0.0
    };

    let class = if variance_pct < CONSISTENT_BELOW_PCT {
        ConsistencyClass::Consistent
    } else if variance_pct > HIGH_VARIANCE_ABOVE_PCT {
        ConsistencyClass::HighVariance
    } else {
        ConsistencyClass::Acceptable
    };

    Some(Consistency { variance_pct, class })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Environment;
    use crate::stats::TrialStatistics;
    use std::collections::BTreeMap;

    fn stats(median: f64, stddev: f64) -> TrialStatistics {
        TrialStatistics {
            median,
            min: median,
            max: median,
            stddev,
            trials: 3,
            result: None,
        }
    }

    fn record(label: &str, primes: f64) -> ResultRecord {
        let mut map = BTreeMap::new();
        map.insert(WorkloadKind::Primes, stats(primes, 0.0));
        ResultRecord::new(label, Environment::default(), map)
    }

    fn core_record(label: &str, medians: [f64; 3], stddevs: [f64; 3]) -> ResultRecord {
        let map = WorkloadKind::CORE
            .into_iter()
            .zip(medians.into_iter().zip(stddevs))
            .map(|(kind, (m, s))| (kind, stats(m, s)))
            .collect();
        ResultRecord::new(label, Environment::default(), map)
    }

    fn legacy(label: &str, primes: f64) -> ResultRecord {
        ResultRecord {
            timestamp: None,
            system_label: label.into(),
            platform: String::new(),
            architecture: String::new(),
            environment: Environment::default(),
            shape: RecordShape::Legacy(BTreeMap::from([(WorkloadKind::Primes, primes)])),
        }
    }

    #[test]
    fn test_single_record_has_no_prior() {
        let only = record("a", 1.0);
        assert_eq!(compare_latest(&[only.clone()]), Comparison::NoPrior);
        assert_eq!(compare_at(&[only.clone()], 0), Comparison::NoPrior);
        assert_eq!(compare_at(&[only.clone()], 5), Comparison::NoPrior);
        assert_eq!(compare_latest(&[]), Comparison::NoPrior);
        assert_eq!(compare(&[], &only), Comparison::NoPrior);
    }

    #[test]
    fn test_twenty_percent_faster_and_rank() {
        let history = vec![record("a", 10.0), record("b", 8.0)];
        let report = compare_at(&history, 1);
        let report = report.report().unwrap();

        let delta = report.delta(WorkloadKind::Primes).unwrap();
        assert!((delta.percent + 20.0).abs() < 1e-9);
        assert_eq!(delta.direction, Direction::Faster);
        assert_eq!(delta.to_string(), "20.0% faster");
        assert_eq!(report.previous_label, "a");
        assert_eq!(report.rank, Some(PercentileRank { position: 1, total: 2 }));
    }

    #[test]
    fn test_zero_delta_is_slower() {
        let delta = WorkloadDelta::new(WorkloadKind::Pi, 2.0, 2.0);
        assert_eq!(delta.percent, 0.0);
        assert_eq!(delta.direction, Direction::Slower);
    }

    #[test]
    fn test_zero_previous_median_is_zero_delta() {
        let delta = WorkloadDelta::new(WorkloadKind::Hash, 0.0, 3.0);
        assert_eq!(delta.percent, 0.0);
        assert_eq!(delta.direction, Direction::Slower);
    }

    #[test]
    fn test_only_shared_workloads_compared() {
        let mut map = BTreeMap::new();
        map.insert(WorkloadKind::Primes, stats(5.0, 0.0));
        map.insert(WorkloadKind::Memory, stats(1.0, 0.0));
        let current = ResultRecord::new("new", Environment::default(), map);
        let history = vec![legacy("old", 4.0), current.clone()];

        let comparison = compare_latest(&history);
        let report = comparison.report().unwrap();
        assert_eq!(report.deltas.len(), 1);
        let delta = report.delta(WorkloadKind::Primes).unwrap();
        assert!((delta.percent - 25.0).abs() < 1e-9);
        assert_eq!(delta.direction, Direction::Slower);
    }

    #[test]
    fn test_rank_ties_take_first_position() {
        let history = vec![record("a", 3.0), record("b", 1.0), record("c", 3.0), record("d", 2.0)];
        let rank = percentile_rank(&history, &history[2]).unwrap();
        assert_eq!(rank, PercentileRank { position: 3, total: 4 });
    }

    #[test]
    fn test_rank_includes_current_when_absent_from_history() {
        let history = vec![record("a", 3.0), record("b", 1.0)];
        let current = record("c", 2.0);
        let comparison = compare(&history, &current);
        let report = comparison.report().unwrap();
        assert_eq!(report.previous_label, "b");
        assert_eq!(report.rank, Some(PercentileRank { position: 2, total: 3 }));
    }

    #[test]
    fn test_compare_older_run_uses_its_predecessor() {
        let history = vec![record("a", 3.0), record("b", 1.0), record("c", 2.0)];
        let comparison = compare_at(&history, 1);
        assert_eq!(comparison.report().unwrap().previous_label, "a");
    }

    #[test]
    fn test_latest_is_found_by_position_not_value() {
        let current = record("b", 2.5976397732906826);
        // The stored copy differs from the in-memory run in the last bit.
        let mut stored = current.clone();
        if let RecordShape::Current(stats) = &mut stored.shape {
            let primes = stats.get_mut(&WorkloadKind::Primes).unwrap();
            primes.median = f64::from_bits(primes.median.to_bits() + 1);
        }
        assert_ne!(stored, current);

        let history = vec![record("a", 3.0), stored];
        let comparison = compare_latest(&history);
        let report = comparison.report().unwrap();
        assert_eq!(report.previous_label, "a");
        assert_eq!(report.delta(WorkloadKind::Primes).unwrap().direction, Direction::Faster);
        assert_eq!(report.rank, Some(PercentileRank { position: 1, total: 2 }));
    }

    #[test]
    fn test_identical_runs_compare_with_each_other() {
        let run = record("same", 1.5);
        let history = vec![run.clone(), run];
        let comparison = compare_latest(&history);
        let report = comparison.report().unwrap();
        assert_eq!(report.previous_label, "same");
        assert_eq!(report.rank, Some(PercentileRank { position: 1, total: 2 }));
    }

    #[test]
    fn test_consistency_classes() {
        let steady = core_record("s", [1.0, 1.0, 1.0], [0.01, 0.02, 0.03]);
        assert_eq!(consistency(&steady).unwrap().class, ConsistencyClass::Consistent);

        let middling = core_record("m", [1.0, 1.0, 1.0], [0.07, 0.07, 0.07]);
        assert_eq!(consistency(&middling).unwrap().class, ConsistencyClass::Acceptable);

        let noisy = core_record("n", [1.0, 2.0, 3.0], [0.5, 0.5, 0.5]);
        let result = consistency(&noisy).unwrap();
        assert!((result.variance_pct - 25.0).abs() < 1e-9);
        assert_eq!(result.class, ConsistencyClass::HighVariance);
    }

    #[test]
    fn test_consistency_zero_median_is_zero() {
        let zero = core_record("z", [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        let result = consistency(&zero).unwrap();
        assert_eq!(result.variance_pct, 0.0);
        assert_eq!(result.class, ConsistencyClass::Consistent);
    }

    #[test]
    fn test_consistency_ignores_memory_and_legacy() {
        assert!(consistency(&legacy("old", 1.0)).is_none());
        assert!(consistency(&record("partial", 1.0)).is_none());
    }

    #[test]
    fn test_percentile() {
        let rank = PercentileRank { position: 1, total: 4 };
        assert_eq!(rank.percentile(), 100.0);
        assert_eq!(rank.to_string(), "#1 of 4");
    }
}
