// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown output generation for benchmark history.
//!
//! Reports handle both record shapes: current records show full trial
//! statistics, legacy records their single duration per workload.

use crate::compare::{consistency, percentile_rank};
use crate::record::{RecordShape, ResultRecord};
use crate::workload::WorkloadKind;
use std::fmt::Write;

fn seconds(value: Option<f64>) -> String {
    value.map(|s| format!("{s:.4}")).unwrap_or_else(|| "-".to_string())
}

/// Generate a markdown summary table of every record.
pub fn generate_summary(records: &[ResultRecord]) -> String {
    let mut output = String::new();

    writeln!(output, "# Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Results").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "| Timestamp | Label | Platform | Shape | Primes (s) | Pi (s) | Hash (s) | Memory (s) |"
    ).unwrap();
    writeln!(
        output,
        "|-----------|-------|----------|-------|------------|--------|----------|------------|"
    ).unwrap();

    for record in records {
        writeln!(
            output,
            "| {} | {} | {} {} | {} | {} | {} | {} | {} |",
            record.timestamp_display(),
            record.system_label,
            record.platform,
            record.architecture,
            record.shape.name(),
            seconds(record.median(WorkloadKind::Primes)),
            seconds(record.median(WorkloadKind::Pi)),
            seconds(record.median(WorkloadKind::Hash)),
            seconds(record.median(WorkloadKind::Memory)),
        ).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "---").unwrap();
    writeln!(output, "Total runs: {}", records.len()).unwrap();

    output
}

/// Generate a detailed markdown report, one section per record.
pub fn generate_detailed_report(records: &[ResultRecord]) -> String {
    let mut output = String::new();

    writeln!(output, "# Detailed Benchmark Report").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).unwrap();
    writeln!(output).unwrap();

    for record in records {
        writeln!(output, "## {}", record.system_label).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Timestamp:** {}", record.timestamp_display()).unwrap();
        writeln!(output, "**Platform:** {} ({})", record.platform, record.architecture).unwrap();
        if let Some(cores) = record.environment.cpu_cores {
            writeln!(output, "**Cores:** {cores}").unwrap();
        }
        if let Some(mhz) = record.environment.cpu_freq_mhz {
            writeln!(output, "**Clock:** {mhz:.0} MHz").unwrap();
        }
        if let Some(rank) = percentile_rank(records, record) {
            writeln!(output, "**Primes rank:** {rank}").unwrap();
        }
        writeln!(output).unwrap();

        match &record.shape {
            RecordShape::Legacy(times) => {
                writeln!(output, "| Workload | Duration (s) |").unwrap();
                writeln!(output, "|----------|--------------|").unwrap();
                for (kind, time) in times {
                    writeln!(output, "| {} | {time:.4} |", kind.title()).unwrap();
                }
            }
            RecordShape::Current(stats) => {
                writeln!(output, "| Workload | Median | Min | Max | Stddev | Trials | Result |").unwrap();
                writeln!(output, "|----------|--------|-----|-----|--------|--------|--------|").unwrap();
                for (kind, s) in stats {
                    let result = s.result.as_ref().map(ToString::to_string).unwrap_or_default();
                    writeln!(
                        output,
                        "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {} | {} |",
                        kind.title(),
                        s.median,
                        s.min,
                        s.max,
                        s.stddev,
                        s.trials,
                        result
                    ).unwrap();
                }
                if let Some(c) = consistency(record) {
                    writeln!(output).unwrap();
                    writeln!(output, "Variance: {:.2}% ({})", c.variance_pct, c.class).unwrap();
                }
            }
        }
        writeln!(output).unwrap();
    }

    output
}
