// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Persisted benchmark session records.
//!
//! Each record is stored as one JSON object per line. Two on-disk shapes
//! coexist in the same store:
//!
//! - **Legacy**: one duration per workload (`primes_time`, `pi_time`,
//!   `hash_time`), label under `system_name`, architecture under `processor`.
//! - **Current**: a statistics block per workload (`primes`, `pi`, `hash`,
//!   optional `memory`).
//!
//! The shape is decided once per line while parsing and kept as
//! [`RecordShape`], so display and comparison code never probe raw fields.

use crate::stats::TrialStatistics;
use crate::workload::WorkloadKind;
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// On-disk timestamp format (local clock, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Host metadata captured with a session. Either field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Logical core count.
    pub cpu_cores: Option<usize>,
    /// Current clock frequency in MHz.
    pub cpu_freq_mhz: Option<f64>,
}

/// Per-workload measurements, in whichever shape the record was written.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordShape {
    /// Single duration in seconds per workload.
    Legacy(BTreeMap<WorkloadKind, f64>),
    /// Full trial statistics per workload.
    Current(BTreeMap<WorkloadKind, TrialStatistics>),
}

impl RecordShape {
    /// Short name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy(_) => "legacy",
            Self::Current(_) => "current",
        }
    }
}

/// One benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredRecord", try_from = "StoredRecord")]
pub struct ResultRecord {
    /// When the session finished. Unknown for records stored without it.
    pub timestamp: Option<NaiveDateTime>,
    /// Label naming the system or session.
    pub system_label: String,
    /// Operating system name.
    pub platform: String,
    /// CPU architecture.
    pub architecture: String,
    /// Host metadata.
    pub environment: Environment,
    /// Measurements.
    pub shape: RecordShape,
}

impl ResultRecord {
    /// Create a current-shape record stamped with the local time.
    pub fn new(
        system_label: impl Into<String>,
        environment: Environment,
        stats: BTreeMap<WorkloadKind, TrialStatistics>,
    ) -> Self {
        Self {
            timestamp: Some(Local::now().naive_local().trunc_subsecs(0)),
            system_label: system_label.into(),
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            environment,
            shape: RecordShape::Current(stats),
        }
    }

    /// Median duration (or the single legacy duration) for `kind`.
    pub fn median(&self, kind: WorkloadKind) -> Option<f64> {
        match &self.shape {
            RecordShape::Legacy(times) => times.get(&kind).copied(),
            RecordShape::Current(stats) => stats.get(&kind).map(|s| s.median),
        }
    }

    /// Full statistics for `kind`; `None` for legacy records.
    pub fn statistics(&self, kind: WorkloadKind) -> Option<&TrialStatistics> {
        match &self.shape {
            RecordShape::Legacy(_) => None,
            RecordShape::Current(stats) => stats.get(&kind),
        }
    }

    /// Workloads this record has measurements for, in session order.
    pub fn workloads(&self) -> Vec<WorkloadKind> {
        WorkloadKind::ALL
            .into_iter()
            .filter(|kind| self.median(*kind).is_some())
            .collect()
    }

    /// Whether the record uses the legacy single-duration shape.
    pub fn is_legacy(&self) -> bool {
        matches!(self.shape, RecordShape::Legacy(_))
    }

    /// Timestamp formatted for display.
    pub fn timestamp_display(&self) -> String {
        self.timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Flat, all-optional line layout shared by both shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredRecord {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(alias = "system_name", skip_serializing_if = "Option::is_none")]
    system_label: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    #[serde(alias = "processor", deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    architecture: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    cpu_cores: Option<usize>,
    #[serde(deserialize_with = "lenient_seconds")]
    cpu_freq_mhz: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    primes: Option<TrialStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pi: Option<TrialStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<TrialStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<TrialStatistics>,

    #[serde(deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    primes_time: Option<f64>,
    #[serde(deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    pi_time: Option<f64>,
    #[serde(deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    hash_time: Option<f64>,
    #[serde(deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    memory_time: Option<f64>,
}

impl StoredRecord {
    fn stats_blocks(&mut self) -> BTreeMap<WorkloadKind, TrialStatistics> {
        [
            (WorkloadKind::Primes, self.primes.take()),
            (WorkloadKind::Pi, self.pi.take()),
            (WorkloadKind::Hash, self.hash.take()),
            (WorkloadKind::Memory, self.memory.take()),
        ]
        .into_iter()
        .filter_map(|(kind, stats)| stats.map(|s| (kind, s)))
        .collect()
    }

    fn legacy_times(&self) -> BTreeMap<WorkloadKind, f64> {
        [
            (WorkloadKind::Primes, self.primes_time),
            (WorkloadKind::Pi, self.pi_time),
            (WorkloadKind::Hash, self.hash_time),
            (WorkloadKind::Memory, self.memory_time),
        ]
        .into_iter()
        .filter_map(|(kind, time)| time.map(|t| (kind, t)))
        .collect()
    }
}

impl From<ResultRecord> for StoredRecord {
    fn from(record: ResultRecord) -> Self {
        let mut stored = StoredRecord {
            timestamp: record.timestamp.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
            system_label: Some(record.system_label),
            platform: Some(record.platform),
            architecture: Some(record.architecture),
            cpu_cores: record.environment.cpu_cores,
            cpu_freq_mhz: record.environment.cpu_freq_mhz,
            ..StoredRecord::default()
        };

        match record.shape {
            RecordShape::Legacy(times) => {
                stored.primes_time = times.get(&WorkloadKind::Primes).copied();
                stored.pi_time = times.get(&WorkloadKind::Pi).copied();
                stored.hash_time = times.get(&WorkloadKind::Hash).copied();
                stored.memory_time = times.get(&WorkloadKind::Memory).copied();
            }
            RecordShape::Current(mut stats) => {
                stored.primes = stats.remove(&WorkloadKind::Primes);
                stored.pi = stats.remove(&WorkloadKind::Pi);
                stored.hash = stats.remove(&WorkloadKind::Hash);
                stored.memory = stats.remove(&WorkloadKind::Memory);
            }
        }
        stored
    }
}

impl TryFrom<StoredRecord> for ResultRecord {
    type Error = &'static str;

    fn try_from(mut stored: StoredRecord) -> Result<Self, Self::Error> {
        let system_label = stored
            .system_label
            .take()
            .filter(|label| !label.trim().is_empty())
            .ok_or("record has no system label")?;

        let stats = stored.stats_blocks();
        let shape = if !stats.is_empty() {
            RecordShape::Current(stats)
        } else {
            let times = stored.legacy_times();
            if times.is_empty() {
                return Err("record has no workload measurements");
            }
            RecordShape::Legacy(times)
        };

        Ok(Self {
            timestamp: stored.timestamp.as_deref().and_then(parse_timestamp),
            system_label,
            platform: stored.platform.unwrap_or_default(),
            architecture: stored.architecture.unwrap_or_default(),
            environment: Environment {
                cpu_cores: stored.cpu_cores,
                cpu_freq_mhz: stored.cpu_freq_mhz,
            },
            shape,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local().trunc_subsecs(0))
        })
}

// The helpers below turn wrongly typed optional fields into `None` rather than
// rejecting the whole line.

/// Accepts a number, a numeric string, or null.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts a non-negative integer, an integer string, or null.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts a string; anything else is dropped.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}
