// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Correctness checks on workload outputs.
//!
//! A failed check never aborts a session; it is logged and surfaced to the
//! caller alongside the recorded statistics.

use crate::config::{BenchConfig, MAX_PRIME_LIMIT};
use crate::workload::{WorkloadKind, WorkloadOutput};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

/// Exact number of primes below one million.
pub const PRIMES_BELOW_ONE_MILLION: u64 = 78_498;

/// Outcome of validating one workload output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// Workload that was checked.
    pub kind: WorkloadKind,
    /// Whether the output matched expectations.
    pub ok: bool,
    /// Explanation suitable for display.
    pub message: String,
}

impl Validation {
    fn pass(kind: WorkloadKind, message: String) -> Self {
        Self { kind, ok: true, message }
    }

    fn fail(kind: WorkloadKind, message: String) -> Self {
        warn!(workload = %kind, %message, "Validation failed");
        Self { kind, ok: false, message }
    }
}

/// Check `output` of workload `kind` against the expectations for `config`.
pub fn validate(kind: WorkloadKind, output: Option<&WorkloadOutput>, config: &BenchConfig) -> Validation {
    let Some(output) = output else {
        return Validation::fail(kind, "no output recorded".to_string());
    };

    match (kind, output) {
        (WorkloadKind::Primes, WorkloadOutput::Count(count)) => {
            let Some(expected) = expected_prime_count(config.prime_limit) else {
                return Validation::fail(
                    kind,
                    format!("no prime count known above {MAX_PRIME_LIMIT} (limit {})", config.prime_limit),
                );
            };
            if *count == expected {
                Validation::pass(kind, format!("{count} primes below {}", config.prime_limit))
            } else {
                Validation::fail(
                    kind,
                    format!("expected {expected} primes below {}, got {count}", config.prime_limit),
                )
            }
        }
        (WorkloadKind::Pi, WorkloadOutput::Estimate(estimate)) => {
            let error = (estimate - PI).abs();
            if error <= config.pi_tolerance {
                Validation::pass(kind, format!("estimate {estimate:.5} within ±{} of π", config.pi_tolerance))
            } else {
                Validation::fail(
                    kind,
                    format!("estimate {estimate:.5} is {error:.5} away from π (tolerance {})", config.pi_tolerance),
                )
            }
        }
        (WorkloadKind::Hash, WorkloadOutput::Digest(hex)) => {
            let well_formed = hex.len() == config.hash_prefix_len
                && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
            if well_formed {
                Validation::pass(kind, format!("digest prefix {hex}"))
            } else {
                Validation::fail(
                    kind,
                    format!(
                        "digest {hex:?} is not {} lowercase hex characters",
                        config.hash_prefix_len
                    ),
                )
            }
        }
        (WorkloadKind::Memory, WorkloadOutput::Count(sum)) => {
            let ceiling = config.memory_bytes as u64 * 255;
            if *sum > 0 && *sum <= ceiling {
                Validation::pass(kind, format!("sum {sum} over {} bytes", config.memory_bytes))
            } else {
                Validation::fail(kind, format!("sum {sum} outside 1..={ceiling}"))
            }
        }
        (kind, other) => Validation::fail(kind, format!("unexpected output {other}")),
    }
}

/// Exact number of primes strictly below `limit`.
///
/// `None` above [`MAX_PRIME_LIMIT`], where the sieve would need too much memory.
pub fn expected_prime_count(limit: u64) -> Option<u64> {
    if limit > MAX_PRIME_LIMIT {
        return None;
    }
    if limit == 1_000_000 {
        return Some(PRIMES_BELOW_ONE_MILLION);
    }
    if limit < 3 {
        return Some(0);
    }

    let limit = limit as usize;
    let mut composite = vec![false; limit];
    let mut count = 0;
    for n in 2..limit {
        if composite[n] {
            continue;
        }
        count += 1;
        let mut multiple = n * n;
        while multiple < limit {
            composite[multiple] = true;
            multiple += n;
        }
    }
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BenchConfig {
        BenchConfig::default()
    }

    #[test]
    fn test_exact_prime_count_passes() {
        let v = validate(WorkloadKind::Primes, Some(&WorkloadOutput::Count(78_498)), &config());
        assert!(v.ok, "{}", v.message);
    }

    #[test]
    fn test_off_by_one_prime_count_fails() {
        for wrong in [78_497, 78_499] {
            let v = validate(WorkloadKind::Primes, Some(&WorkloadOutput::Count(wrong)), &config());
            assert!(!v.ok);
            assert!(v.message.contains("78498"));
        }
    }

    #[test]
    fn test_sieve_matches_known_counts() {
        assert_eq!(expected_prime_count(2), Some(0));
        assert_eq!(expected_prime_count(3), Some(1));
        assert_eq!(expected_prime_count(10), Some(4));
        assert_eq!(expected_prime_count(100), Some(25));
        assert_eq!(expected_prime_count(10_000), Some(1_229));
    }

    #[test]
    fn test_limit_above_maximum_fails_without_sieving() {
        assert_eq!(expected_prime_count(MAX_PRIME_LIMIT + 1), None);
        assert_eq!(expected_prime_count(u64::MAX), None);

        let cfg = BenchConfig {
            prime_limit: u64::MAX,
            ..config()
        };
        let v = validate(WorkloadKind::Primes, Some(&WorkloadOutput::Count(0)), &cfg);
        assert!(!v.ok);
        assert!(v.message.contains("no prime count known"));
    }

    #[test]
    fn test_pi_tolerance_band() {
        let bad = validate(WorkloadKind::Pi, Some(&WorkloadOutput::Estimate(3.0)), &config());
        assert!(!bad.ok);
        let good = validate(WorkloadKind::Pi, Some(&WorkloadOutput::Estimate(3.1416)), &config());
        assert!(good.ok);
    }

    #[test]
    fn test_hash_digest_shape() {
        let ok = validate(WorkloadKind::Hash, Some(&WorkloadOutput::Digest("0a1b2c3d4e".into())), &config());
        assert!(ok.ok);
        let upper = validate(WorkloadKind::Hash, Some(&WorkloadOutput::Digest("0A1B2C3D4E".into())), &config());
        assert!(!upper.ok);
        let short = validate(WorkloadKind::Hash, Some(&WorkloadOutput::Digest("0a1b".into())), &config());
        assert!(!short.ok);
    }

    #[test]
    fn test_memory_sum_range() {
        let cfg = BenchConfig {
            memory_bytes: 512,
            ..config()
        };
        assert!(validate(WorkloadKind::Memory, Some(&WorkloadOutput::Count(65_280)), &cfg).ok);
        assert!(!validate(WorkloadKind::Memory, Some(&WorkloadOutput::Count(0)), &cfg).ok);
        assert!(!validate(WorkloadKind::Memory, Some(&WorkloadOutput::Count(512 * 255 + 1)), &cfg).ok);
    }

    #[test]
    fn test_missing_or_mismatched_output_fails() {
        assert!(!validate(WorkloadKind::Primes, None, &config()).ok);
        assert!(!validate(WorkloadKind::Primes, Some(&WorkloadOutput::Estimate(1.0)), &config()).ok);
    }
}
