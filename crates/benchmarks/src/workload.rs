// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Synthetic CPU workloads.
//!
//! Every workload implements [`Workload`]: an untimed warmup plus a timed run
//! returning its duration and a representative output value that the
//! validator can check.

use crate::config::BenchConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Seed input for the hash chain.
pub const HASH_SEED: &[u8] = b"benchmarking_is_fun!";

/// The four workloads of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Prime counting by trial division.
    Primes,
    /// Monte-Carlo estimation of π.
    Pi,
    /// Iterated SHA-256.
    Hash,
    /// Memory fill and scan.
    Memory,
}

impl WorkloadKind {
    /// All workloads in session order.
    pub const ALL: [WorkloadKind; 4] = [Self::Primes, Self::Pi, Self::Hash, Self::Memory];

    /// Workloads used for consistency classification.
    pub const CORE: [WorkloadKind; 3] = [Self::Primes, Self::Pi, Self::Hash];

    /// Stable name used on disk and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primes => "primes",
            Self::Pi => "pi",
            Self::Hash => "hash",
            Self::Memory => "memory",
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Primes => "Prime count",
            Self::Pi => "Pi estimation",
            Self::Hash => "SHA-256 chain",
            Self::Memory => "Memory scan",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representative value produced by a workload trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkloadOutput {
    /// An integer count or sum.
    Count(u64),
    /// A floating point estimate.
    Estimate(f64),
    /// A short hex digest.
    Digest(String),
}

impl fmt::Display for WorkloadOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Estimate(x) => write!(f, "{x:.5}"),
            Self::Digest(s) => f.write_str(s),
        }
    }
}

/// A timed, pluggable benchmark body.
pub trait Workload {
    /// Which workload this is.
    fn kind(&self) -> WorkloadKind;

    /// Untimed pass run once before any trial.
    fn warmup(&mut self);

    /// One timed trial.
    fn run(&mut self) -> (Duration, WorkloadOutput);
}

/// Counts primes below `limit` by trial division.
#[derive(Debug, Clone)]
pub struct PrimeCount {
    limit: u64,
}

impl PrimeCount {
    /// Create a prime counter for numbers below `limit`.
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    fn is_prime(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut i = 2;
        while i * i <= n {
            if n % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }
}

impl Workload for PrimeCount {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Primes
    }

    fn warmup(&mut self) {
        for n in 2..500 {
            black_box(Self::is_prime(black_box(n)));
        }
    }

    fn run(&mut self) -> (Duration, WorkloadOutput) {
        let start = Instant::now();
        let count = (2..self.limit).filter(|&n| Self::is_prime(black_box(n))).count() as u64;
        (start.elapsed(), WorkloadOutput::Count(count))
    }
}

/// Estimates π by sampling points in the unit square.
#[derive(Debug, Clone)]
pub struct PiEstimate {
    iterations: u64,
}

impl PiEstimate {
    /// Create an estimator drawing `iterations` samples per trial.
    pub fn new(iterations: u64) -> Self {
        Self { iterations }
    }

    fn sample_inside(iterations: u64) -> u64 {
        let mut rng = rand::thread_rng();
        let mut inside = 0u64;
        for _ in 0..iterations {
            let x: f64 = rng.gen();
            let y: f64 = rng.gen();
            if x * x + y * y <= 1.0 {
                inside += 1;
            }
        }
        inside
    }
}

impl Workload for PiEstimate {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Pi
    }

    fn warmup(&mut self) {
        black_box(Self::sample_inside(1_000));
    }

    fn run(&mut self) -> (Duration, WorkloadOutput) {
        let start = Instant::now();
        let inside = Self::sample_inside(self.iterations);
        let estimate = 4.0 * inside as f64 / self.iterations as f64;
        (start.elapsed(), WorkloadOutput::Estimate(estimate))
    }
}

/// Feeds each SHA-256 digest back into the hash `rounds` times.
#[derive(Debug, Clone)]
pub struct HashChain {
    rounds: u64,
    prefix_len: usize,
}

impl HashChain {
    /// Create a chain of `rounds` hashes reporting `prefix_len` hex chars.
    pub fn new(rounds: u64, prefix_len: usize) -> Self {
        Self { rounds, prefix_len }
    }

    fn chain(rounds: u64) -> Vec<u8> {
        let mut data = HASH_SEED.to_vec();
        for _ in 0..rounds {
            data = Sha256::digest(&data).to_vec();
        }
        data
    }
}

impl Workload for HashChain {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Hash
    }

    fn warmup(&mut self) {
        black_box(Self::chain(10_000));
    }

    fn run(&mut self) -> (Duration, WorkloadOutput) {
        let start = Instant::now();
        let digest = Self::chain(self.rounds);
        let elapsed = start.elapsed();
        let mut hex = hex::encode(digest);
        hex.truncate(self.prefix_len);
        (elapsed, WorkloadOutput::Digest(hex))
    }
}

/// Writes then sums a byte buffer to stress memory bandwidth.
#[derive(Debug, Clone)]
pub struct MemoryScan {
    buffer: Vec<u8>,
}

impl MemoryScan {
    /// Allocate a scan buffer of `size_bytes`.
    pub fn new(size_bytes: usize) -> Self {
        Self {
            buffer: vec![0; size_bytes],
        }
    }

    fn fill_and_sum(buffer: &mut [u8]) -> u64 {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = (i % 256) as u8;
        }
        black_box(&*buffer).iter().map(|&b| u64::from(b)).sum()
    }
}

impl Workload for MemoryScan {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Memory
    }

    fn warmup(&mut self) {
        let len = self.buffer.len().min(1 << 20);
        black_box(Self::fill_and_sum(&mut self.buffer[..len]));
    }

    fn run(&mut self) -> (Duration, WorkloadOutput) {
        let start = Instant::now();
        let sum = Self::fill_and_sum(&mut self.buffer);
        (start.elapsed(), WorkloadOutput::Count(sum))
    }
}

/// The standard battery, sized from `config`, in session order.
pub fn standard_workloads(config: &BenchConfig) -> Vec<Box<dyn Workload>> {
    vec![
        Box::new(PrimeCount::new(config.prime_limit)),
        Box::new(PiEstimate::new(config.pi_iterations)),
        Box::new(HashChain::new(config.hash_rounds, config.hash_prefix_len)),
        Box::new(MemoryScan::new(config.memory_bytes)),
    ]
}
