// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark configuration.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`BenchConfig::default`])
//! 2. An optional TOML file (`cpubench.toml` in the working directory, or an
//!    explicit path which must then exist)
//! 3. Environment variables prefixed with `CPUBENCH_`, e.g. `CPUBENCH_TRIALS=5`
//!
//! A `.env` file in the working directory is loaded before the environment is
//! read.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cpubench.toml";

/// Default result store path.
pub const DEFAULT_STORE_PATH: &str = "cpu_benchmark_results.jsonl";

/// Largest accepted `prime_limit`; the prime ground truth sieves up to it.
pub const MAX_PRIME_LIMIT: u64 = 100_000_000;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CPUBENCH";

/// Sizing and validation parameters for a benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Timed trials per workload (warmup excluded).
    pub trials: usize,
    /// Primes are counted below this limit.
    pub prime_limit: u64,
    /// Monte-Carlo samples for the pi estimate.
    pub pi_iterations: u64,
    /// Chained SHA-256 rounds.
    pub hash_rounds: u64,
    /// Length of the hex digest prefix reported by the hash workload.
    pub hash_prefix_len: usize,
    /// Buffer size scanned by the memory workload.
    pub memory_bytes: usize,
    /// Allowed absolute distance between the pi estimate and π.
    pub pi_tolerance: f64,
    /// Refuse to start a session when the load average exceeds this.
    pub max_load: Option<f64>,
    /// Location of the JSON Lines result store.
    pub store_path: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: 3,
            prime_limit: 1_000_000,
            pi_iterations: 10_000_000,
            hash_rounds: 5_000_000,
            hash_prefix_len: 10,
            memory_bytes: 64 * 1024 * 1024,
            pi_tolerance: 0.01,
            max_load: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl BenchConfig {
    /// Load configuration from the default file (if present) and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }

        let (file, required) = match path {
            Some(p) => (p.to_string_lossy().into_owned(), true),
            None => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::new(&file, config::FileFormat::Toml).required(required))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: BenchConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Loaded benchmark configuration");
        Ok(config)
    }

    /// Reject values that would make a session meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(BenchError::InvalidConfig("trials must be at least 1".into()));
        }
        if !(2..=MAX_PRIME_LIMIT).contains(&self.prime_limit) {
            return Err(BenchError::InvalidConfig(format!(
                "prime_limit must be between 2 and {MAX_PRIME_LIMIT}"
            )));
        }
        if self.pi_iterations == 0 || self.hash_rounds == 0 || self.memory_bytes == 0 {
            return Err(BenchError::InvalidConfig(
                "workload sizes must be greater than zero".into(),
            ));
        }
        if self.hash_prefix_len == 0 || self.hash_prefix_len > 64 {
            return Err(BenchError::InvalidConfig(
                "hash_prefix_len must be between 1 and 64".into(),
            ));
        }
        if !(self.pi_tolerance > 0.0) {
            return Err(BenchError::InvalidConfig("pi_tolerance must be positive".into()));
        }
        Ok(())
    }

    /// Override the number of trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Override the store location.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }
}
