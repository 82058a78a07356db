// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the benchmark library.

use thiserror::Error;

/// Errors that can occur while running sessions or touching the result store.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Reading or writing the result store failed.
    #[error("Result store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The requested session label was empty or whitespace.
    #[error("Session label must not be empty")]
    EmptyLabel,

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration sources could not be read or merged.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;
