// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session label handling.

use crate::error::{BenchError, Result};
use std::collections::HashSet;

/// Trim a user-supplied label, rejecting blank input.
pub fn normalize_label(raw: &str) -> Result<String> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(BenchError::EmptyLabel);
    }
    Ok(label.to_string())
}

/// Return `requested`, or the first `requested_N` (N = 2, 3, ...) not in `existing`.
pub fn resolve_unique(requested: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(requested) {
        return requested.to_string();
    }
    (2u64..)
        .map(|n| format!("{requested}_{n}"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| requested.to_string())
}
