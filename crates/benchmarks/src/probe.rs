// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host probes for clock frequency and system load.
//!
//! Both are best effort: on platforms without `/proc`, or when the files
//! cannot be parsed, the probe reports `None`.

use crate::record::Environment;
use std::fs;
use tracing::debug;

/// Source of host metadata.
#[cfg_attr(test, mockall::automock)]
pub trait SystemProbe {
    /// Current CPU clock in MHz.
    fn cpu_frequency_mhz(&self) -> Option<f64>;

    /// One-minute load average.
    fn load_average(&self) -> Option<f64>;

    /// Logical cores available to this process.
    fn cpu_cores(&self) -> Option<usize> {
        std::thread::available_parallelism().ok().map(|n| n.get())
    }
}

/// Reads the running host through `/proc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn cpu_frequency_mhz(&self) -> Option<f64> {
        let cpuinfo = fs::read_to_string("/proc/cpuinfo").ok()?;
        let mhz = parse_cpuinfo_mhz(&cpuinfo);
        debug!(?mhz, "Probed CPU frequency");
        mhz
    }

    fn load_average(&self) -> Option<f64> {
        let loadavg = fs::read_to_string("/proc/loadavg").ok()?;
        parse_loadavg(&loadavg)
    }
}

/// Environment metadata for a new record.
pub fn detect_environment(probe: &dyn SystemProbe) -> Environment {
    Environment {
        cpu_cores: probe.cpu_cores(),
        cpu_freq_mhz: probe.cpu_frequency_mhz(),
    }
}

/// Result of the pre-session load check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadCheck {
    /// Load is within the limit, or no limit is configured.
    Ok,
    /// Load exceeds the configured limit.
    TooHigh {
        /// Observed load average.
        load: f64,
        /// Configured limit.
        max: f64,
    },
    /// A limit is configured but the load could not be read.
    Unknown,
}

/// Compare the current load against `max_load`.
pub fn check_load(probe: &dyn SystemProbe, max_load: Option<f64>) -> LoadCheck {
    let Some(max) = max_load else {
        return LoadCheck::Ok;
    };
    match probe.load_average() {
        Some(load) if load > max => LoadCheck::TooHigh { load, max },
        Some(_) => LoadCheck::Ok,
        None => LoadCheck::Unknown,
    }
}

/// First `cpu MHz` entry of a `/proc/cpuinfo` dump.
fn parse_cpuinfo_mhz(cpuinfo: &str) -> Option<f64> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() == "cpu MHz" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn parse_loadavg(loadavg: &str) -> Option<f64> {
    loadavg.split_whitespace().next()?.parse().ok()
}
