use std::time::{Duration, SystemTime};

use crate::watch::source::ProcessSample;

/// A process seen above the add-threshold that has not yet been promoted.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEntry {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub last_detect: SystemTime,
}

impl WatchEntry {
    pub fn new(sample: &ProcessSample, now: SystemTime) -> Self {
        Self {
            pid: sample.pid,
            name: sample.name.clone(),
            cpu: sample.cpu,
            last_detect: now,
        }
    }
}

/// A repeat offender, eligible for alerts.
///
/// `memory` and `elapsed` are filled in by a background stats lookup and may
/// trail `cpu` by a cycle, or stay empty if the lookup fails.
#[derive(Debug, Clone, PartialEq)]
pub struct WarnEntry {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub memory: Option<u64>,
    pub elapsed: Option<Duration>,
    pub first_detect: SystemTime,
    pub last_detect: SystemTime,
    pub report_time: Option<SystemTime>,
    /// Due for an alert on the next report pass.
    pub report: bool,
}

impl WarnEntry {
    pub fn new(sample: &ProcessSample, now: SystemTime) -> Self {
        Self {
            pid: sample.pid,
            name: sample.name.clone(),
            cpu: sample.cpu,
            memory: None,
            elapsed: None,
            first_detect: now,
            last_detect: now,
            report_time: None,
            report: false,
        }
    }
}

/// True when `then` is at or before `now - interval`.
///
/// Times closer to the epoch than `interval` can never be old enough.
pub fn is_at_least(then: SystemTime, now: SystemTime, interval: Duration) -> bool {
    now.checked_sub(interval)
        .is_some_and(|cutoff| then <= cutoff)
}

/// Absolute distance between two wall-clock times.
pub fn distance(now: SystemTime, then: SystemTime) -> Duration {
    match now.duration_since(then) {
        Ok(d) => d,
        Err(e) => e.duration(),
    }
}
