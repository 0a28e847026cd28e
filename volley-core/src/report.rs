use std::collections::BTreeMap;
use std::time::Duration;

use volley_metrics::{LatencySummary, per_sec};

use crate::aggregator::MetricsSnapshot;
use crate::outcome::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckSummary {
    pub passed: u64,
    pub failed: u64,
    /// `passed / (passed + failed)`, 0 when never evaluated.
    pub pass_rate: f64,
}

/// Final, immutable summary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_requests: u64,
    pub successes: u64,
    pub failures_by_kind: BTreeMap<ErrorKind, u64>,
    pub status_codes: BTreeMap<u16, u64>,
    pub latency: Option<LatencySummary>,
    pub checks: BTreeMap<String, CheckSummary>,
    pub throughput_rps: f64,
    pub error_rate: f64,
    pub bytes_received: u64,
    pub bytes_received_per_sec: f64,
    pub duration_actual: Duration,
}

impl Report {
    /// Pure: the same snapshot always yields an equal report.
    pub fn build(snapshot: &MetricsSnapshot) -> Self {
        let elapsed_secs = snapshot.elapsed.as_secs_f64();
        let rate = |n: u64| {
            if elapsed_secs > 0.0 {
                per_sec(n, elapsed_secs)
            } else {
                0.0
            }
        };

        let failures = snapshot.failures();
        let error_rate = if snapshot.total_requests == 0 {
            0.0
        } else {
            failures as f64 / snapshot.total_requests as f64
        };

        let checks = snapshot
            .checks
            .iter()
            .map(|(name, c)| {
                let total = c.passed.saturating_add(c.failed);
                let pass_rate = if total == 0 {
                    0.0
                } else {
                    c.passed as f64 / total as f64
                };
                (
                    name.clone(),
                    CheckSummary {
                        passed: c.passed,
                        failed: c.failed,
                        pass_rate,
                    },
                )
            })
            .collect();

        Self {
            total_requests: snapshot.total_requests,
            successes: snapshot.successes,
            failures_by_kind: snapshot.failures_by_kind.clone(),
            status_codes: snapshot.status_codes.clone(),
            latency: snapshot.latency.summary(),
            checks,
            throughput_rps: rate(snapshot.total_requests),
            error_rate,
            bytes_received: snapshot.bytes_received,
            bytes_received_per_sec: rate(snapshot.bytes_received),
            duration_actual: snapshot.elapsed,
        }
    }

    pub fn failures(&self) -> u64 {
        self.failures_by_kind
            .values()
            .fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    pub fn checks_failed_total(&self) -> u64 {
        self.checks
            .values()
            .fold(0u64, |acc, c| acc.saturating_add(c.failed))
    }

    /// True when any check failed at least once.
    pub fn checks_failed(&self) -> bool {
        self.checks_failed_total() > 0
    }
}
