use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::Mutex;
use strum::{EnumCount as _, IntoEnumIterator as _};
use volley_metrics::LatencyDigest;

use crate::check::CheckResult;
use crate::outcome::{ErrorKind, Outcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounts {
    pub passed: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Shard {
    total: u64,
    successes: u64,
    failures: [u64; ErrorKind::COUNT],
    status_codes: AHashMap<u16, u64>,
    bytes_received: u64,
    checks: AHashMap<Arc<str>, CheckCounts>,
    latency: LatencyDigest,
}

impl Shard {
    fn apply(&mut self, outcome: &Outcome, results: &[CheckResult]) {
        self.total = self.total.saturating_add(1);
        match outcome {
            Outcome::Success {
                status, response, ..
            } => {
                self.successes = self.successes.saturating_add(1);
                let n = self.status_codes.entry(*status).or_default();
                *n = n.saturating_add(1);
                self.bytes_received = self.bytes_received.saturating_add(response.bytes_received);
            }
            Outcome::Failure { kind, .. } => {
                let n = &mut self.failures[*kind as usize];
                *n = n.saturating_add(1);
            }
        }
        self.latency.record(outcome.latency());

        for r in results {
            // Look up by &str so the steady state never clones the name.
            if !self.checks.contains_key(&*r.name) {
                self.checks.insert(r.name.clone(), CheckCounts::default());
            }
            let Some(counts) = self.checks.get_mut(&*r.name) else {
                continue;
            };
            if r.passed {
                counts.passed = counts.passed.saturating_add(1);
            } else {
                counts.failed = counts.failed.saturating_add(1);
            }
        }
    }

    fn merge_into(&self, out: &mut MetricsSnapshot) {
        out.total_requests = out.total_requests.saturating_add(self.total);
        out.successes = out.successes.saturating_add(self.successes);
        for (kind, n) in ErrorKind::iter().zip(self.failures) {
            if n > 0 {
                let v = out.failures_by_kind.entry(kind).or_default();
                *v = v.saturating_add(n);
            }
        }
        for (code, n) in &self.status_codes {
            let v = out.status_codes.entry(*code).or_default();
            *v = v.saturating_add(*n);
        }
        out.bytes_received = out.bytes_received.saturating_add(self.bytes_received);
        for (name, c) in &self.checks {
            let v = out.checks.entry(name.to_string()).or_default();
            v.passed = v.passed.saturating_add(c.passed);
            v.failed = v.failed.saturating_add(c.failed);
        }
        out.latency.merge(&self.latency);
    }
}

/// Point-in-time view of everything recorded so far.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successes: u64,
    /// Only kinds that occurred at least once.
    pub failures_by_kind: BTreeMap<ErrorKind, u64>,
    pub status_codes: BTreeMap<u16, u64>,
    pub bytes_received: u64,
    pub latency: LatencyDigest,
    pub checks: BTreeMap<String, CheckCounts>,
    /// Wall time between `start` and `seal` (or now, while the run is live).
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    pub fn failures(&self) -> u64 {
        self.failures_by_kind
            .values()
            .fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    pub fn checks_failed(&self) -> u64 {
        self.checks
            .values()
            .fold(0u64, |acc, c| acc.saturating_add(c.failed))
    }
}

/// Concurrent sink for outcomes and check results.
///
/// State is split over a power-of-two number of shards, each behind its own lock. A `record`
/// call touches exactly one shard while holding that shard's lock, and `snapshot` locks shards
/// one at a time, so every call is observed either entirely or not at all.
#[derive(Debug)]
pub struct Aggregator {
    shards: Box<[Mutex<Shard>]>,
    mask: usize,
    next: AtomicUsize,
    started_at: OnceLock<Instant>,
    sealed_at: OnceLock<Instant>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::with_shards(default_shard_count())
    }

    /// `shards` is rounded up to the next power of two.
    pub fn with_shards(shards: usize) -> Self {
        let n = shards.max(1).next_power_of_two();
        let shards: Vec<Mutex<Shard>> = (0..n).map(|_| Mutex::new(Shard::default())).collect();
        Self {
            shards: shards.into_boxed_slice(),
            mask: n - 1,
            next: AtomicUsize::new(0),
            started_at: OnceLock::new(),
            sealed_at: OnceLock::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// A recorder pinned to one shard, so VUs on different shards never contend.
    pub fn recorder(self: &Arc<Self>, vu_id: u64) -> Recorder {
        Recorder {
            aggregator: Arc::clone(self),
            shard: (vu_id as usize) & self.mask,
        }
    }

    /// Records into a round-robin shard.
    pub fn record(&self, outcome: &Outcome, results: &[CheckResult]) {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) & self.mask;
        self.record_into(idx, outcome, results);
    }

    fn record_into(&self, idx: usize, outcome: &Outcome, results: &[CheckResult]) {
        let mut shard = self.shards[idx & self.mask].lock();
        // Checked under the shard lock; `seal` holds every shard lock while it flips the flag.
        if self.is_sealed() {
            return;
        }
        shard.apply(outcome, results);
    }

    /// Starts the run clock. Later calls are no-ops.
    pub fn start(&self) {
        let _ = self.started_at.set(Instant::now());
    }

    /// Stops the run clock; records arriving afterwards are dropped. Later calls are no-ops.
    ///
    /// Once `seal` returns, no record call is still applying to a shard.
    pub fn seal(&self) {
        self.start();
        let _guards: Vec<_> = self.shards.iter().map(|shard| shard.lock()).collect();
        let _ = self.sealed_at.set(Instant::now());
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed_at.get().is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match (self.started_at.get(), self.sealed_at.get()) {
            (Some(start), Some(end)) => end.saturating_duration_since(*start),
            (Some(start), None) => start.elapsed(),
            (None, _) => Duration::ZERO,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut out = MetricsSnapshot::default();
        for shard in self.shards.iter() {
            shard.lock().merge_into(&mut out);
        }
        out.elapsed = self.elapsed();
        out
    }
}

/// Per-VU handle onto one aggregator shard.
#[derive(Debug, Clone)]
pub struct Recorder {
    aggregator: Arc<Aggregator>,
    shard: usize,
}

impl Recorder {
    pub fn record(&self, outcome: &Outcome, results: &[CheckResult]) {
        self.aggregator.record_into(self.shard, outcome, results);
    }
}

fn default_shard_count() -> usize {
    std::thread::available_parallelism()
        .map_or(4, |n| n.get())
        .max(4)
        .next_power_of_two()
}
