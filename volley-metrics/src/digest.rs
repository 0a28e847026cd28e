use std::time::Duration;

use hdrhistogram::Histogram;

/// Highest trackable latency: one hour, in microseconds. Larger samples saturate.
const MAX_TRACKABLE_US: u64 = 3_600_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

fn new_histogram() -> Histogram<u64> {
    match Histogram::<u64>::new_with_bounds(1, MAX_TRACKABLE_US, SIGNIFICANT_FIGURES) {
        Ok(h) => h,
        Err(err) => panic!("failed to create histogram: {err}"),
    }
}

/// Bounded-memory latency distribution (microsecond resolution).
///
/// Memory use depends only on the tracked range and precision, never on the number of samples.
#[derive(Debug, Clone)]
pub struct LatencyDigest {
    hist: Histogram<u64>,
}

impl Default for LatencyDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyDigest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hist: new_histogram(),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        let us: u64 = latency.as_micros().try_into().unwrap_or(u64::MAX);
        self.hist.saturating_record(us.max(1));
    }

    /// Folds `other` into `self`. Both digests share the same bounds, so this cannot fail.
    pub fn merge(&mut self, other: &LatencyDigest) {
        let _ = self.hist.add(&other.hist);
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.hist.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hist.is_empty()
    }

    #[must_use]
    pub fn quantile(&self, q: f64) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_micros(self.hist.value_at_quantile(q)))
    }

    #[must_use]
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.is_empty() {
            return None;
        }

        let h = &self.hist;
        let at = |q: f64| Duration::from_micros(h.value_at_quantile(q));
        let from_us_f64 = |us: f64| Duration::from_secs_f64((us / 1_000_000.0).max(0.0));

        Some(LatencySummary {
            p50: at(0.50),
            p90: at(0.90),
            p95: at(0.95),
            p99: at(0.99),
            min: Duration::from_micros(h.min()),
            max: Duration::from_micros(h.max()),
            mean: from_us_f64(h.mean()),
            stdev: from_us_f64(h.stdev()),
            count: h.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub stdev: Duration,
    pub count: u64,
}
