use std::sync::Arc;
use std::time::Duration;

use volley_metrics::RunningStats;

use crate::aggregator::MetricsSnapshot;
use crate::scheduler::RunState;

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// 1-based tick counter.
    pub tick: u64,
    pub elapsed: Duration,
    /// Configured run duration.
    pub duration: Duration,
    pub vus: u64,
    pub state: RunState,
    pub snapshot: MetricsSnapshot,
    /// Requests/sec observed during the last progress interval.
    pub rps_now: f64,
    /// Distribution of `rps_now` over all ticks so far.
    pub rps: RunningStats,
}
