pub mod digest;
pub mod stats;

pub use digest::{LatencyDigest, LatencySummary};
pub use stats::{RunningStats, per_sec};
