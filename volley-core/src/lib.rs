//! Load generation engine: virtual users issuing requests for a fixed duration, with per-response
//! checks and a concurrent metrics aggregator.

mod aggregator;
mod check;
mod config;
mod error;
mod executor;
mod outcome;
mod progress;
mod report;
mod scheduler;
mod signal;
mod template;
mod vu;

pub use aggregator::{Aggregator, CheckCounts, MetricsSnapshot, Recorder};
pub use check::{Check, CheckFn, CheckResult, Predicate, StatusOp, evaluate, parse_predicate};
pub use config::{DEFAULT_DURATION, DEFAULT_PROGRESS_INTERVAL, DEFAULT_VUS, RunConfig};
pub use error::{CheckError, Error, Result};
pub use executor::{HttpExecutor, RequestExecutor};
pub use outcome::{ErrorKind, Outcome, ResponseMeta};
pub use progress::{ProgressFn, ProgressUpdate};
pub use report::{CheckSummary, Report};
pub use scheduler::{RunHandle, RunState, Scheduler};
pub use signal::Signal;
pub use template::RequestTemplate;
pub use vu::{VirtualUser, VuContext};

pub use volley_http::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, HttpClient, HttpRequest};
pub use volley_metrics::{LatencySummary, RunningStats};
