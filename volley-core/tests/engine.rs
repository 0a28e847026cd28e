use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use volley_core::{
    Aggregator, Check, CheckResult, ErrorKind, Outcome, Report, RequestExecutor, RequestTemplate,
    RunConfig, RunState, Scheduler, evaluate,
};

fn template() -> RequestTemplate {
    RequestTemplate::get("http://localhost/").unwrap_or_else(|e| panic!("{e}"))
}

fn check(name: &str, expr: &str) -> Check {
    Check::parse(name, expr).unwrap_or_else(|e| panic!("{e}"))
}

/// Answers 200 after a fixed delay and counts calls.
#[derive(Debug, Default)]
struct Delayed {
    delay: Duration,
    calls: AtomicU64,
}

impl Delayed {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU64::new(0),
        }
    }
}

impl RequestExecutor for Delayed {
    async fn execute(&self, _template: &RequestTemplate) -> Outcome {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.delay).await;
        Outcome::status(200, self.delay)
    }
}

#[derive(Debug)]
struct AlwaysTimeout;

impl RequestExecutor for AlwaysTimeout {
    async fn execute(&self, _template: &RequestTemplate) -> Outcome {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Outcome::failure(ErrorKind::Timeout, Duration::from_millis(5))
    }
}

fn scheduler<E: RequestExecutor>(cfg: RunConfig, executor: E) -> Scheduler<E> {
    Scheduler::new(cfg, executor).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn seven_of_ten_pass_status_check() {
    let agg = Aggregator::new();
    let checks = vec![check("status was 200", "status == 200")];
    for status in [200, 200, 200, 200, 200, 200, 200, 500, 500, 500] {
        let o = Outcome::status(status, Duration::from_millis(3));
        agg.record(&o, &evaluate(&o, &checks));
    }

    let report = Report::build(&agg.snapshot());
    let c = report.checks["status was 200"];
    assert_eq!(c.passed, 7);
    assert_eq!(c.failed, 3);
    assert_eq!(report.total_requests, 10);
    assert_eq!(report.successes, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_concurrent_recorders_lose_no_updates() {
    const VUS: u64 = 50;
    const PER_VU: u64 = 2_000;

    let agg = Arc::new(Aggregator::new());
    let names: Arc<str> = Arc::from("ok");

    let mut tasks = Vec::new();
    for vu in 0..VUS {
        let agg = agg.clone();
        let names = names.clone();
        tasks.push(tokio::spawn(async move {
            let rec = agg.recorder(vu);
            for i in 0..PER_VU {
                let outcome = match i % 4 {
                    0 => Outcome::failure(ErrorKind::Timeout, Duration::from_micros(i + 1)),
                    1 => Outcome::status(500, Duration::from_micros(i + 1)),
                    _ => Outcome::status(200, Duration::from_micros(i + 1)),
                };
                let results = [CheckResult {
                    name: names.clone(),
                    passed: outcome.status_code() == Some(200),
                }];
                if i % 2 == 0 {
                    rec.record(&outcome, &results);
                } else {
                    agg.record(&outcome, &results);
                }
                if i % 256 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for t in tasks {
        t.await.unwrap_or_else(|e| panic!("recorder task failed: {e}"));
    }

    let s = agg.snapshot();
    let total = VUS * PER_VU;
    assert_eq!(s.total_requests, total);
    assert_eq!(s.failures_by_kind.get(&ErrorKind::Timeout), Some(&(total / 4)));
    assert_eq!(s.successes, total - total / 4);
    assert_eq!(s.status_codes.get(&500), Some(&(total / 4)));
    assert_eq!(s.status_codes.get(&200), Some(&(total / 2)));
    assert_eq!(s.latency.len(), total);
    let c = s.checks["ok"];
    assert_eq!(c.passed, total / 2);
    assert_eq!(c.failed, total / 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_vus_every_request_is_counted() {
    let executor = Arc::new(Delayed::new(Duration::from_millis(1)));
    let report = scheduler(
        RunConfig::new(template())
            .with_vus(50)
            .with_duration(Duration::from_millis(300))
            .with_check(check("ok", "status == 200")),
        executor.clone(),
    )
    .run()
    .await;

    assert_eq!(report.total_requests, executor.calls.load(Ordering::Relaxed));
    assert!(report.total_requests >= 50);
    assert_eq!(report.successes + report.failures(), report.total_requests);
    assert_eq!(report.checks["ok"].passed, report.total_requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_vu_one_second_ten_ms_requests() {
    let report = scheduler(
        RunConfig::new(template())
            .with_vus(1)
            .with_duration(Duration::from_secs(1))
            .with_check(check("ok", "status == 200")),
        Delayed::new(Duration::from_millis(10)),
    )
    .run()
    .await;

    assert!(
        (60..=101).contains(&report.total_requests),
        "total_requests={}",
        report.total_requests
    );
    assert_eq!(report.failures(), 0);
    assert_eq!(report.checks["ok"].failed, 0);
    assert_eq!(report.checks["ok"].passed, report.total_requests);
    assert!(!report.checks_failed());
    assert!(report.throughput_rps > 50.0);
}

#[tokio::test]
async fn always_timeout_still_reports() {
    let report = scheduler(
        RunConfig::new(template())
            .with_vus(2)
            .with_duration(Duration::from_millis(200)),
        AlwaysTimeout,
    )
    .run()
    .await;

    assert_eq!(report.successes, 0);
    assert!(report.total_requests > 0);
    assert_eq!(
        report.failures_by_kind.get(&ErrorKind::Timeout),
        Some(&report.total_requests)
    );
    assert_eq!(report.failures_by_kind.len(), 1);
    assert!(report.throughput_rps > 0.0);
    assert!((report.error_rate - 1.0).abs() < 1e-9);
    assert!(report.latency.is_some());
}

#[tokio::test]
async fn duration_overshoot_is_bounded_by_one_request() {
    let delay = Duration::from_millis(20);
    let duration = Duration::from_millis(300);
    let report = scheduler(
        RunConfig::new(template())
            .with_vus(4)
            .with_duration(duration),
        Delayed::new(delay),
    )
    .run()
    .await;

    assert!(report.duration_actual >= duration);
    // One in-flight request plus scheduling slack.
    assert!(
        report.duration_actual < duration + delay + Duration::from_millis(200),
        "duration_actual={:?}",
        report.duration_actual
    );
}

#[tokio::test]
async fn abort_drains_early_and_still_reports() {
    let s = scheduler(
        RunConfig::new(template())
            .with_vus(3)
            .with_duration(Duration::from_secs(60)),
        Delayed::new(Duration::from_millis(5)),
    );
    let handle = s.handle();
    let task = tokio::spawn(s.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.abort();

    let report = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap_or_else(|_| panic!("run did not stop after abort"))
        .unwrap_or_else(|e| panic!("run task failed: {e}"));

    assert_eq!(handle.state(), RunState::Completed);
    assert!(report.total_requests > 0);
    assert!(report.duration_actual < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_runs_coexist_in_one_process() {
    let a_exec = Arc::new(Delayed::new(Duration::from_millis(2)));
    let a = scheduler(
        RunConfig::new(template())
            .with_vus(2)
            .with_duration(Duration::from_millis(200))
            .with_check(check("a", "success")),
        a_exec.clone(),
    );
    let b = scheduler(
        RunConfig::new(template())
            .with_vus(1)
            .with_duration(Duration::from_millis(200))
            .with_check(check("b", "success")),
        AlwaysTimeout,
    );

    let (ra, rb) = tokio::join!(a.run(), b.run());

    assert_eq!(ra.total_requests, a_exec.calls.load(Ordering::Relaxed));
    assert_eq!(ra.failures(), 0);
    assert!(ra.checks.contains_key("a") && !ra.checks.contains_key("b"));

    assert_eq!(rb.successes, 0);
    assert!(rb.checks.contains_key("b") && !rb.checks.contains_key("a"));
}

#[tokio::test]
async fn build_is_idempotent_for_a_finished_run() {
    let s = scheduler(
        RunConfig::new(template()).with_duration(Duration::from_millis(100)),
        Delayed::new(Duration::from_millis(2)),
    );
    let agg = s.aggregator().clone();
    let report = s.run().await;

    let snapshot = agg.snapshot();
    assert_eq!(Report::build(&snapshot), Report::build(&snapshot));
    assert_eq!(Report::build(&snapshot), report);
}
