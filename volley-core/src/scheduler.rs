use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use tokio::time::MissedTickBehavior;
use volley_metrics::{RunningStats, per_sec};

use crate::aggregator::Aggregator;
use crate::check::Check;
use crate::config::RunConfig;
use crate::executor::RequestExecutor;
use crate::progress::{ProgressFn, ProgressUpdate};
use crate::report::Report;
use crate::signal::Signal;
use crate::vu::{VirtualUser, VuContext};
use crate::Result;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::IntoStaticStr,
    strum::FromRepr,
)]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Draining = 2,
    Completed = 3,
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(RunState::Idle as u8))
    }

    fn get(&self) -> RunState {
        RunState::from_repr(self.0.load(Ordering::Acquire)).unwrap_or(RunState::Idle)
    }

    fn set(&self, state: RunState) {
        self.0.store(state as u8, Ordering::Release);
        tracing::info!(%state, "run state changed");
    }
}

/// Observe or abort a run from outside the scheduler (e.g. a Ctrl-C handler).
#[derive(Debug, Clone)]
pub struct RunHandle {
    state: Arc<StateCell>,
    stop: Arc<Signal>,
}

impl RunHandle {
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Ends the run early. In-flight requests finish; the report is still produced.
    pub fn abort(&self) {
        if !self.stop.is_raised() {
            tracing::info!("run aborted");
        }
        self.stop.raise();
    }
}

/// Owns one run: spawns the virtual users, enforces the duration, drains and reports.
///
/// All run state lives here and in the `Arc`s handed to VUs, so independent schedulers can run
/// side by side in one process.
pub struct Scheduler<E> {
    config: RunConfig,
    executor: Arc<E>,
    aggregator: Arc<Aggregator>,
    state: Arc<StateCell>,
    stop: Arc<Signal>,
    progress: Option<ProgressFn>,
}

impl<E: RequestExecutor> Scheduler<E> {
    /// Fails with a configuration error before anything is spawned.
    pub fn new(config: RunConfig, executor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            executor: Arc::new(executor),
            aggregator: Arc::new(Aggregator::new()),
            state: Arc::new(StateCell::new()),
            stop: Arc::new(Signal::new()),
            progress: None,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn handle(&self) -> RunHandle {
        RunHandle {
            state: self.state.clone(),
            stop: self.stop.clone(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Drives the run to completion. Always produces a report, whatever the failure rate.
    pub async fn run(self) -> Report {
        let Self {
            config,
            executor,
            aggregator,
            state,
            stop,
            progress,
        } = self;
        let RunConfig {
            vus,
            duration,
            target,
            checks,
            think_time,
            progress_interval,
        } = config;

        let template = Arc::new(target);
        let checks: Arc<[Check]> = Arc::from(checks);
        let start = Arc::new(Signal::new());

        let mut handles = Vec::with_capacity(usize::try_from(vus).unwrap_or(0));
        for vu_id in 1..=vus {
            let ctx = VuContext {
                vu_id,
                executor: executor.clone(),
                template: template.clone(),
                checks: checks.clone(),
                think_time,
                start: start.clone(),
                stop: stop.clone(),
                recorder: aggregator.recorder(vu_id),
            };
            handles.push(tokio::spawn(VirtualUser::new(ctx).run()));
        }

        tracing::info!(
            vus,
            duration = ?duration,
            method = template.method(),
            url = template.url(),
            checks = checks.len(),
            "run starting"
        );
        aggregator.start();
        state.set(RunState::Running);
        start.raise();

        let progress_task = progress.map(|progress| {
            tokio::spawn(report_progress(
                progress,
                aggregator.clone(),
                state.clone(),
                progress_interval,
                duration,
                vus,
            ))
        });

        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                tracing::debug!("run duration elapsed");
            }
            _ = stop.wait() => {}
        }
        state.set(RunState::Draining);
        stop.raise();

        let mut iterations: u64 = 0;
        for handle in handles {
            match handle.await {
                Ok(n) => iterations = iterations.saturating_add(n),
                Err(err) => tracing::warn!(%err, "virtual user task failed"),
            }
        }

        aggregator.seal();
        if let Some(task) = progress_task {
            task.abort();
            let _ = task.await;
        }
        state.set(RunState::Completed);

        let report = Report::build(&aggregator.snapshot());
        tracing::info!(
            iterations,
            total_requests = report.total_requests,
            elapsed = ?report.duration_actual,
            "run completed"
        );
        report
    }
}

async fn report_progress(
    progress: ProgressFn,
    aggregator: Arc<Aggregator>,
    state: Arc<StateCell>,
    interval: std::time::Duration,
    duration: std::time::Duration,
    vus: u64,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tick: u64 = 0;
    let mut last_at = Instant::now();
    let mut last_total: u64 = 0;
    let mut rps = RunningStats::default();

    loop {
        ticker.tick().await;

        let now = Instant::now();
        let dt = now.duration_since(last_at);
        last_at = now;
        tick = tick.saturating_add(1);

        let snapshot = aggregator.snapshot();
        let delta = snapshot.total_requests.saturating_sub(last_total);
        last_total = snapshot.total_requests;
        let rps_now = per_sec(delta, dt.as_secs_f64());
        rps.push(rps_now);

        progress(ProgressUpdate {
            tick,
            elapsed: snapshot.elapsed,
            duration,
            vus,
            state: state.get(),
            snapshot,
            rps_now,
            rps,
        });
    }
}
