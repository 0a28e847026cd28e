use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt as _;

use crate::aggregator::Recorder;
use crate::check::{Check, evaluate};
use crate::executor::RequestExecutor;
use crate::outcome::{ErrorKind, Outcome};
use crate::signal::Signal;
use crate::template::RequestTemplate;

/// Handles one virtual user needs. Everything is shared with the scheduler through `Arc`s.
#[derive(Debug)]
pub struct VuContext<E> {
    pub vu_id: u64,
    pub executor: Arc<E>,
    pub template: Arc<RequestTemplate>,
    pub checks: Arc<[Check]>,
    pub think_time: Option<Duration>,
    pub start: Arc<Signal>,
    pub stop: Arc<Signal>,
    pub recorder: Recorder,
}

#[derive(Debug)]
pub struct VirtualUser<E> {
    ctx: VuContext<E>,
}

impl<E: RequestExecutor> VirtualUser<E> {
    pub fn new(ctx: VuContext<E>) -> Self {
        Self { ctx }
    }

    /// Waits for the start signal, then loops until the stop signal is raised.
    ///
    /// The stop signal is checked before every request, so once observed no new request is
    /// started. Returns the number of completed iterations.
    pub async fn run(self) -> u64 {
        let ctx = self.ctx;
        ctx.start.wait().await;
        tracing::debug!(vu_id = ctx.vu_id, "vu started");

        let mut iterations: u64 = 0;
        while !ctx.stop.is_raised() {
            let outcome = execute_guarded(&*ctx.executor, &ctx.template, ctx.vu_id).await;
            let results = evaluate(&outcome, &ctx.checks);
            ctx.recorder.record(&outcome, &results);
            iterations = iterations.saturating_add(1);

            if let Some(think) = ctx.think_time {
                tokio::select! {
                    _ = tokio::time::sleep(think) => {}
                    _ = ctx.stop.wait() => break,
                }
            }
        }

        tracing::debug!(vu_id = ctx.vu_id, iterations, "vu stopped");
        iterations
    }
}

/// A panicking executor costs one `Failure{other}`, not the VU.
async fn execute_guarded<E: RequestExecutor>(
    executor: &E,
    template: &RequestTemplate,
    vu_id: u64,
) -> Outcome {
    let started = Instant::now();
    match AssertUnwindSafe(executor.execute(template))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            tracing::warn!(
                vu_id,
                panic = panic_message(panic.as_ref()),
                "request executor panicked"
            );
            Outcome::Failure {
                kind: ErrorKind::Other,
                latency: started.elapsed(),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}
