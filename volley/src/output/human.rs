use anyhow::Context as _;
use std::io::Write as _;
use std::sync::Arc;

mod format;
mod progress;
mod summary;

use format::{format_duration, format_rate};
use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &volley_core::RunConfig) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "target: {} {}", cfg.target.method(), cfg.target.url())?;
        writeln!(
            out,
            "vus: {} duration: {} timeout: {} checks: {}",
            cfg.vus,
            format_duration(cfg.duration),
            format_duration(cfg.target.timeout()),
            cfg.checks.len()
        )?;
        if let Some(think) = cfg.think_time {
            writeln!(out, "think_time: {}", format_duration(think))?;
        }
        writeln!(out)?;
        out.flush().context("failed to write run header to stdout")
    }

    fn progress(&self) -> Option<volley_core::ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u: volley_core::ProgressUpdate| {
            let s = &u.snapshot;
            let message = format!(
                "vus={} elapsed={} rps={} requests={} failed={} checks_failed={}{}",
                u.vus,
                format_duration(u.elapsed),
                format_rate(u.rps_now),
                s.total_requests,
                s.failures(),
                s.checks_failed(),
                if u.state == volley_core::RunState::Draining {
                    " (draining)"
                } else {
                    ""
                }
            );
            progress.update(u.duration, u.elapsed, message);
        }))
    }

    fn print_summary(&self, report: &volley_core::Report) -> anyhow::Result<()> {
        self.progress.finish();
        let mut out = std::io::stdout().lock();
        out.write_all(render(report).as_bytes())
            .and_then(|()| out.flush())
            .context("failed to write summary to stdout")
    }
}
