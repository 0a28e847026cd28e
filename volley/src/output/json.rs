use serde::Serialize;
use std::collections::BTreeMap;
use anyhow::Context as _;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _cfg: &volley_core::RunConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn progress(&self) -> Option<volley_core::ProgressFn> {
        Some(Arc::new(move |u: volley_core::ProgressUpdate| {
            let line = build_progress_line(&u);
            // A broken stdout surfaces when the summary is written.
            let _ = emit_json_line(&line);
        }))
    }

    fn print_summary(&self, report: &volley_core::Report) -> anyhow::Result<()> {
        let line = build_summary_line(report);
        emit_json_line(&line).context("failed to write summary to stdout")
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub state: &'static str,
    pub elapsed_secs: f64,
    pub vus: u64,

    pub requests_per_sec: f64,
    pub total_requests: u64,
    pub failed_requests_total: u64,
    pub checks_failed_total: u64,
    pub bytes_received_total: u64,

    pub latency_p50_ms: Option<f64>,
    pub latency_p99_ms: Option<f64>,

    pub req_per_sec_avg: f64,
    pub req_per_sec_stdev: f64,
    pub req_per_sec_max: f64,
}

fn build_progress_line(u: &volley_core::ProgressUpdate) -> JsonProgressLine {
    let s = &u.snapshot;
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        state: u.state.into(),
        elapsed_secs: u.elapsed.as_secs_f64(),
        vus: u.vus,

        requests_per_sec: u.rps_now,
        total_requests: s.total_requests,
        failed_requests_total: s.failures(),
        checks_failed_total: s.checks_failed(),
        bytes_received_total: s.bytes_received,

        latency_p50_ms: s.latency.quantile(0.50).map(ms),
        latency_p99_ms: s.latency.quantile(0.99).map(ms),

        req_per_sec_avg: u.rps.mean(),
        req_per_sec_stdev: u.rps.stdev(),
        req_per_sec_max: u.rps.max(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub total_requests: u64,
    pub successes: u64,
    pub failures_by_kind: BTreeMap<String, u64>,
    pub status_codes: BTreeMap<String, u64>,
    pub latency: Option<JsonLatencySummary>,
    pub checks: BTreeMap<String, JsonCheckSummary>,
    pub checks_failed_total: u64,
    pub throughput_rps: f64,
    pub error_rate: f64,
    pub bytes_received: u64,
    pub bytes_received_per_sec: f64,
    pub duration_actual_secs: f64,
}

/// Milliseconds.
#[derive(Debug, Serialize)]
pub(crate) struct JsonLatencySummary {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stdev: f64,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCheckSummary {
    pub passed: u64,
    pub failed: u64,
    pub pass_rate: f64,
}

fn build_summary_line(report: &volley_core::Report) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        total_requests: report.total_requests,
        successes: report.successes,
        failures_by_kind: report
            .failures_by_kind
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        status_codes: report
            .status_codes
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        latency: report.latency.as_ref().map(|l| JsonLatencySummary {
            p50: ms(l.p50),
            p90: ms(l.p90),
            p95: ms(l.p95),
            p99: ms(l.p99),
            min: ms(l.min),
            max: ms(l.max),
            mean: ms(l.mean),
            stdev: ms(l.stdev),
            count: l.count,
        }),
        checks: report
            .checks
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    JsonCheckSummary {
                        passed: c.passed,
                        failed: c.failed,
                        pass_rate: c.pass_rate,
                    },
                )
            })
            .collect(),
        checks_failed_total: report.checks_failed_total(),
        throughput_rps: report.throughput_rps,
        error_rate: report.error_rate,
        bytes_received: report.bytes_received,
        bytes_received_per_sec: report.bytes_received_per_sec,
        duration_actual_secs: report.duration_actual.as_secs_f64(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, line)?;
    writeln!(out)?;
    out.flush()
}
