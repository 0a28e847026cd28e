use std::fmt::Write as _;

use super::format::*;

pub(crate) fn render(report: &volley_core::Report) -> String {
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(
        &mut out,
        "  requests: {} (ok {}, failed {})",
        report.total_requests,
        report.successes,
        report.failures()
    )
    .ok();
    writeln!(
        &mut out,
        "  duration: {:.2}s",
        report.duration_actual.as_secs_f64()
    )
    .ok();
    writeln!(
        &mut out,
        "  rates: rps={} recv={}/s error_rate={}",
        format_rate(report.throughput_rps),
        format_bytes(report.bytes_received_per_sec.round() as u64),
        format_percent(report.error_rate)
    )
    .ok();
    writeln!(
        &mut out,
        "  bytes: recv {}",
        format_bytes(report.bytes_received)
    )
    .ok();

    if !report.status_codes.is_empty() {
        let codes = report
            .status_codes
            .iter()
            .map(|(code, n)| format!("{code}={n}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(&mut out, "  status: {codes}").ok();
    }

    if !report.failures_by_kind.is_empty() {
        out.push_str("  errors:\n");
        for (kind, n) in &report.failures_by_kind {
            writeln!(&mut out, "    {kind}: {n}").ok();
        }
    }

    if let Some(l) = &report.latency {
        writeln!(
            &mut out,
            "  latency = p50={} p90={} p95={} p99={} min={} mean={} max={} (n={})",
            format_latency(l.p50),
            format_latency(l.p90),
            format_latency(l.p95),
            format_latency(l.p99),
            format_latency(l.min),
            format_latency(l.mean),
            format_latency(l.max),
            l.count
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    if !report.checks.is_empty() {
        out.push_str("checks\n");
        for (name, c) in &report.checks {
            let mark = if c.failed == 0 { "ok  " } else { "FAIL" };
            writeln!(
                &mut out,
                "  {mark} {name}: passed {} failed {} ({})",
                c.passed,
                c.failed,
                format_percent(c.pass_rate)
            )
            .ok();
        }
    }

    out
}
