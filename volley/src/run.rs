use anyhow::Context as _;
use std::collections::BTreeMap;

use volley_core::{Check, HttpExecutor, HttpRequest, RequestTemplate, RunConfig, Scheduler};

use crate::cli::RunArgs;
use crate::env::{EnvVars, interpolate, merged_env};
use crate::exit_codes::ExitCode;
use crate::output;
use crate::plan::{self, Plan, YamlDuration};
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let plan = match &args.plan {
        Some(path) => plan::load(path).await.map_err(RunError::InvalidInput)?,
        None => Plan::default(),
    };
    let env = merged_env(&args.env).map_err(RunError::InvalidInput)?;

    let cfg = resolve_config(&args, plan, &env)?;
    cfg.validate()?;

    out.print_header(&cfg).map_err(RunError::RuntimeError)?;

    let mut scheduler = Scheduler::new(cfg, HttpExecutor::default())?;
    if let Some(progress) = out.progress() {
        scheduler = scheduler.with_progress(progress);
    }

    let handle = scheduler.handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("interrupted, draining virtual users (Ctrl-C again to exit now)");
        handle.abort();

        // Draining can take up to one request timeout.
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted twice, exiting without a summary");
            std::process::exit(ExitCode::RuntimeError.as_i32());
        }
    });

    let report = scheduler.run().await;
    ctrl_c.abort();

    out.print_summary(&report)
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_checks(report.checks_failed()))
}

/// Flags win over the plan file, which wins over built-in defaults.
fn resolve_config(args: &RunArgs, plan: Plan, env: &EnvVars) -> Result<RunConfig, RunError> {
    let Plan {
        vus,
        duration,
        think_time,
        target,
        checks: plan_checks,
    } = plan;

    let url = args
        .url
        .as_deref()
        .or(target.url.as_deref())
        .context("missing target url (pass --url or set `target.url` in the plan file)")
        .map_err(RunError::InvalidInput)?;
    let url = interpolate(url, env)
        .context("invalid target url")
        .map_err(RunError::InvalidInput)?;

    let method = args
        .method
        .clone()
        .or(target.method)
        .unwrap_or_else(|| "GET".to_string());

    // Header names compare case-insensitively; a flag replaces the plan's value.
    let mut headers: BTreeMap<String, (String, String)> = target
        .headers
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), (k, v)))
        .collect();
    for (k, v) in &args.headers {
        headers.insert(k.to_ascii_lowercase(), (k.clone(), v.clone()));
    }
    let headers = headers
        .into_values()
        .map(|(k, v)| {
            let v = interpolate(&v, env).with_context(|| format!("invalid header `{k}`"))?;
            Ok((k, v))
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(RunError::InvalidInput)?;

    let body = match args.body.as_deref().or(target.body.as_deref()) {
        Some(raw) => interpolate(raw, env)
            .context("invalid request body")
            .map_err(RunError::InvalidInput)?,
        None => String::new(),
    };

    let request = HttpRequest {
        method,
        url,
        headers,
        body: body.into(),
        timeout: args.timeout.or(target.timeout.map(YamlDuration::into_inner)),
    };
    let template = RequestTemplate::new(request)?;

    let mut cfg = RunConfig::new(template).with_think_time(
        args.think_time
            .or(think_time.map(YamlDuration::into_inner)),
    );
    if let Some(vus) = args.vus.or(vus) {
        cfg = cfg.with_vus(vus);
    }
    if let Some(duration) = args.duration.or(duration.map(YamlDuration::into_inner)) {
        cfg = cfg.with_duration(duration);
    }

    // Plan checks keep their file order; a flag with a known name replaces it in place.
    let mut checks = plan_checks;
    for (name, expr) in &args.checks {
        checks.insert(name.clone(), expr.clone());
    }
    for (name, expr) in checks {
        cfg = cfg.with_check(Check::parse(name, &expr)?);
    }

    Ok(cfg)
}
