use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    // Bare integers are seconds.
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(s)
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))
}

fn parse_header(input: &str) -> Result<(String, String), String> {
    let (k, v) = input
        .split_once(':')
        .ok_or_else(|| format!("invalid header '{input}' (expected NAME:VALUE)"))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("invalid header '{input}' (empty NAME)"));
    }
    Ok((k.to_string(), v.trim().to_string()))
}

fn parse_check(input: &str) -> Result<(String, String), String> {
    let (name, expr) = input
        .split_once('=')
        .ok_or_else(|| format!("invalid check '{input}' (expected NAME=EXPR)"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid check '{input}' (empty NAME)"));
    }
    Ok((name.to_string(), expr.trim().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bar on stderr and a text summary on stdout.
    HumanReadable,
    /// Emit JSON progress lines and a summary line (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "volley",
    author,
    version,
    about = "HTTP load generator with per-response checks",
    long_about = "volley drives a fixed number of virtual users against one HTTP endpoint for a fixed duration, evaluates checks on every response and prints a latency/throughput summary.\n\nA run is described by CLI flags, an optional YAML plan file, or both (flags win).\n\n`${VAR}` placeholders in the URL, header values and body are resolved from the process environment; use `--env KEY=VALUE` to add/override values.",
    after_help = "Examples:\n  volley run --url http://localhost:8080/ --vus 10 --duration 30s\n  volley run plan.yaml --check 'ok=status == 200'\n  volley run plan.yaml --env APP_URL=https://staging.example.com --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a load test
    #[command(
        long_about = "Run a load test against a single HTTP endpoint.\n\nCLI flags override values from the plan file, which override the built-in defaults (1 VU, 10s, GET)."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to a YAML plan file
    pub plan: Option<PathBuf>,

    /// Target URL (http:// or https://)
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP method
    #[arg(long, short = 'X')]
    pub method: Option<String>,

    /// Request header (repeatable, NAME:VALUE)
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body
    #[arg(long)]
    pub body: Option<String>,

    /// Number of virtual users
    #[arg(long)]
    pub vus: Option<u64>,

    /// Test duration (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Per-request timeout (default 30s)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Pause between iterations of each virtual user
    #[arg(long, value_parser = parse_duration)]
    pub think_time: Option<Duration>,

    /// Named check evaluated on every response (repeatable, NAME=EXPR), e.g. 'ok=status == 200'
    #[arg(long = "check", value_name = "NAME=EXPR", value_parser = parse_check)]
    pub checks: Vec<(String, String)>,

    /// Add/override env vars used for `${VAR}` interpolation (repeatable, KEY=VALUE).
    /// CLI-provided vars override the current process env.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log filter (e.g. info, volley_core=debug). Overrides RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(2 * 60 * 60)));
        assert_eq!(parse_duration("5"), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn parse_header_and_check_split_once() {
        assert_eq!(
            parse_header("authorization: Bearer a:b"),
            Ok(("authorization".to_string(), "Bearer a:b".to_string()))
        );
        assert!(parse_header("no-colon").is_err());
        assert_eq!(
            parse_check("ok=status == 200"),
            Ok(("ok".to_string(), "status == 200".to_string()))
        );
        assert!(parse_check("=status == 200").is_err());
    }

    #[test]
    fn cli_parses_run() {
        let parsed = Cli::try_parse_from([
            "volley",
            "run",
            "plan.yaml",
            "--url",
            "http://localhost:8080/",
            "-X",
            "POST",
            "-H",
            "x-test: 1",
            "--vus",
            "2",
            "--duration",
            "250ms",
            "--check",
            "ok=status == 200",
            "--env",
            "FOO=bar",
            "--env",
            "EMPTY=",
            "--output",
            "json",
        ]);

        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Run(args) = cli.command;
        assert_eq!(args.plan, Some(PathBuf::from("plan.yaml")));
        assert_eq!(args.url.as_deref(), Some("http://localhost:8080/"));
        assert_eq!(args.method.as_deref(), Some("POST"));
        assert_eq!(args.headers, vec![("x-test".to_string(), "1".to_string())]);
        assert_eq!(args.vus, Some(2));
        assert_eq!(args.duration, Some(Duration::from_millis(250)));
        assert_eq!(
            args.checks,
            vec![("ok".to_string(), "status == 200".to_string())]
        );
        assert_eq!(args.env, vec!["FOO=bar".to_string(), "EMPTY=".to_string()]);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.timeout, None);
    }

    #[test]
    fn cli_rejects_bad_duration() {
        assert!(Cli::try_parse_from(["volley", "run", "--duration", "10x"]).is_err());
    }
}
