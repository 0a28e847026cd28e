use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CheckError;
use crate::outcome::Outcome;
use crate::{Error, Result};

mod expr;

pub use expr::parse_predicate;

pub type CheckFn = dyn Fn(&Outcome) -> std::result::Result<bool, CheckError> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum StatusOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

impl StatusOp {
    pub fn apply(self, left: u16, right: u16) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
        }
    }
}

#[derive(Clone)]
pub enum Predicate {
    /// The request produced a response (any status).
    Success,
    Status(StatusOp, u16),
    BodyContains(String),
    HeaderPresent(String),
    HeaderEquals(String, String),
    LatencyBelow(Duration),
    Custom(Arc<CheckFn>),
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Status(op, code) => write!(f, "Status({op} {code})"),
            Self::BodyContains(s) => f.debug_tuple("BodyContains").field(s).finish(),
            Self::HeaderPresent(h) => f.debug_tuple("HeaderPresent").field(h).finish(),
            Self::HeaderEquals(h, v) => f.debug_tuple("HeaderEquals").field(h).field(v).finish(),
            Self::LatencyBelow(d) => f.debug_tuple("LatencyBelow").field(d).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Predicate {
    /// Response-dependent predicates are `false` on a failed request.
    pub fn eval(&self, outcome: &Outcome) -> std::result::Result<bool, CheckError> {
        let res = match self {
            Self::Success => outcome.is_success(),
            Self::Status(op, code) => outcome.status_code().is_some_and(|s| op.apply(s, *code)),
            Self::BodyContains(needle) => outcome
                .response()
                .is_some_and(|r| contains(&r.body, needle.as_bytes())),
            Self::HeaderPresent(name) => outcome
                .response()
                .is_some_and(|r| r.header(name).is_some()),
            Self::HeaderEquals(name, value) => outcome
                .response()
                .and_then(|r| r.header(name))
                .is_some_and(|v| v == value),
            Self::LatencyBelow(limit) => outcome.latency() < *limit,
            Self::Custom(f) => return f(outcome),
        };
        Ok(res)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// A named boolean assertion evaluated against every outcome.
#[derive(Debug, Clone)]
pub struct Check {
    name: Arc<str>,
    predicate: Predicate,
}

impl Check {
    pub fn new(name: impl Into<Arc<str>>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    pub fn custom<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Outcome) -> std::result::Result<bool, CheckError> + Send + Sync + 'static,
    {
        Self::new(name, Predicate::Custom(Arc::new(f)))
    }

    /// Builds a check from a textual expression such as `status == 200`.
    pub fn parse(name: impl Into<Arc<str>>, expr: &str) -> Result<Self> {
        let name = name.into();
        let predicate =
            parse_predicate(expr).map_err(|e| Error::InvalidCheck(format!("`{name}`: {e}")))?;
        Ok(Self { name, predicate })
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: Arc<str>,
    pub passed: bool,
}

/// Runs every check against `outcome`, in order.
///
/// A predicate that errors or panics is recorded as failed; it never propagates.
pub fn evaluate(outcome: &Outcome, checks: &[Check]) -> Vec<CheckResult> {
    checks
        .iter()
        .map(|check| {
            let passed = match catch_unwind(AssertUnwindSafe(|| check.predicate.eval(outcome))) {
                Ok(Ok(passed)) => passed,
                Ok(Err(err)) => {
                    tracing::debug!(check = %check.name, %err, "check errored");
                    false
                }
                Err(_) => {
                    tracing::debug!(check = %check.name, "check panicked");
                    false
                }
            };
            CheckResult {
                name: check.name.clone(),
                passed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ErrorKind, ResponseMeta};
    use bytes::Bytes;

    fn ok_with(body: &'static str, headers: &[(&str, &str)]) -> Outcome {
        Outcome::Success {
            status: 200,
            response: ResponseMeta {
                body: Bytes::from_static(body.as_bytes()),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                bytes_received: body.len() as u64,
            },
            latency: Duration::from_millis(20),
        }
    }

    #[test]
    fn results_follow_check_order() {
        let checks = vec![
            Check::new("ok", Predicate::Status(StatusOp::Eq, 200)),
            Check::new("fast", Predicate::LatencyBelow(Duration::from_millis(10))),
            Check::new("any", Predicate::Success),
        ];
        let results = evaluate(&Outcome::status(200, Duration::from_millis(20)), &checks);

        let got: Vec<(&str, bool)> = results.iter().map(|r| (&*r.name, r.passed)).collect();
        assert_eq!(got, vec![("ok", true), ("fast", false), ("any", true)]);
    }

    #[test]
    fn response_predicates_are_false_on_failure() {
        let failure = Outcome::failure(ErrorKind::Timeout, Duration::from_secs(1));
        for p in [
            Predicate::Success,
            Predicate::Status(StatusOp::Ne, 200),
            Predicate::BodyContains(String::new()),
            Predicate::HeaderPresent("x".into()),
            Predicate::HeaderEquals("x".into(), "y".into()),
        ] {
            assert_eq!(p.eval(&failure), Ok(false), "{p:?}");
        }
    }

    #[test]
    fn body_and_header_predicates() {
        let o = ok_with("hello world", &[("content-type", "text/plain")]);
        assert_eq!(Predicate::BodyContains("lo wo".into()).eval(&o), Ok(true));
        assert_eq!(Predicate::BodyContains("nope".into()).eval(&o), Ok(false));
        assert_eq!(
            Predicate::BodyContains("a much longer needle than the body".into()).eval(&o),
            Ok(false)
        );
        assert_eq!(Predicate::HeaderPresent("Content-Type".into()).eval(&o), Ok(true));
        assert_eq!(
            Predicate::HeaderEquals("content-type".into(), "text/plain".into()).eval(&o),
            Ok(true)
        );
        assert_eq!(
            Predicate::HeaderEquals("content-type".into(), "text/html".into()).eval(&o),
            Ok(false)
        );
    }

    #[test]
    fn erroring_and_panicking_checks_fail_without_propagating() {
        let checks = vec![
            Check::custom("errors", |_| Err(CheckError::new("boom"))),
            Check::custom("panics", |_| panic!("predicate bug")),
            Check::custom("fine", |o| Ok(o.is_success())),
        ];
        let results = evaluate(&Outcome::status(200, Duration::ZERO), &checks);
        let passed: Vec<bool> = results.iter().map(|r| r.passed).collect();
        assert_eq!(passed, vec![false, false, true]);
    }

    #[test]
    fn parse_reports_check_name_on_error() {
        let err = match Check::parse("bad one", "status ~ 200") {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::InvalidCheck(ref m) if m.contains("bad one")));
    }
}
