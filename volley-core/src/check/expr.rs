//! Textual check expressions.
//!
//! ```text
//! success
//! status == 200          (==, !=, <, <=, >, >=)
//! body contains <text>
//! header <name>
//! header <name> == <value>
//! latency < 500ms
//! ```

use super::{Predicate, StatusOp};

pub fn parse_predicate(raw: &str) -> Result<Predicate, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty check expression".to_string());
    }

    let (keyword, rest) = match s.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (s, ""),
    };

    match keyword.to_ascii_lowercase().as_str() {
        "success" if rest.is_empty() => Ok(Predicate::Success),
        "status" => parse_status(rest, raw),
        "body" => parse_body(rest, raw),
        "header" => parse_header(rest, raw),
        "latency" => parse_latency(rest, raw),
        _ => Err(format!("unknown check expression: {raw}")),
    }
}

fn split_op(s: &str) -> Option<(StatusOp, &str)> {
    // Two-character operators first so `<=` is not read as `<`.
    ["==", "!=", "<=", ">=", "<", ">"].iter().find_map(|tok| {
        s.strip_prefix(tok)
            .and_then(|rest| tok.parse::<StatusOp>().ok().map(|op| (op, rest.trim())))
    })
}

fn parse_status(rest: &str, raw: &str) -> Result<Predicate, String> {
    let (op, value) =
        split_op(rest).ok_or_else(|| format!("invalid check (missing operator): {raw}"))?;
    let code: u16 = value
        .parse()
        .map_err(|_| format!("invalid status code in check: {raw}"))?;
    if !(100..=999).contains(&code) {
        return Err(format!("status code out of range in check: {raw}"));
    }
    Ok(Predicate::Status(op, code))
}

fn parse_body(rest: &str, raw: &str) -> Result<Predicate, String> {
    let (sub, text) = match rest.split_once(char::is_whitespace) {
        Some((k, t)) => (k, t),
        None => (rest, ""),
    };
    if !sub.eq_ignore_ascii_case("contains") {
        return Err(format!("expected `body contains <text>`: {raw}"));
    }
    let text = unquote(text.trim());
    if text.is_empty() {
        return Err(format!("empty text in check: {raw}"));
    }
    Ok(Predicate::BodyContains(text.to_string()))
}

fn parse_header(rest: &str, raw: &str) -> Result<Predicate, String> {
    let (name, value) = match rest.split_once("==") {
        Some((n, v)) => (n.trim(), Some(unquote(v.trim()))),
        None => (rest, None),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name in check: {raw}"));
    }
    let name = name.to_ascii_lowercase();
    Ok(match value {
        Some(v) => Predicate::HeaderEquals(name, v.to_string()),
        None => Predicate::HeaderPresent(name),
    })
}

fn parse_latency(rest: &str, raw: &str) -> Result<Predicate, String> {
    let value = match split_op(rest) {
        Some((StatusOp::Lt, v)) => v,
        _ => return Err(format!("expected `latency < <duration>`: {raw}")),
    };
    let limit = humantime::parse_duration(value)
        .map_err(|e| format!("invalid duration in check `{raw}`: {e}"))?;
    if limit.is_zero() {
        return Err(format!("latency limit must be positive: {raw}"));
    }
    Ok(Predicate::LatencyBelow(limit))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(s: &str) -> Predicate {
        parse_predicate(s).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn parses_status_comparisons() {
        assert!(matches!(parse("status == 200"), Predicate::Status(StatusOp::Eq, 200)));
        assert!(matches!(parse("status<400"), Predicate::Status(StatusOp::Lt, 400)));
        assert!(matches!(parse("  STATUS >= 500 "), Predicate::Status(StatusOp::Ge, 500)));
        assert!(matches!(parse("status != 404"), Predicate::Status(StatusOp::Ne, 404)));
    }

    #[test]
    fn parses_body_header_latency_and_success() {
        assert!(matches!(parse("success"), Predicate::Success));
        assert!(matches!(parse("body contains \"ok\""), Predicate::BodyContains(ref t) if t == "ok"));
        assert!(matches!(parse("body contains Hello World"), Predicate::BodyContains(ref t) if t == "Hello World"));
        assert!(matches!(parse("BODY Contains Hello"), Predicate::BodyContains(ref t) if t == "Hello"));
        assert!(matches!(parse("header Content-Type"), Predicate::HeaderPresent(ref h) if h == "content-type"));
        assert!(matches!(
            parse("header content-type == text/html"),
            Predicate::HeaderEquals(ref h, ref v) if h == "content-type" && v == "text/html"
        ));
        assert!(matches!(
            parse("latency < 500ms"),
            Predicate::LatencyBelow(d) if d == Duration::from_millis(500)
        ));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for bad in [
            "",
            "status",
            "status == abc",
            "status == 70000",
            "status = 200",
            "body has x",
            "body contains",
            "header",
            "latency > 1s",
            "latency < soon",
            "success please",
            "bogus == 1",
        ] {
            assert!(parse_predicate(bad).is_err(), "accepted `{bad}`");
        }
    }
}
