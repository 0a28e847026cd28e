//! Best-effort HTTP/1.1 response size accounting.

/// Status line (reason phrase ignored) + headers + CRLF.
pub(super) fn estimate_response_head_bytes(
    version: http::Version,
    status: http::StatusCode,
    headers: &http::HeaderMap,
) -> u64 {
    let version_len = match version {
        http::Version::HTTP_10 => "HTTP/1.0".len(),
        http::Version::HTTP_2 => "HTTP/2".len(),
        http::Version::HTTP_3 => "HTTP/3".len(),
        _ => "HTTP/1.1".len(),
    };
    let status_line = (version_len + 1 + status.as_str().len() + 2) as u64;

    status_line
        .saturating_add(headers_bytes(headers))
        .saturating_add(2)
}

fn headers_bytes(headers: &http::HeaderMap) -> u64 {
    // "name: value\r\n"
    headers
        .iter()
        .map(|(name, value)| (name.as_str().len() + 2 + value.len() + 2) as u64)
        .fold(0u64, u64::saturating_add)
}
