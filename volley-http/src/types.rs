use std::time::Duration;

use bytes::Bytes;

use super::util::{has_header, host_header_value};
use super::{Error, Result};

/// A request description as written by the user (method/url/headers as strings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Per-request timeout; the client default applies when unset.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Bytes) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout: None,
        }
    }

    /// Parses and validates everything that does not change between sends.
    ///
    /// Implicit `Host`/`Content-Length` headers are made explicit here so no per-send header
    /// work remains.
    pub fn prepare(&self) -> Result<PreparedRequest> {
        let method = http::Method::from_bytes(self.method.trim().to_ascii_uppercase().as_bytes())?;

        let parsed = url::Url::parse(&self.url).map_err(|_| Error::InvalidUrl(self.url.clone()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::UnsupportedScheme(self.url.clone()));
        }
        let uri: hyper::Uri = self
            .url
            .parse()
            .map_err(|_| Error::InvalidUrl(self.url.clone()))?;

        let mut headers = http::HeaderMap::with_capacity(self.headers.len() + 2);
        if !has_header(&self.headers, "host")
            && let Some(host) = host_header_value(&parsed)
        {
            headers.insert(http::header::HOST, http::HeaderValue::from_str(&host)?);
        }
        if !self.body.is_empty() && !has_header(&self.headers, "content-length") {
            headers.insert(http::header::CONTENT_LENGTH, self.body.len().into());
        }
        for (k, v) in &self.headers {
            let name = http::header::HeaderName::from_bytes(k.trim().as_bytes())?;
            let value = http::header::HeaderValue::from_str(v.trim())?;
            headers.append(name, value);
        }

        Ok(PreparedRequest {
            method,
            uri,
            headers,
            body: self.body.clone(),
            timeout: self.timeout,
        })
    }
}

/// A validated request that can be sent any number of times without re-parsing.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub(crate) method: http::Method,
    pub(crate) uri: hyper::Uri,
    pub(crate) headers: http::HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) timeout: Option<Duration>,
}

impl PreparedRequest {
    #[must_use]
    pub fn method(&self) -> &http::Method {
        &self.method
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    /// Response headers (lowercased names). Multiple values are joined with ", ".
    pub headers: Vec<(String, String)>,
    /// Estimated bytes received (status line + headers + body).
    pub bytes_received: u64,
}

impl HttpResponse {
    pub fn body_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
