use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use volley_http::{DEFAULT_REQUEST_TIMEOUT, HttpRequest, PreparedRequest};

use crate::{Error, Result};

/// The request every virtual user issues, validated once up front.
///
/// Holds both the user-facing description and its prepared form, so the hot path never
/// re-parses the URL or headers.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    request: HttpRequest,
    prepared: Arc<PreparedRequest>,
}

impl RequestTemplate {
    pub fn new(request: HttpRequest) -> Result<Self> {
        if request.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidTarget(
                "`timeout` must be a positive duration".to_string(),
            ));
        }

        let prepared = request.prepare().map_err(|err| match err {
            volley_http::Error::HeaderName(_) | volley_http::Error::HeaderValue(_) => {
                Error::InvalidHeader(err.to_string())
            }
            other => Error::InvalidTarget(other.to_string()),
        })?;

        Ok(Self {
            request,
            prepared: Arc::new(prepared),
        })
    }

    pub fn get(url: impl Into<String>) -> Result<Self> {
        Self::new(HttpRequest::get(url))
    }

    pub fn method(&self) -> &str {
        self.prepared.method().as_str()
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.request.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.request.body
    }

    /// Effective per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.request.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn prepared(&self) -> &PreparedRequest {
        &self.prepared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_to_thirty_seconds() {
        let t = RequestTemplate::get("http://localhost/").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(t.timeout(), Duration::from_secs(30));
        assert_eq!(t.method(), "GET");
    }

    #[test]
    fn invalid_inputs_are_configuration_errors() {
        let err = match RequestTemplate::get("localhost:8080") {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::InvalidTarget(_)));

        let mut req = HttpRequest::get("http://localhost/");
        req.headers.push(("x-ok".to_string(), "bad\nvalue".to_string()));
        assert!(matches!(
            RequestTemplate::new(req),
            Err(Error::InvalidHeader(_))
        ));

        let mut req = HttpRequest::get("http://localhost/");
        req.timeout = Some(Duration::ZERO);
        assert!(matches!(
            RequestTemplate::new(req),
            Err(Error::InvalidTarget(_))
        ));
    }
}
