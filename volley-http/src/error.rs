use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HttpTransportErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    RequestBuild,
    HeaderName,
    HeaderValue,
    Timeout,
    ConnectTimeout,
    ConnectionRefused,
    Dns,
    Tls,
    Connect,
    Request,
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// and https:// URLs are supported: {0}")]
    UnsupportedScheme(String),

    #[error("http request build failed: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid http method: {0}")]
    Method(#[from] http::method::InvalidMethod),

    #[error("invalid http header name: {0}")]
    HeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid http header value: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("http request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("http request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    BodyRead(#[from] hyper::Error),
}

impl Error {
    #[must_use]
    pub fn transport_error_kind(&self) -> HttpTransportErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpTransportErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => HttpTransportErrorKind::UnsupportedScheme,
            Self::RequestBuild(_) | Self::Method(_) => HttpTransportErrorKind::RequestBuild,
            Self::HeaderName(_) => HttpTransportErrorKind::HeaderName,
            Self::HeaderValue(_) => HttpTransportErrorKind::HeaderValue,
            Self::Request(err) => classify_request_error(err),
            Self::Timeout(_) => HttpTransportErrorKind::Timeout,
            Self::BodyRead(err) if err.is_timeout() => HttpTransportErrorKind::Timeout,
            Self::BodyRead(_) => HttpTransportErrorKind::BodyRead,
        }
    }
}

/// Walks the source chain of a client error looking for the root cause.
///
/// The connector reports resolver failures as a `dns error` message and wraps socket errors
/// as `std::io::Error`; rustls failures surface as `InvalidData` io errors during connect.
fn classify_request_error(err: &hyper_util::client::legacy::Error) -> HttpTransportErrorKind {
    let mut saw_invalid_data = false;
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);

    while let Some(cur) = source {
        if cur.to_string().starts_with("dns error") {
            return HttpTransportErrorKind::Dns;
        }

        if let Some(io) = cur.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return HttpTransportErrorKind::ConnectionRefused;
                }
                std::io::ErrorKind::TimedOut => return HttpTransportErrorKind::ConnectTimeout,
                std::io::ErrorKind::InvalidData => saw_invalid_data = true,
                _ => {}
            }
        }

        source = cur.source();
    }

    if err.is_connect() {
        if saw_invalid_data {
            HttpTransportErrorKind::Tls
        } else {
            HttpTransportErrorKind::Connect
        }
    } else {
        HttpTransportErrorKind::Request
    }
}
