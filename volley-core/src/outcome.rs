use std::time::Duration;

use bytes::Bytes;
use volley_http::HttpTransportErrorKind;

/// Why a request produced no response.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::EnumCount,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    Timeout,
    ConnectionRefused,
    Dns,
    Transport,
    Other,
}

impl From<HttpTransportErrorKind> for ErrorKind {
    fn from(kind: HttpTransportErrorKind) -> Self {
        match kind {
            HttpTransportErrorKind::Timeout | HttpTransportErrorKind::ConnectTimeout => {
                Self::Timeout
            }
            HttpTransportErrorKind::ConnectionRefused => Self::ConnectionRefused,
            HttpTransportErrorKind::Dns => Self::Dns,
            HttpTransportErrorKind::Tls
            | HttpTransportErrorKind::Connect
            | HttpTransportErrorKind::Request
            | HttpTransportErrorKind::BodyRead => Self::Transport,
            HttpTransportErrorKind::InvalidUrl
            | HttpTransportErrorKind::UnsupportedScheme
            | HttpTransportErrorKind::RequestBuild
            | HttpTransportErrorKind::HeaderName
            | HttpTransportErrorKind::HeaderValue => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub body: Bytes,
    /// Lowercased names.
    pub headers: Vec<(String, String)>,
    pub bytes_received: u64,
}

impl ResponseMeta {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Result of one request attempt. Any response, 4xx/5xx included, is a `Success`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        status: u16,
        response: ResponseMeta,
        latency: Duration,
    },
    Failure {
        kind: ErrorKind,
        latency: Duration,
    },
}

impl Outcome {
    /// A success with an empty body and no headers.
    pub fn status(status: u16, latency: Duration) -> Self {
        Self::Success {
            status,
            response: ResponseMeta::default(),
            latency,
        }
    }

    pub fn failure(kind: ErrorKind, latency: Duration) -> Self {
        Self::Failure { kind, latency }
    }

    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. } | Self::Failure { latency, .. } => *latency,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&ResponseMeta> {
        match self {
            Self::Success { response, .. } => Some(response),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}
