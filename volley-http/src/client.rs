use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::Request;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::collections::BTreeMap;
use std::time::Duration;

use super::estimate::estimate_response_head_bytes;
use super::{Error, HttpResponse, PreparedRequest, Result};

/// The OS-level TCP connect timeout can be tens of seconds, which makes runs against an
/// unreachable host look hung.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Applied to every request that does not carry its own timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pooled HTTP/1.1 client (http and https). Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    request_timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CONNECT_TIMEOUT), DEFAULT_REQUEST_TIMEOUT)
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>, request_timeout: Duration) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(connect_timeout);
        http_connector.set_nodelay(true);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let inner = Client::builder(TokioExecutor::new()).build(https_connector);

        Self {
            inner,
            request_timeout,
        }
    }

    /// Sends one request and reads the full response body.
    ///
    /// The timeout covers connect, headers and body. Any response, whatever its status, is `Ok`.
    pub async fn send(&self, req: &PreparedRequest) -> Result<HttpResponse> {
        let timeout = req.timeout.unwrap_or(self.request_timeout);

        match tokio::time::timeout(timeout, self.send_inner(req)).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    async fn send_inner(&self, req: &PreparedRequest) -> Result<HttpResponse> {
        let mut builder = Request::builder()
            .method(req.method.clone())
            .uri(req.uri.clone());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let http_req: Request<Full<Bytes>> = builder.body(Full::new(req.body.clone()))?;

        let res: hyper::Response<Incoming> = self.inner.request(http_req).await?;

        let (parts, body) = res.into_parts();
        let status = parts.status.as_u16();

        // Lowercase keys; repeated headers are joined with ", ".
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in parts.headers.iter() {
            let v = String::from_utf8_lossy(value.as_bytes()).to_string();
            merged
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|cur| {
                    if !cur.is_empty() {
                        cur.push_str(", ");
                    }
                    cur.push_str(&v);
                })
                .or_insert(v);
        }
        let headers: Vec<(String, String)> = merged.into_iter().collect();

        let head_bytes = estimate_response_head_bytes(parts.version, parts.status, &parts.headers);
        let body = body.collect().await?.to_bytes();
        let bytes_received = head_bytes.saturating_add(body.len() as u64);

        Ok(HttpResponse {
            status,
            body,
            headers,
            bytes_received,
        })
    }
}
