use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use volley_http::HttpClient;

use crate::outcome::{ErrorKind, Outcome, ResponseMeta};
use crate::template::RequestTemplate;

/// Issues one logical unit of work against the target.
///
/// Implementations never retry and never return an error: transport problems become
/// `Outcome::Failure`. The latency carried by the outcome is measured by the implementation.
pub trait RequestExecutor: Send + Sync + 'static {
    fn execute(&self, template: &RequestTemplate) -> impl Future<Output = Outcome> + Send;
}

impl<E: RequestExecutor> RequestExecutor for Arc<E> {
    fn execute(&self, template: &RequestTemplate) -> impl Future<Output = Outcome> + Send {
        (**self).execute(template)
    }
}

/// Sends the template over a pooled HTTP/1.1 client shared by every virtual user.
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    client: Arc<HttpClient>,
}

impl HttpExecutor {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl RequestExecutor for HttpExecutor {
    async fn execute(&self, template: &RequestTemplate) -> Outcome {
        let started = Instant::now();
        let res = self.client.send(template.prepared()).await;
        let latency = started.elapsed();

        match res {
            Ok(res) => Outcome::Success {
                status: res.status,
                response: ResponseMeta {
                    body: res.body,
                    headers: res.headers,
                    bytes_received: res.bytes_received,
                },
                latency,
            },
            Err(err) => {
                let kind = ErrorKind::from(err.transport_error_kind());
                tracing::trace!(%err, %kind, "request failed");
                Outcome::Failure { kind, latency }
            }
        }
    }
}
