use bytes::Bytes;
use volley_http::{HttpClient, HttpRequest, HttpTransportErrorKind};
use volley_testserver::{HELLO_HEADER, TestServer};

async fn start_server() -> TestServer {
    match TestServer::start().await {
        Ok(s) => s,
        Err(err) => panic!("failed to start test server: {err}"),
    }
}

#[tokio::test]
async fn get_reads_status_body_and_headers() {
    let server = start_server().await;
    let client = HttpClient::default();

    let req = match HttpRequest::get(&server.urls().hello).prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };
    let res = match client.send(&req).await {
        Ok(r) => r,
        Err(err) => panic!("send: {err}"),
    };

    assert_eq!(res.status, 200);
    assert_eq!(res.body_utf8(), Some("Hello World!"));
    assert_eq!(res.header(HELLO_HEADER), Some("yes"));
    assert!(res.bytes_received > res.body.len() as u64);
    assert_eq!(server.stats().requests_total(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn non_2xx_status_is_a_response_not_an_error() {
    let server = start_server().await;
    let client = HttpClient::default();

    let req = match HttpRequest::get(server.urls().status(503)).prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };
    match client.send(&req).await {
        Ok(res) => assert_eq!(res.status, 503),
        Err(err) => panic!("send: {err}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn post_body_reaches_server() {
    let server = start_server().await;
    let client = HttpClient::default();

    let req = match HttpRequest::post(&server.urls().echo, Bytes::from_static(b"ping")).prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };
    match client.send(&req).await {
        Ok(res) => assert_eq!(res.body.as_ref(), b"ping"),
        Err(err) => panic!("send: {err}"),
    }
    assert_eq!(server.stats().saw_post_body(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = start_server().await;
    let client = HttpClient::default();

    let mut req = HttpRequest::get(server.urls().slow_ms(500));
    req.timeout = Some(std::time::Duration::from_millis(50));
    let req = match req.prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };
    match client.send(&req).await {
        Ok(res) => panic!("expected timeout, got status {}", res.status),
        Err(err) => assert_eq!(err.transport_error_kind(), HttpTransportErrorKind::Timeout),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn closed_port_is_connection_refused() {
    let server = start_server().await;
    let url = server.urls().hello.clone();
    server.shutdown().await;

    let client = HttpClient::default();
    let req = match HttpRequest::get(url).prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };
    match client.send(&req).await {
        Ok(res) => panic!("expected failure, got status {}", res.status),
        Err(err) => assert_eq!(
            err.transport_error_kind(),
            HttpTransportErrorKind::ConnectionRefused
        ),
    }
}

#[tokio::test]
async fn unresolvable_host_is_dns() {
    let client = HttpClient::default();
    let req = match HttpRequest::get("http://volley-does-not-exist.invalid/").prepare() {
        Ok(r) => r,
        Err(err) => panic!("prepare: {err}"),
    };

    let err = match client.send(&req).await {
        Ok(res) => panic!("expected dns failure, got status {}", res.status),
        Err(err) => err,
    };
    assert_eq!(err.transport_error_kind(), HttpTransportErrorKind::Dns, "{err}");
}
