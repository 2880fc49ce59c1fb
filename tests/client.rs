//! Retry and trace propagation tests for the HTTP client.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use capsules::client::{Client, ClientError, ClientFactory};
use capsules::observability::{SpanContext, TraceContextTracer};
use reqwest::StatusCode;

mod common;

fn fast_client(retry_max: u32) -> Client {
    ClientFactory::new()
        .create()
        .retry_max(retry_max)
        .retry_wait_min_ms(10)
        .retry_wait_max_ms(50)
        .timeout_ms(2_000)
        .build()
        .unwrap()
}

/// Backend answering with `statuses` in order, then 200 forever.
async fn scripted_backend(statuses: Vec<u16>) -> (String, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_programmable_backend(move |_| {
        let count = counter.fetch_add(1, Ordering::SeqCst) as usize;
        let status = statuses.get(count).copied().unwrap_or(200);
        async move { (status, format!("call {count}")) }
    })
    .await;
    (format!("http://{addr}/"), calls)
}

#[tokio::test]
async fn test_retries_on_503_then_succeeds() {
    let (url, calls) = scripted_backend(vec![503, 503]).await;
    let client = fast_client(5);

    let response = client.send(client.get(&url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "call 2");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_retry_max() {
    let (url, calls) = scripted_backend(vec![500; 10]).await;
    let client = fast_client(2);

    let err = client.send(client.get(&url)).await.unwrap_err();

    match err {
        ClientError::RetriesExhausted {
            attempts, status, ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_never_retries_501() {
    let (url, calls) = scripted_backend(vec![501; 10]).await;
    let client = fast_client(5);

    let response = client.send(client.get(&url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_errors_are_returned_as_is() {
    let (url, calls) = scripted_backend(vec![404; 10]).await;
    let client = fast_client(5);

    let response = client.send(client.get(&url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_reported() {
    // Reserve a port, then free it so nothing listens there.
    let (listener, addr) = common::ephemeral_listener().await;
    drop(listener);

    let client = fast_client(1);
    let err = client
        .send(client.get(format!("http://{addr}/")))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Request { attempts: 2, .. }));
}

#[tokio::test]
async fn test_injects_traceparent_with_real_tracer() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let addr = common::start_programmable_backend(move |request| {
        *sink.lock().unwrap() = request.header("traceparent");
        async { (200, "ok".to_string()) }
    })
    .await;

    let client = ClientFactory::new()
        .with_tracer(Arc::new(TraceContextTracer::new("client-test")))
        .create()
        .build()
        .unwrap();
    let parent = SpanContext::from_traceparent(
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
    )
    .unwrap();

    let request = client.get(format!("http://{addr}/")).build().unwrap();
    let response = client
        .execute_with_parent(Some(&parent), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let header = seen.lock().unwrap().clone().expect("traceparent header");
    let sent = SpanContext::from_traceparent(&header).unwrap();
    assert_eq!(sent.trace_id, parent.trace_id);
    assert_ne!(sent.span_id, parent.span_id);
}

#[tokio::test]
async fn test_noop_tracer_sends_no_traceparent() {
    let seen = Arc::new(Mutex::new(Some(String::new())));
    let sink = seen.clone();
    let addr = common::start_programmable_backend(move |request| {
        *sink.lock().unwrap() = request.header("traceparent");
        async { (200, "ok".to_string()) }
    })
    .await;

    let client = fast_client(0);
    client
        .send(client.get(format!("http://{addr}/")))
        .await
        .unwrap();

    assert!(seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_unbuildable_request_is_invalid_request() {
    let client = fast_client(0);

    let err = client.send(client.get("not a url")).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidRequest(_)));
    assert!(err.to_string().starts_with("invalid request"));
}
