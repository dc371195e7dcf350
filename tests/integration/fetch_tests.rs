//! Integration tests for the fetch client
//!
//! These tests run the client against wiremock servers to check the session
//! bootstrap, the status → failure mapping and the retry policy.

use listing_harvest::config::FetchConfig;
use listing_harvest::fetch::{FetchClient, RetryPolicy};
use listing_harvest::FetchError;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetch_config(server: &MockServer) -> FetchConfig {
    FetchConfig {
        bootstrap_url: format!("{}/", server.uri()),
        request_delay_ms: 0,
        follow_redirects: true,
        timeout_secs: 5,
    }
}

fn client(server: &MockServer) -> FetchClient {
    FetchClient::new(&fetch_config(server), RetryPolicy::no_retry()).expect("valid config")
}

async fn mount_root(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>root</html>"))
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("error body"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bootstrap_then_reuse_session() {
    let server = MockServer::start().await;
    mount_root(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/item/1"))
        .and(header("x-forwarded-for", "126.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1 id=\"itemTitle\">One</h1>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/2"))
        .and(header("accept-language", "ja,en-US;q=0.7,en;q=0.3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1 id=\"itemTitle\">Two</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.needs_bootstrap());

    let first = client.fetch(&format!("{}/item/1", server.uri())).await.unwrap();
    assert_eq!(first.status, 200);
    assert!(first.body.contains("One"));
    assert!(!client.needs_bootstrap());

    let second = client.fetch(&format!("{}/item/2", server.uri())).await.unwrap();
    assert!(second.body.contains("Two"));
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn test_region_cookies_sent_on_every_request() {
    let server = MockServer::start().await;
    mount_root(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/item/1"))
        .and(header_regex("cookie", "JP_LOCATION=JP"))
        .and(header_regex("cookie", "locale=ja_JP"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let url = format!("{}/item/1", server.uri());
    client.fetch(&url).await.unwrap();
    client.fetch(&url).await.unwrap();
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn test_bootstrap_sends_referer_and_origin() {
    let server = MockServer::start().await;
    let root = format!("{}/", server.uri());
    mount_root(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/item/1"))
        .and(header("referer", root.as_str()))
        .and(header("origin", server.uri().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .fetch(&format!("{}/item/1", server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_typed_failures_carry_url() {
    let server = MockServer::start().await;
    mount_root(&server, 4).await;
    mount_status(&server, "/denied", 403).await;
    mount_status(&server, "/missing", 404).await;
    mount_status(&server, "/gone", 410).await;
    mount_status(&server, "/broken", 500).await;

    let client = client(&server);

    let url = format!("{}/denied", server.uri());
    let err = client.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::AccessDenied { .. }));
    assert_eq!(err.url(), url);

    let url = format!("{}/missing", server.uri());
    let err = client.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }));
    assert_eq!(err.status(), Some(404));

    let url = format!("{}/gone", server.uri());
    let err = client.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Gone { .. }));
    assert_eq!(err.url(), url);

    let url = format!("{}/broken", server.uri());
    match client.fetch(&url).await.unwrap_err() {
        FetchError::Http {
            url: failed,
            status,
            body,
        } => {
            assert_eq!(failed, url);
            assert_eq!(status, 500);
            assert_eq!(body, "error body");
        }
        other => panic!("expected generic HTTP failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_redirects_surface_when_not_followed() {
    let server = MockServer::start().await;
    mount_root(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new-home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/found"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .mount(&server)
        .await;

    let client = client(&server);

    let url = format!("{}/moved", server.uri());
    match client.fetch_with(&url, Duration::ZERO, false).await.unwrap_err() {
        FetchError::MovedPermanently { url: failed, location } => {
            assert_eq!(failed, url);
            assert_eq!(location.as_deref(), Some("/new-home"));
        }
        other => panic!("expected 301 failure, got {other:?}"),
    }

    let url = format!("{}/found", server.uri());
    let err = client.fetch_with(&url, Duration::ZERO, false).await.unwrap_err();
    assert!(matches!(err, FetchError::Found { .. }));
    assert_eq!(err.url(), url);
}

#[tokio::test]
async fn test_redirects_followed_by_default() {
    let server = MockServer::start().await;
    mount_root(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let page = client(&server)
        .fetch(&format!("{}/old", server.uri()))
        .await
        .unwrap();
    assert!(page.final_url.ends_with("/new"));
    assert_eq!(page.body, "moved here");
}

#[tokio::test]
async fn test_too_many_requests_honours_retry_after() {
    let server = MockServer::start().await;
    mount_root(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = client(&server)
        .fetch(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();

    assert!(started.elapsed() >= Duration::from_secs(1));
    match err {
        FetchError::TooManyRequests { retry_after, .. } => {
            assert_eq!(retry_after, Some(Duration::from_secs(1)));
        }
        other => panic!("expected 429 failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_too_many_requests_without_hint() {
    let server = MockServer::start().await;
    mount_root(&server, 1).await;
    mount_status(&server, "/busy", 429).await;

    let err = client(&server)
        .fetch(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::TooManyRequests {
            retry_after: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_retry_exhaustion_returns_last_failure() {
    let server = MockServer::start().await;
    // Every failed attempt forces a new bootstrap
    mount_root(&server, 3).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let retry = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO, 0.0);
    let client = FetchClient::new(&fetch_config(&server), retry).unwrap();

    let err = client
        .fetch(&format!("{}/flaky", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(client.request_count(), 3);
}

#[tokio::test]
async fn test_retry_recovers() {
    let server = MockServer::start().await;
    mount_root(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second time lucky"))
        .mount(&server)
        .await;

    let retry = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO, 0.0);
    let client = FetchClient::new(&fetch_config(&server), retry).unwrap();

    let page = client.fetch(&format!("{}/item", server.uri())).await.unwrap();
    assert_eq!(page.body, "second time lucky");
}

#[tokio::test]
async fn test_failure_forces_new_bootstrap() {
    let server = MockServer::start().await;
    mount_root(&server, 2).await;
    mount_status(&server, "/missing", 404).await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client(&server);
    client.fetch(&format!("{}/item", server.uri())).await.unwrap();
    assert!(client.fetch(&format!("{}/missing", server.uri())).await.is_err());
    assert!(client.needs_bootstrap());

    client.fetch(&format!("{}/item", server.uri())).await.unwrap();
    assert!(!client.needs_bootstrap());
}
