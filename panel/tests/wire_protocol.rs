//! End-to-end tests against a mock panel.
//!
//! These tests verify that a call:
//! - Carries exactly one signature pair
//! - Encodes parameters in the query or a form body depending on method
//! - Classifies envelopes, statuses and parse failures
//! - Retries only retryable outcomes, within the configured bound

use std::time::{Duration, Instant};

use panel::response::{EnvelopeDataFormat, JsonFormat, PlainTextFormat};
use panel::{sign, Endpoint, PanelClient, PanelConfig, PanelError, RestMethod};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(server: &MockServer, retry_count: u32) -> PanelConfig {
    PanelConfig::builder()
        .base_url(server.uri())
        .api_key("panel-secret")
        .retry_count(retry_count)
        .retry_interval(Duration::from_millis(50))
        .build()
}

fn ping() -> Endpoint<PlainTextFormat> {
    Endpoint::builder()
        .method(RestMethod::Get)
        .path("ping")
        .build()
}

fn signature_pairs(request: &Request) -> Vec<(String, String)> {
    let pairs: Vec<(String, String)> = match request.method.as_str() {
        "GET" | "DELETE" => request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        _ => url::form_urlencoded::parse(&request.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
    };
    pairs
        .into_iter()
        .filter(|(k, _)| k == "request_time" || k == "request_token")
        .collect()
}

// =============================================================================
// Envelope classification
// =============================================================================

#[tokio::test]
async fn test_ping_with_status_true_returns_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"msg":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 2)).unwrap();
    let result = client.execute(&ping()).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.message(), "ok");
}

#[tokio::test]
async fn test_body_without_status_is_implicit_success() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Load {
        one: f64,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/system"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"one": 0.5}"#))
        .mount(&server)
        .await;

    let load: Endpoint<JsonFormat<Load>> = Endpoint::builder()
        .method(RestMethod::Post)
        .path("system?action=GetLoadAverage")
        .build();

    let client = PanelClient::new(config(&server, 0)).unwrap();
    let result = client.execute(&load).await.unwrap();

    assert_eq!(result.message(), "");
    assert_eq!(result.into_data(), Some(Load { one: 0.5 }));
}

#[tokio::test]
async fn test_status_false_surfaces_panel_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/site"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":false,"msg":"Site already exists"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let add_site: Endpoint<PlainTextFormat> = Endpoint::builder()
        .method(RestMethod::Post)
        .path("site?action=AddSite")
        .param("webname", "example.com")
        .build();

    let client = PanelClient::new(config(&server, 3)).unwrap();
    let err = client.execute(&add_site).await.unwrap_err();

    match err {
        PanelError::ApiResponse { status, message, body } => {
            assert_eq!(status, 200);
            assert_eq!(message, "Site already exists");
            assert!(body.contains("Site already exists"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_enveloped_data_is_extracted() {
    #[derive(Debug, Deserialize)]
    struct Site {
        name: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":true,"msg":"","data":[{"name":"a.io"},{"name":"b.io"}]}"#,
        ))
        .mount(&server)
        .await;

    let sites: Endpoint<EnvelopeDataFormat<Vec<Site>>> = Endpoint::builder()
        .method(RestMethod::Post)
        .path("data?action=getData")
        .param("table", "sites")
        .build();

    let client = PanelClient::new(config(&server, 0)).unwrap();
    let names: Vec<String> = client
        .execute(&sites)
        .await
        .unwrap()
        .into_data()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();

    assert_eq!(names, vec!["a.io", "b.io"]);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let status: Endpoint<JsonFormat<serde_json::Value>> = Endpoint::builder()
        .method(RestMethod::Get)
        .path("status")
        .build();

    let client = PanelClient::new(config(&server, 3)).unwrap();
    let err = client.execute(&status).await.unwrap_err();

    assert!(matches!(err, PanelError::Parse(_)));
}

#[tokio::test]
async fn test_forbidden_is_authentication_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("IP not whitelisted"))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 3)).unwrap();
    let err = client.execute(&ping()).await.unwrap_err();

    assert!(matches!(
        err,
        PanelError::Authentication { status: 403, ref message, .. } if message == "IP not whitelisted"
    ));
    assert_eq!(err.body(), Some("IP not whitelisted"));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_retryable_status_makes_retry_count_plus_one_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(500).set_body_string("panel crashed"))
        .expect(3)
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 2)).unwrap();
    let err = client.execute(&ping()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.body(), Some("panel crashed"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_attempts_are_spaced_by_retry_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 2)).unwrap();
    let started = Instant::now();
    client.execute(&ping()).await.unwrap_err();

    // Two pauses of 50ms between three attempts.
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_recovers_when_panel_comes_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"msg":"back"}"#))
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 2)).unwrap();
    let result = client.execute(&ping()).await.unwrap();

    assert_eq!(result.message(), "back");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_retryable_status_fails_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 2)).unwrap();
    let err = client.execute(&ping()).await.unwrap_err();

    assert_eq!(err.to_string(), "Panel returned HTTP 404: Not Found");
}

#[tokio::test]
async fn test_every_attempt_carries_one_signature_pair() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = PanelClient::new(config(&server, 1)).unwrap();
    client.execute(&ping()).await.unwrap_err();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let pairs = signature_pairs(request);
        assert_eq!(pairs.len(), 2, "pairs: {pairs:?}");
    }
}

// =============================================================================
// Wire encoding
// =============================================================================

#[tokio::test]
async fn test_get_parameters_travel_in_query_with_valid_signature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("path", "/www/wwwroot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let files: Endpoint<PlainTextFormat> = Endpoint::builder()
        .method(RestMethod::Get)
        .path("/files")
        .param("path", "/www/wwwroot")
        .build();

    let client = PanelClient::new(config(&server, 0)).unwrap();
    client.execute(&files).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let pairs = signature_pairs(&requests[0]);
    let time = &pairs.iter().find(|(k, _)| k == "request_time").unwrap().1;
    let token = &pairs.iter().find(|(k, _)| k == "request_token").unwrap().1;

    assert_eq!(*token, sign("panel-secret", time.parse().unwrap()));
}

#[tokio::test]
async fn test_post_parameters_travel_as_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/site"))
        .and(query_param("action", "AddSite"))
        .and(body_string_contains("webname=example.com"))
        .and(body_string_contains("request_token="))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"msg":"added"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let add_site: Endpoint<PlainTextFormat> = Endpoint::builder()
        .method(RestMethod::Post)
        .path("site?action=AddSite")
        .param("webname", "example.com")
        .build();

    let client = PanelClient::new(config(&server, 0)).unwrap();
    let result = client.execute(&add_site).await.unwrap();

    assert_eq!(result.message(), "added");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn test_config_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::header("x-panel-node", "edge-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let config = PanelConfig::builder()
        .base_url(server.uri())
        .api_key("panel-secret")
        .header("X-Panel-Node", "edge-1")
        .build();

    let client = PanelClient::new(config).unwrap();
    client.execute(&ping()).await.unwrap();
}
