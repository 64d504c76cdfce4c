#![allow(clippy::unwrap_used)]
// Integration tests for the outbound HTTP collaborators using wiremock.

use bytes::Bytes;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitekeep_api::{
    Error, HttpObjectStore, ObjectStore, OpenAiRecommender, Recommender, ReportMailer,
    ResendMailer, SiteFetcher, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SiteFetcher) {
    let server = MockServer::start().await;
    let fetcher = SiteFetcher::new(&TransportConfig::default()).unwrap();
    (server, fetcher)
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

// ── Probe tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_healthy_site() {
    let (server, fetcher) = setup().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let probe = fetcher.probe(&server.uri()).await.unwrap();
    assert_eq!(probe.status, 200);
    assert!(probe.is_healthy());
}

#[tokio::test]
async fn test_probe_server_error_is_not_an_error() {
    let (server, fetcher) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let probe = fetcher.probe(&server.uri()).await.unwrap();
    assert_eq!(probe.status, 500);
    assert!(!probe.is_healthy());
}

#[tokio::test]
async fn test_probe_follows_redirects() {
    let (server, fetcher) = setup().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let probe = fetcher.probe(&format!("{}/old", server.uri())).await.unwrap();
    assert_eq!(probe.status, 200);
}

#[tokio::test]
async fn test_probe_unreachable_host_fails() {
    let fetcher = SiteFetcher::new(&TransportConfig::default()).unwrap();
    // Port 9 (discard) on localhost is closed in test environments.
    let result = fetcher.probe("http://127.0.0.1:9/").await;
    assert!(result.is_err(), "expected network error, got: {result:?}");
}

#[tokio::test]
async fn test_probe_rejects_invalid_url() {
    let fetcher = SiteFetcher::new(&TransportConfig::default()).unwrap();
    let result = fetcher.probe("not a url").await;
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}

// ── Fetch tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_html_returns_body() {
    let (server, fetcher) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Hi</title>"))
        .mount(&server)
        .await;

    let html = fetcher.fetch_html(&server.uri()).await.unwrap();
    assert_eq!(html, "<title>Hi</title>");
}

#[tokio::test]
async fn test_fetch_html_non_success_is_status_error() {
    let (server, fetcher) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = fetcher.fetch_html(&server.uri()).await;
    assert!(
        matches!(result, Err(Error::Status { status: 404, .. })),
        "expected Status error, got: {result:?}"
    );
}

// ── Object storage tests ────────────────────────────────────────────

#[tokio::test]
async fn test_http_object_store_put() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/backups-bucket/backups/site-1/2024.zip"))
        .and(header("authorization", "Bearer store-token"))
        .and(header("content-type", "application/zip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpObjectStore::new(
        Url::parse(&server.uri()).unwrap(),
        "backups-bucket".into(),
        Some("https://cdn.example.com".into()),
        Some(secret("store-token")),
        &TransportConfig::default(),
    )
    .unwrap();

    store
        .put(
            "backups/site-1/2024.zip",
            Bytes::from_static(b"PK\x03\x04"),
            "application/zip",
        )
        .await
        .unwrap();

    assert_eq!(
        store.locator("backups/site-1/2024.zip"),
        "https://cdn.example.com/backups/site-1/2024.zip"
    );
}

#[tokio::test]
async fn test_http_object_store_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
        .mount(&server)
        .await;

    let store = HttpObjectStore::new(
        Url::parse(&server.uri()).unwrap(),
        "bucket".into(),
        None,
        None,
        &TransportConfig::default(),
    )
    .unwrap();

    let result = store
        .put("backups/x.zip", Bytes::new(), "application/zip")
        .await;
    match result {
        Err(Error::Storage { key, message }) => {
            assert_eq!(key, "backups/x.zip");
            assert!(message.contains("AccessDenied"));
        }
        other => panic!("expected Storage error, got: {other:?}"),
    }
}

// ── Mail tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_resend_mailer_posts_email() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer mail-key"))
        .and(body_json(json!({
            "from": "Reports <reports@example.com>",
            "to": ["owner@example.com"],
            "subject": "Weekly report",
            "html": "<p>ok</p>"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let mailer = ResendMailer::new(
        Url::parse(&format!("{}/emails", server.uri())).unwrap(),
        &secret("mail-key"),
        "Reports <reports@example.com>".into(),
        &TransportConfig::default(),
    )
    .unwrap();

    mailer
        .send("owner@example.com", "Weekly report", "<p>ok</p>")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resend_mailer_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid recipient"))
        .mount(&server)
        .await;

    let mailer = ResendMailer::new(
        Url::parse(&format!("{}/emails", server.uri())).unwrap(),
        &secret("mail-key"),
        "reports@example.com".into(),
        &TransportConfig::default(),
    )
    .unwrap();

    let result = mailer.send("nobody", "s", "h").await;
    assert!(
        matches!(result, Err(Error::Mail { status: 422, ref body }) if body.contains("invalid recipient")),
        "expected Mail error, got: {result:?}"
    );
}

// ── Recommendation tests ────────────────────────────────────────────

#[tokio::test]
async fn test_recommender_returns_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer ai-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Use a longer title." } }]
        })))
        .mount(&server)
        .await;

    let recommender = OpenAiRecommender::new(
        Url::parse(&format!("{}/v1/chat/completions", server.uri())).unwrap(),
        &secret("ai-key"),
        "gpt-4o-mini".into(),
        &TransportConfig::default(),
    )
    .unwrap();

    let text = recommender
        .suggest(&json!({ "title": "Home", "seo_score": 80 }))
        .await
        .unwrap();
    assert_eq!(text, "Use a longer title.");
}

#[tokio::test]
async fn test_recommender_empty_choices_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let recommender = OpenAiRecommender::new(
        Url::parse(&server.uri()).unwrap(),
        &secret("ai-key"),
        "gpt-4o-mini".into(),
        &TransportConfig::default(),
    )
    .unwrap();

    let text = recommender.suggest(&json!({})).await.unwrap();
    assert_eq!(text, "No suggestions available.");
}
