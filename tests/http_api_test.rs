//! End-to-end tests for the admission HTTP API

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use registry_admission::http::handlers::AppState;
use registry_admission::http::router;
use registry_admission::{AdmissionService, GitHubOAuthConfig, InMemoryStore, ServiceConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// GitHub stand-in: `acme-token` can read acme/tool, `other-token` cannot
async fn github_mock() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tool"))
        .and(header_eq("Authorization", "Bearer acme-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "permissions": { "pull": true } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tool"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

fn app(github: &MockServer) -> Router {
    let config = ServiceConfig {
        github: GitHubOAuthConfig {
            client_id: "client-1".to_string(),
            api_base_url: github.uri(),
            login_base_url: github.uri(),
            ..Default::default()
        },
        provider_timeout_secs: 2,
        ..Default::default()
    };
    let service = AdmissionService::new(config, Arc::new(InMemoryStore::new())).unwrap();
    router(AppState::new(Arc::new(service)))
}

fn server_body(name: &str, version: &str) -> Value {
    json!({
        "name": name,
        "description": "An example server",
        "repository": { "url": "https://github.com/acme/tool", "source": "github" },
        "version_detail": { "version": version }
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_github_namespace_publish_scenario() {
    let github = github_mock().await;
    let app = app(&github);
    let body = server_body("io.github.acme/tool", "1.2.0");

    // No token
    let (status, json) = send(&app, Method::POST, "/v0/publish", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");

    // Token that cannot read acme/tool
    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/publish",
        Some("other-token"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token scoped to acme/tool
    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/publish",
        Some("acme-token"),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    let id = json["data"]["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(json["data"]["version_detail"]["version"], "1.2.0");
    assert_eq!(json["data"]["version_detail"]["is_latest"], true);

    let (status, json) = send(&app, Method::GET, &format!("/v0/servers/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "io.github.acme/tool");
}

#[tokio::test]
async fn test_open_namespace_rejects_tokens() {
    let github = github_mock().await;
    let app = app(&github);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/publish",
        Some("acme-token"),
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_version_ordering_status_codes() {
    let github = github_mock().await;
    let app = app(&github);

    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["data"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "CONFLICT");

    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body("com.example/tool", "0.9.0")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same version through update of the same record is idempotent
    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/v0/servers/{}", id),
        None,
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());

    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/v0/servers/{}", id),
        None,
        Some(server_body("com.example/tool", "2.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["version_detail"]["version"], "2.0.0");
}

#[tokio::test]
async fn test_server_lookup_errors() {
    let github = github_mock().await;
    let app = app(&github);

    let (status, _) = send(&app, Method::GET, "/v0/servers/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, json) = send(&app, Method::GET, &format!("/v0/servers/{}", missing), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/v0/servers/{}", missing),
        None,
        Some(server_body("com.example/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_validation() {
    let github = github_mock().await;
    let app = app(&github);

    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body(&"x".repeat(300), "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["details"]["name"].is_array());

    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/publish",
        None,
        Some(server_body("com.example/tool", "not-a-version")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_outage_maps_to_bad_gateway() {
    let github = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&github)
        .await;
    let app = app(&github);

    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/publish",
        Some("acme-token"),
        Some(server_body("io.github.acme/tool", "1.0.0")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_device_login_endpoints() {
    let github = github_mock().await;
    Mock::given(method("POST"))
        .and(path("/login/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-1",
            "user_code": "ABCD-1234",
            "verification_uri": "https://github.com/login/device",
            "expires_in": 900,
            "interval": 5
        })))
        .mount(&github)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "authorization_pending" })),
        )
        .mount(&github)
        .await;
    let app = app(&github);

    let (status, json) = send(
        &app,
        Method::POST,
        "/v0/auth/device",
        None,
        Some(json!({ "method": "github" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["instructions"]["user_code"], "ABCD-1234");
    let handle = json["data"]["sessionHandle"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        Method::GET,
        &format!("/v0/auth/device/{}", handle),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["interval"], 5);

    let (status, _) = send(&app, Method::GET, "/v0/auth/device/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v0/auth/device",
        None,
        Some(json!({ "method": "none" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let github = github_mock().await;
    let app = app(&github);

    let (status, json) = send(&app, Method::GET, "/v0/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["version"], registry_admission::VERSION);
}
