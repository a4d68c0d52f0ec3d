use super::*;
use crate::registry::TechnologyRegistry;
use crate::sandbox::SandboxRoot;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::fs;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

fn generous() -> RateLimitConfig {
    RateLimitConfig {
        max_requests: 1000,
        window_secs: 60,
        ..Default::default()
    }
}

fn state_with(
    payload_limit: RateLimitConfig,
    health_limit: RateLimitConfig,
    settings: ServerSettings,
) -> (TempDir, AppState) {
    let dir = tempdir().unwrap();
    let files = dir.path().join("files");
    for (tech, name, body) in [
        ("php", "shell.php", "<?php system($_GET['c']); ?>"),
        ("python", "reverse_shell.py", "import socket,subprocess,os"),
        ("perl", "cmd.cgi", "#!/usr/bin/perl"),
    ] {
        fs::create_dir_all(files.join(tech)).unwrap();
        fs::write(files.join(tech).join(name), body).unwrap();
    }
    fs::write(files.join("php").join(".htaccess"), "deny").unwrap();
    fs::write(dir.path().join("secret.php"), "outside").unwrap();

    let root = SandboxRoot::open(&files).unwrap();
    let resolver = PathResolver::new(TechnologyRegistry::new(), root);
    let state = AppState::new(
        resolver,
        payload_limit,
        health_limit,
        LogBroadcaster::new(16),
        settings,
    );
    (dir, state)
}

fn app() -> (TempDir, Router) {
    let (dir, state) = state_with(generous(), generous(), ServerSettings::default());
    (dir, router(state))
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn assert_rejected(app: &Router, uri: &str, reason: &str) -> Value {
    let response = get(app, uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {}", uri);
    let body = json_body(response).await;
    assert_eq!(body["reason"], reason, "uri: {}", uri);
    body
}

#[tokio::test]
async fn test_serves_payload_with_headers() {
    let (_dir, app) = app();
    let response = get(&app, "/rfi/python/reverse_shell.py").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "text/x-python");
    assert_eq!(
        headers["content-disposition"],
        "inline; filename=\"reverse_shell.py\""
    );
    assert_eq!(headers["x-payload-technology"], "python");
    assert_eq!(headers["content-length"], "27");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"import socket,subprocess,os");
}

#[tokio::test]
async fn test_technology_is_case_insensitive() {
    let (_dir, app) = app();
    let response = get(&app, "/rfi/PHP/shell.php").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-payload-technology"], "php");
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let (_dir, app) = app();
    let body = assert_rejected(&app, "/rfi/php/..%2F..%2Fsecret.php", "forbidden_pattern").await;
    assert_eq!(body["error"], "Invalid filename");
    assert_rejected(&app, "/rfi/php/shell.php%2F..%2F..%2Fsecret.php", "forbidden_pattern")
        .await;
    // Double encoding survives one decode as a literal %2f
    assert_rejected(&app, "/rfi/php/..%252fsecret.php", "forbidden_pattern").await;
    assert_rejected(&app, "/rfi/php/shell%5Cx.php", "forbidden_pattern").await;
}

#[tokio::test]
async fn test_undecodable_segment_is_json_rejection() {
    let (_dir, app) = app();
    for uri in ["/rfi/php/%FF.php", "/rfi/%FF/shell.php", "/rfi/%FF"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(response.headers()["content-type"], "application/json");

        let body = json_body(response).await;
        assert_eq!(body["reason"], "invalid_encoding", "uri: {}", uri);
        assert_eq!(body["error"], "Invalid path");
    }
}

#[tokio::test]
async fn test_unknown_technology() {
    let (_dir, app) = app();
    let body = assert_rejected(&app, "/rfi/ruby/x.rb", "unknown_technology").await;
    assert_eq!(body["error"], "Invalid technology");
    assert!(body["message"].as_str().unwrap().contains("ruby"));
}

#[tokio::test]
async fn test_missing_filename() {
    let (_dir, app) = app();
    let body = assert_rejected(&app, "/rfi/php", "missing_filename").await;
    assert_eq!(body["error"], "Missing filename");
    // Technology is still checked first
    assert_rejected(&app, "/rfi/ruby", "unknown_technology").await;
}

#[tokio::test]
async fn test_hidden_file() {
    let (_dir, app) = app();
    let body = assert_rejected(&app, "/rfi/php/.htaccess", "hidden_file").await;
    assert_eq!(body["message"], "Access to hidden files is not allowed.");
}

#[tokio::test]
async fn test_extension_mismatch() {
    let (_dir, app) = app();
    let body = assert_rejected(&app, "/rfi/php/shell.py", "extension_mismatch").await;
    assert_eq!(body["error"], "Invalid file extension");
    assert_rejected(&app, "/rfi/python/reverse_shell.py.php", "extension_mismatch").await;
}

#[tokio::test]
async fn test_missing_payload_is_404() {
    let (_dir, app) = app();
    let response = get(&app, "/rfi/php/ghost.php").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], "File not found");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("ghost.php"));
    // Filesystem paths never leak
    assert!(!message.contains('/'));
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, app) = app();
    let response = get(&app, "/wp-admin/install.php").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(
        body["message"],
        "The route GET /wp-admin/install.php does not exist."
    );
}

#[tokio::test]
async fn test_technology_index() {
    let (_dir, app) = app();
    let response = get(&app, "/rfi").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["count"], 7);
    let technologies = body["technologies"].as_array().unwrap();
    let asp = technologies.iter().find(|t| t["key"] == "asp").unwrap();
    assert_eq!(asp["extensions"], serde_json::json!([".asp", ".aspx"]));
    assert_eq!(asp["content_type"], "text/x-asp");
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = app();
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_health_rate_limit() {
    let health = RateLimitConfig {
        max_requests: 3,
        window_secs: 600,
        message: "Too many health checks.",
        ..Default::default()
    };
    let (_dir, state) = state_with(generous(), health, ServerSettings::default());
    let app = router(state);

    for remaining in ["2", "1", "0"] {
        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "3");
        assert_eq!(response.headers()["ratelimit-remaining"], remaining);
    }

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["message"], "Too many health checks.");

    // Payload routes have their own budget
    assert_eq!(get(&app, "/rfi/php/shell.php").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_requests_count_against_payload_limit() {
    let payloads = RateLimitConfig {
        max_requests: 2,
        window_secs: 900,
        ..Default::default()
    };
    let (_dir, state) = state_with(payloads, generous(), ServerSettings::default());
    let app = router(state);

    assert_eq!(get(&app, "/rfi/ruby/x.rb").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/rfi/php/shell.php").await.status(), StatusCode::OK);
    assert_eq!(
        get(&app, "/rfi/php/shell.php").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_forwarded_clients_have_separate_budgets() {
    let payloads = RateLimitConfig {
        max_requests: 1,
        window_secs: 900,
        ..Default::default()
    };
    let settings = ServerSettings {
        trust_proxy: true,
        ..Default::default()
    };
    let (_dir, state) = state_with(payloads, generous(), settings);
    let app = router(state);

    let from = |ip: &str| {
        Request::builder()
            .uri("/rfi/php/shell.php")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(from("203.0.113.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let again = app.clone().oneshot(from("203.0.113.1")).await.unwrap();
    assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    let other = app.clone().oneshot(from("203.0.113.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let (_dir, app) = app();
    let ok = get(&app, "/health").await;
    let missing = get(&app, "/nope").await;

    let first = ok.headers()["x-request-id"].to_str().unwrap().to_string();
    let second = missing.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(first.len(), 36);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_internal_error_details_hidden_in_production() {
    let settings = ServerSettings {
        production: true,
        ..Default::default()
    };
    let response = ApiError::internal(&settings, "disk on fire").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["message"], "Something went wrong.");
}

#[tokio::test]
async fn test_log_stream_is_event_stream() {
    let (_dir, app) = app();
    let response = get(&app, "/logs/stream").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
}
