mod common;

use common::{config_for, mount_token, quiet_logger, ACCESS_TOKEN, CLIENT_ID, CLIENT_SECRET};
use sentinelhub_mcp::errors::ToolErrorKind;
use sentinelhub_mcp::services::config::{Credentials, SentinelConfig};
use sentinelhub_mcp::services::token::TokenManager;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(config: &SentinelConfig) -> TokenManager {
    TokenManager::new(quiet_logger(), reqwest::Client::new(), config)
}

#[tokio::test]
async fn empty_cache_refreshes_once_then_serves_cached_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains(format!("client_id={}", CLIENT_ID)))
        .and(body_string_contains(format!("client_secret={}", CLIENT_SECRET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = manager(&config_for(&server));
    let first = tokens.get_token().await.expect("first token");
    let second = tokens.get_token().await.expect("cached token");

    assert_eq!(first.as_str(), ACCESS_TOKEN);
    assert_eq!(first, second);
    assert_eq!(tokens.refresh_count(), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let tokens = Arc::new(manager(&config_for(&server)));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let tokens = tokens.clone();
        tasks.push(tokio::spawn(async move { tokens.get_token().await }));
    }
    for task in tasks {
        let token = task.await.expect("join").expect("token");
        assert_eq!(token.as_str(), ACCESS_TOKEN);
    }
    assert_eq!(tokens.refresh_count(), 1);
}

#[tokio::test]
async fn token_inside_safety_margin_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 30
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tokens = manager(&config_for(&server));
    tokens.get_token().await.expect("first");
    tokens.get_token().await.expect("second");
    assert_eq!(tokens.refresh_count(), 2);
}

#[tokio::test]
async fn invalidate_forces_new_grant() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    let tokens = manager(&config_for(&server));
    tokens.get_token().await.expect("first");
    tokens.invalidate().await;
    tokens.get_token().await.expect("after invalidate");
    assert_eq!(tokens.refresh_count(), 2);
}

#[tokio::test]
async fn rejected_grant_is_auth_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "Bad client credentials"
        })))
        .mount(&server)
        .await;

    let err = manager(&config_for(&server))
        .get_token()
        .await
        .expect_err("rejected");
    assert_eq!(err.kind, ToolErrorKind::AuthError);
    assert_eq!(err.code, "token_request_rejected");
    assert_eq!(err.status, Some(401));
    assert!(!err.retryable);
}

#[tokio::test]
async fn grant_without_access_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let err = manager(&config_for(&server))
        .get_token()
        .await
        .expect_err("no token");
    assert_eq!(err.kind, ToolErrorKind::AuthError);
    assert_eq!(err.code, "token_response_invalid");
}

#[tokio::test]
async fn unreachable_token_endpoint_is_auth_error() {
    let config = SentinelConfig::for_endpoints(
        "http://127.0.0.1:1/api/v1",
        "http://127.0.0.1:1/oauth/token",
    )
    .expect("config")
    .with_credentials(Credentials::new(CLIENT_ID, CLIENT_SECRET));

    let err = manager(&config).get_token().await.expect_err("unreachable");
    assert_eq!(err.kind, ToolErrorKind::AuthError);
    assert_eq!(err.code, "token_endpoint_unreachable");
    assert!(err.retryable);
}

#[tokio::test]
async fn oversized_lifetime_falls_back_to_default_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": u64::MAX
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(manager(&config_for(&server)));
    let spawned = tokens.clone();
    let token = tokio::spawn(async move { spawned.get_token().await })
        .await
        .expect("no panic")
        .expect("token");
    assert_eq!(token.as_str(), ACCESS_TOKEN);
    tokens.get_token().await.expect("cached");
    assert_eq!(tokens.refresh_count(), 1);
}

#[tokio::test]
async fn oversized_margin_refreshes_every_call() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    let mut config = config_for(&server);
    config.token_margin = Duration::MAX;
    let tokens = manager(&config);
    tokens.get_token().await.expect("first");
    tokens.get_token().await.expect("second");
    assert_eq!(tokens.refresh_count(), 2);
}
