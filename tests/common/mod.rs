#![allow(dead_code)]

use once_cell::sync::Lazy;
use sentinelhub_mcp::app::App;
use sentinelhub_mcp::services::config::{Credentials, SentinelConfig};
use sentinelhub_mcp::services::logger::{LogLevel, Logger};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const ACCESS_TOKEN: &str = "test-access-token";
pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

/// Both API and OAuth endpoints pointed at the mock server, no credentials.
pub fn bare_config(server: &MockServer) -> SentinelConfig {
    SentinelConfig::for_endpoints(
        &format!("{}/api/v1", server.uri()),
        &format!("{}/oauth/token", server.uri()),
    )
    .expect("mock endpoints are valid URLs")
}

pub fn config_for(server: &MockServer) -> SentinelConfig {
    bare_config(server).with_credentials(Credentials::new(CLIENT_ID, CLIENT_SECRET))
}

pub fn app_with(config: SentinelConfig) -> Arc<App> {
    Arc::new(App::initialize(config, quiet_logger()).expect("app initializes"))
}

pub fn app_for(server: &MockServer) -> Arc<App> {
    app_with(config_for(server))
}

/// Token endpoint answering with `ACCESS_TOKEN`, expected `times` times.
pub async fn mount_token(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn bearer() -> String {
    format!("Bearer {}", ACCESS_TOKEN)
}

pub fn statistics_args() -> Value {
    serde_json::json!({
        "bbox": [13.0, 45.0, 13.5, 45.5],
        "time_from": "2023-06-01",
        "time_to": "2023-08-31",
        "evalscript": "//VERSION=3\nfunction setup(){return{input:['B04','B08','dataMask'],output:[{id:'ndvi',bands:1},{id:'dataMask',bands:1}]};}\nfunction evaluatePixel(s){return{ndvi:[(s.B08-s.B04)/(s.B08+s.B04)],dataMask:[s.dataMask]};}",
        "data_sources": [{"type": "sentinel-2-l2a"}]
    })
}

pub fn restore_env(key: &str, previous: Option<String>) {
    match previous {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}
