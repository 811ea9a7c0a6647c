use crate::app::App;
use crate::constants::server::SERVER_VERSION;
use crate::errors::ToolError;
use crate::mcp::catalog::tool_catalog;
use crate::mcp::server::McpServer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/mcp", post(mcp_call))
        .with_state(app)
}

/// Liveness plus credential presence. Never contacts the token endpoint.
async fn health(State(app): State<Arc<App>>) -> (StatusCode, Json<Value>) {
    let configured = app.has_credentials();
    let (status, code) = if configured {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };
    let tools: Vec<&str> = tool_catalog().iter().map(|t| t.name.as_str()).collect();
    (
        code,
        Json(serde_json::json!({
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": SERVER_VERSION,
            "credentials_configured": configured,
            "mcp_tools": tools,
        })),
    )
}

async fn list_tools() -> Json<Value> {
    let tools: Vec<Value> = tool_catalog()
        .iter()
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameter_names(),
            })
        })
        .collect();
    Json(serde_json::json!({ "tools": tools }))
}

/// One JSON-RPC message per request body. Notifications are acknowledged
/// with 202 and no body.
async fn mcp_call(State(app): State<Arc<App>>, body: String) -> Response {
    match McpServer::new(app).handle_message(&body).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn serve_on(listener: TcpListener, app: Arc<App>) -> Result<(), ToolError> {
    if let Ok(addr) = listener.local_addr() {
        app.logger.info(
            "web surface listening",
            Some(&serde_json::json!({ "addr": addr.to_string() })),
        );
    }
    axum::serve(listener, router(app)).await?;
    Ok(())
}

pub async fn serve(addr: SocketAddr, app: Arc<App>) -> Result<(), ToolError> {
    let listener = TcpListener::bind(addr).await.map_err(|err| {
        ToolError::internal(format!("failed to bind {}: {}", addr, err))
    })?;
    serve_on(listener, app).await
}
