use crate::app::App;
use crate::constants::server::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::errors::{McpError, ToolError};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::tool_executor::ToolOutcome;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

/// Renders an outcome as an MCP `tools/call` result. Image payloads also get
/// an `image` content block; the text block omits the base64 body.
fn tool_call_result(outcome: &ToolOutcome) -> Value {
    let payload = outcome.payload();
    let image = match (
        payload.get("image_data").and_then(|v| v.as_str()),
        payload.get("content_type").and_then(|v| v.as_str()),
    ) {
        (Some(data), Some(mime)) => Some(serde_json::json!({
            "type": "image",
            "data": data,
            "mimeType": mime,
        })),
        _ => None,
    };

    let mut summary = payload.clone();
    if image.is_some() {
        if let Value::Object(map) = &mut summary {
            map.remove("image_data");
        }
    }
    let text = serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string());

    let mut content = vec![serde_json::json!({ "type": "text", "text": text })];
    content.extend(image);
    serde_json::json!({
        "content": content,
        "isError": outcome.is_error(),
        "structuredContent": payload,
        "_meta": outcome.meta(),
    })
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": tool_catalog() })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        let outcome = self.app.tool_executor.execute(name, args).await?;
        Ok(tool_call_result(&outcome))
    }

    /// Handles one line of input. Returns `None` when no reply is due.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => return Some(JsonRpcResponse::from_error(Value::Null, McpError::parse_error())),
        };
        let fallback_id = parsed.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(err) => {
                return Some(JsonRpcResponse::from_error(
                    fallback_id,
                    McpError::invalid_request(&err.to_string()),
                ))
            }
        };

        if request.is_notification() {
            self.app.logger.debug(
                "notification received",
                Some(&serde_json::json!({ "method": request.method })),
            );
            return None;
        }
        let id = request.id.clone().unwrap_or_default();

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => match self.handle_tools_call(&request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => JsonRpcResponse::from_error(id, err),
            },
            other => JsonRpcResponse::from_error(id, McpError::method_not_found(other)),
        };
        Some(response)
    }

    /// Line-delimited JSON-RPC until the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(trimmed).await {
                let payload = serde_json::to_string(&response)
                    .map_err(|err| ToolError::internal(err.to_string()))?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.app.logger.info("MCP stdio transport ready", None);
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}
