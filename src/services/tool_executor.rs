use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{McpError, ToolError};
use crate::mcp::catalog::validate_tool_arguments;
use crate::services::logger::Logger;
use crate::utils::tool_errors::unknown_tool_error;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Result of one tool invocation plus call metadata.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub tool: String,
    pub trace_id: String,
    pub duration_ms: u64,
    pub result: Result<Value, ToolError>,
}

impl ToolOutcome {
    pub fn meta(&self) -> Value {
        serde_json::json!({
            "tool": self.tool,
            "trace_id": self.trace_id,
            "duration_ms": self.duration_ms,
        })
    }

    /// Success payload or the structured error object.
    pub fn payload(&self) -> Value {
        match &self.result {
            Ok(value) => value.clone(),
            Err(err) => err.to_payload(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Schema check, then dispatch. Only an unknown tool name is a protocol
    /// error; everything else lands in the outcome.
    pub async fn execute(&self, tool: &str, args: Value) -> Result<ToolOutcome, McpError> {
        let Some(handler) = self.handlers.get(tool).cloned() else {
            let names = self.tool_names();
            let known: Vec<&str> = names.iter().map(String::as_str).collect();
            self.logger.warn(
                "unknown tool requested",
                Some(&serde_json::json!({ "tool": tool })),
            );
            return Err(unknown_tool_error(tool, &known));
        };

        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        let trace_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        self.logger.debug(
            "tool call started",
            Some(&serde_json::json!({ "tool": tool, "trace_id": trace_id })),
        );

        let result = match validate_tool_arguments(tool, &args) {
            Ok(()) => handler.handle(args).await,
            Err(err) => Err(err),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => self.logger.info(
                "tool call succeeded",
                Some(&serde_json::json!({
                    "tool": tool,
                    "trace_id": trace_id,
                    "duration_ms": duration_ms,
                })),
            ),
            Err(err) => self.logger.warn(
                "tool call failed",
                Some(&serde_json::json!({
                    "tool": tool,
                    "trace_id": trace_id,
                    "duration_ms": duration_ms,
                    "error_type": err.kind.as_str(),
                    "code": err.code,
                    "message": err.message,
                })),
            ),
        }

        Ok(ToolOutcome {
            tool: tool.to_string(),
            trace_id,
            duration_ms,
            result,
        })
    }
}
