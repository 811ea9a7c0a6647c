pub mod data_sources;
pub mod evalscript;
pub mod processing;
pub mod statistics;

use crate::errors::{ToolError, ToolErrorKind};
use serde::Serialize;
use serde_json::Value;

pub(crate) fn to_body<T: Serialize>(request: &T) -> Result<Value, ToolError> {
    serde_json::to_value(request)
        .map_err(|err| ToolError::internal(format!("failed to encode request body: {}", err)))
}

pub(crate) fn unexpected_binary(content_type: &str) -> ToolError {
    ToolError::new(
        ToolErrorKind::UpstreamError,
        "unexpected_content_type",
        format!("expected a JSON response, got {}", content_type),
    )
}
