use crate::constants::limits::ERROR_BODY_PREVIEW_BYTES;
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::sentinel_client::{InvokeError, RawResponse};
use crate::utils::redact::{redact_message, redact_text};
use crate::utils::text::preview_body;
use bytes::Bytes;
use serde_json::Value;

/// Successful reply from the remote API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Json { content_type: String, data: Value },
    Binary { content_type: String, bytes: Bytes },
}

pub type ApiResult = Result<ApiPayload, ToolError>;

/// Maps one invocation outcome onto the tool error taxonomy.
pub fn normalize(outcome: Result<RawResponse, InvokeError>) -> ApiResult {
    match outcome {
        Ok(raw) => Ok(decode_success(raw)),
        Err(InvokeError::Timeout {
            endpoint,
            timeout_ms,
        }) => Err(ToolError::network(
            "timeout",
            format!("{} timed out after {} ms", endpoint, timeout_ms),
        )),
        Err(InvokeError::Transport { message, .. }) => {
            Err(ToolError::network("network_error", message))
        }
        Err(InvokeError::Status { response, .. }) => Err(map_status(&response)),
    }
}

/// JSON replies keep the upstream content-type header as sent; unlabeled
/// JSON is reported as `application/json`.
fn decode_success(raw: RawResponse) -> ApiPayload {
    let media = raw
        .content_type
        .as_deref()
        .map(media_type)
        .unwrap_or_default();

    if !is_binary_media(&media) {
        if let Ok(data) = serde_json::from_slice::<Value>(&raw.body) {
            let content_type = raw
                .content_type
                .filter(|header| !header.trim().is_empty())
                .unwrap_or_else(|| "application/json".to_string());
            return ApiPayload::Json { content_type, data };
        }
    }

    let content_type = if media.is_empty() {
        "application/octet-stream".to_string()
    } else {
        media
    };
    ApiPayload::Binary {
        content_type,
        bytes: raw.body,
    }
}

fn map_status(response: &RawResponse) -> ToolError {
    let status = response.status.as_u16();
    let detail = extract_upstream_message(&response.body);
    match status {
        401 | 403 => ToolError::auth("authentication_failed", "authentication failed")
            .with_status(status)
            .with_details(serde_json::json!({ "upstream_message": detail })),
        400 => ToolError::new(ToolErrorKind::ValidationError, "upstream_rejected", detail)
            .with_status(status),
        _ => ToolError::upstream(status, detail),
    }
}

/// Pulls a human-readable message out of an error body, falling back to a
/// redacted preview of the raw text.
pub fn extract_upstream_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let candidates = [
            value.pointer("/error/message"),
            value.get("message"),
            value.get("error").filter(|v| v.is_string()),
            value.get("error_description"),
        ];
        if let Some(found) = candidates
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
        {
            return redact_message(found, ERROR_BODY_PREVIEW_BYTES);
        }
    }
    let preview = preview_body(body, ERROR_BODY_PREVIEW_BYTES);
    if preview.is_empty() {
        "upstream returned an empty error body".to_string()
    } else {
        redact_text(&preview, ERROR_BODY_PREVIEW_BYTES)
    }
}

fn media_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn is_binary_media(media: &str) -> bool {
    media.starts_with("image/")
        || media == "application/octet-stream"
        || media == "application/zip"
        || media == "application/x-tar"
}
