use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

/// Machine-readable failure category. Serialized as the `error_type` field
/// of every failed tool result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Bad caller input. Never retried.
    ValidationError,
    /// Missing or rejected credentials.
    AuthError,
    /// Transport failure before an HTTP status was received.
    NetworkError,
    /// The remote API answered with an error status.
    UpstreamError,
    InternalError,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::ValidationError => "validation_error",
            ToolErrorKind::AuthError => "auth_error",
            ToolErrorKind::NetworkError => "network_error",
            ToolErrorKind::UpstreamError => "upstream_error",
            ToolErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    #[serde(rename = "error_type")]
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            status: None,
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::NetworkError),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ValidationError, code, message)
    }

    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::AuthError, code, message)
    }

    pub fn network(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NetworkError, code, message)
    }

    /// Remote API error. 429 and 5xx are marked retryable.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let code = if status == 429 {
            "rate_limited"
        } else {
            "upstream_error"
        };
        Self::new(ToolErrorKind::UpstreamError, code, message)
            .with_status(status)
            .with_retryable(status == 429 || (500..600).contains(&status))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InternalError, "internal_error", message)
    }

    /// The structured error object returned to tool callers.
    pub fn to_payload(&self) -> Value {
        let mut payload = serde_json::json!({ "success": false });
        if let (Some(obj), Ok(Value::Object(fields))) =
            (payload.as_object_mut(), serde_json::to_value(self))
        {
            obj.extend(fields);
        }
        payload
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}
