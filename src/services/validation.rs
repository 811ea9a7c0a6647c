use crate::errors::ToolError;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    /// Deserializes tool arguments. A missing or null argument object counts
    /// as `{}` so optional-only tools accept a bare call.
    pub fn parse_args<T: DeserializeOwned>(&self, tool: &str, args: Value) -> Result<T, ToolError> {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        if !args.is_object() {
            return Err(ToolError::validation(
                "invalid_arguments",
                format!("{} arguments must be an object", tool),
            ));
        }
        serde_json::from_value(args).map_err(|err| {
            ToolError::validation(
                "invalid_arguments",
                format!("{} arguments are malformed: {}", tool, err),
            )
        })
    }

    pub fn ensure_string(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        match value {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(Value::Null) | None => Err(ToolError::validation(
                "missing_argument",
                format!("{} is required", label),
            )),
            Some(_) => Err(ToolError::validation(
                "invalid_arguments",
                format!("{} must be a string", label),
            )),
        }
    }

    pub fn optional_bool(&self, value: Option<&Value>, label: &str) -> Result<bool, ToolError> {
        match value {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(_) => Err(ToolError::validation(
                "invalid_arguments",
                format!("{} must be a boolean", label),
            )),
        }
    }
}
