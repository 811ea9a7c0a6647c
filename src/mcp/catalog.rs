use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDef {
    /// Top-level argument names in schema order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.input_schema
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn tool_names() -> Vec<&'static str> {
    TOOL_CATALOG.iter().map(|tool| tool.name.as_str()).collect()
}

/// Checks arguments against the tool's input schema. Violations come back
/// as a `validation_error` listing every problem found.
pub fn validate_tool_arguments(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    let violations: Vec<String> = match schema.validate(args) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .take(10)
            .map(|err| describe_violation(&err, &tool.input_schema))
            .collect(),
    };

    let mut message = format!("Invalid arguments for {}", tool_name);
    if let Some(first) = violations.first() {
        message.push_str(": ");
        message.push_str(first);
    }
    Err(ToolError::validation("schema_violation", message)
        .with_details(serde_json::json!({ "violations": violations }))
        .with_hint(format!(
            "Accepted arguments: {}",
            tool.parameter_names().join(", ")
        )))
}

fn describe_violation(err: &jsonschema::ValidationError<'_>, schema: &Value) -> String {
    let path = err.instance_path.to_string();
    let at = if path.is_empty() {
        "(root)".to_string()
    } else {
        path
    };
    match &err.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let known: Vec<String> = schema
                .get("properties")
                .and_then(|v| v.as_object())
                .map(|props| props.keys().cloned().collect())
                .unwrap_or_default();
            let known_refs: Vec<&str> = known.iter().map(String::as_str).collect();
            let parts: Vec<String> = unexpected
                .iter()
                .map(|field| {
                    let close = suggest(field, &known_refs, 1);
                    match close.first() {
                        Some(best) => format!("unknown field '{}' (did you mean '{}'?)", field, best),
                        None => format!("unknown field '{}'", field),
                    }
                })
                .collect();
            if parts.is_empty() {
                format!("{}: unknown field", at)
            } else {
                format!("{}: {}", at, parts.join(", "))
            }
        }
        ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("{}: missing required field '{}'", at, prop)
        }
        ValidationErrorKind::Type { kind } => {
            format!("{}: expected {}", at, format_type_kind(kind))
        }
        ValidationErrorKind::Enum { options } => {
            format!("{}: expected one of {}", at, options)
        }
        _ => format!("{}: {}", at, err),
    }
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_lists_four_tools_with_compiled_schemas() {
        assert_eq!(
            tool_names(),
            vec![
                "get_satellite_statistics",
                "process_satellite_imagery",
                "get_available_data_sources",
                "validate_evalscript",
            ]
        );
        for name in tool_names() {
            assert!(TOOL_VALIDATORS.contains_key(name), "schema for {}", name);
        }
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = validate_tool_arguments("validate_evalscript", &json!({})).expect_err("invalid");
        assert_eq!(err.code, "schema_violation");
        assert!(err.message.contains("evalscript"));
    }

    #[test]
    fn unknown_field_gets_suggestion() {
        let err = validate_tool_arguments(
            "validate_evalscript",
            &json!({ "evalscript": "x", "evalscrpt": "y" }),
        )
        .expect_err("invalid");
        let violations = err.details.expect("details")["violations"].to_string();
        assert!(violations.contains("did you mean 'evalscript'"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let err = validate_tool_arguments(
            "get_available_data_sources",
            &json!({ "include_remote": "yes" }),
        )
        .expect_err("invalid");
        assert!(err.message.contains("/include_remote"));
    }

    #[test]
    fn parameter_names_follow_schema() {
        let tool = tool_by_name("validate_evalscript").expect("tool");
        assert_eq!(tool.parameter_names(), vec!["evalscript"]);
    }
}
