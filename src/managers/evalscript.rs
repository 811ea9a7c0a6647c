use crate::errors::ToolError;
use crate::services::evalscript;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use serde_json::Value;

pub const TOOL_NAME: &str = "validate_evalscript";

#[derive(Clone)]
pub struct EvalscriptManager {
    logger: Logger,
    validation: Validation,
}

impl EvalscriptManager {
    pub fn new(logger: Logger, validation: Validation) -> Self {
        Self {
            logger: logger.child("evalscript"),
            validation,
        }
    }

    pub fn check(&self, script: &str) -> Result<Value, ToolError> {
        let report = evalscript::validate(script);
        self.logger.debug(
            "evalscript checked",
            Some(&serde_json::json!({ "valid": report.valid, "issues": report.issues.len() })),
        );
        let mut payload = serde_json::to_value(&report)
            .map_err(|err| ToolError::internal(format!("failed to encode report: {}", err)))?;
        if let Value::Object(map) = &mut payload {
            map.insert("success".to_string(), Value::Bool(true));
        }
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for EvalscriptManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let script = self
            .validation
            .ensure_string(args.get("evalscript"), "evalscript")?;
        self.check(&script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_wrapped_as_success_payload() {
        let manager = EvalscriptManager::new(Logger::new("test"), Validation::new());
        let payload = manager
            .check("function evaluatePixel(s){return [s.B04];}")
            .expect("payload");
        assert_eq!(payload["success"], true);
        assert_eq!(payload["valid"], false);
        assert_eq!(
            payload["issues"],
            serde_json::json!(["missing setup function", "missing version marker"])
        );
    }
}
