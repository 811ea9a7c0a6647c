use crate::errors::ToolError;
use crate::managers::to_body;
use crate::models::{ProcessingInputs, RequestInfo};
use crate::services::logger::Logger;
use crate::services::request_builder::RequestBuilder;
use crate::services::response::ApiPayload;
use crate::services::sentinel_client::{ApiRequest, Endpoint, SentinelClient};
use crate::services::validation::Validation;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;

pub const TOOL_NAME: &str = "process_satellite_imagery";

#[derive(Clone)]
pub struct ProcessingManager {
    logger: Logger,
    validation: Validation,
    builder: RequestBuilder,
    client: Arc<SentinelClient>,
}

impl ProcessingManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        builder: RequestBuilder,
        client: Arc<SentinelClient>,
    ) -> Self {
        Self {
            logger: logger.child("processing"),
            validation,
            builder,
            client,
        }
    }

    pub async fn process_imagery(&self, inputs: ProcessingInputs) -> Result<Value, ToolError> {
        let request = self.builder.build_processing_request(&inputs)?;
        let info = RequestInfo::new(&request.time, &request.data, &request.area)
            .with_output_format(&request.format);
        let accept = request.format.clone();
        let body = to_body(&request)?;

        let payload = self
            .client
            .execute(ApiRequest::json(Endpoint::Process, Some(body)).with_accept(accept))
            .await?;
        match payload {
            ApiPayload::Binary {
                content_type,
                bytes,
            } => {
                self.logger.info(
                    "image rendered",
                    Some(&serde_json::json!({
                        "content_type": content_type,
                        "size_bytes": bytes.len(),
                    })),
                );
                Ok(serde_json::json!({
                    "success": true,
                    "image_data": STANDARD.encode(&bytes),
                    "content_type": content_type,
                    "size_bytes": bytes.len(),
                    "request_info": info,
                }))
            }
            ApiPayload::Json { content_type, data } => Ok(serde_json::json!({
                "success": true,
                "data": data,
                "content_type": content_type,
                "request_info": info,
            })),
        }
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for ProcessingManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let inputs: ProcessingInputs = self.validation.parse_args(TOOL_NAME, args)?;
        self.process_imagery(inputs).await
    }
}
