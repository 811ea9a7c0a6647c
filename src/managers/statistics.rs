use crate::errors::ToolError;
use crate::managers::{to_body, unexpected_binary};
use crate::models::{RequestInfo, StatisticsInputs};
use crate::services::logger::Logger;
use crate::services::request_builder::RequestBuilder;
use crate::services::response::ApiPayload;
use crate::services::sentinel_client::{ApiRequest, Endpoint, SentinelClient};
use crate::services::validation::Validation;
use serde_json::Value;
use std::sync::Arc;

pub const TOOL_NAME: &str = "get_satellite_statistics";

#[derive(Clone)]
pub struct StatisticsManager {
    logger: Logger,
    validation: Validation,
    builder: RequestBuilder,
    client: Arc<SentinelClient>,
}

impl StatisticsManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        builder: RequestBuilder,
        client: Arc<SentinelClient>,
    ) -> Self {
        Self {
            logger: logger.child("statistics"),
            validation,
            builder,
            client,
        }
    }

    pub async fn get_statistics(&self, inputs: StatisticsInputs) -> Result<Value, ToolError> {
        let request = self.builder.build_statistics_request(&inputs)?;
        let info = RequestInfo::new(&request.time, &request.data, &request.area);
        let body = to_body(&request)?;

        let payload = self
            .client
            .execute(ApiRequest::json(Endpoint::Statistics, Some(body)))
            .await?;
        match payload {
            ApiPayload::Json { data, .. } => {
                let points = data
                    .get("data")
                    .and_then(|v| v.as_array())
                    .map(|arr| arr.len())
                    .unwrap_or(0);
                self.logger.info(
                    "statistics retrieved",
                    Some(&serde_json::json!({ "data_points": points })),
                );
                Ok(serde_json::json!({
                    "success": true,
                    "data": data,
                    "request_info": info,
                }))
            }
            ApiPayload::Binary { content_type, .. } => Err(unexpected_binary(&content_type)),
        }
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for StatisticsManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let inputs: StatisticsInputs = self.validation.parse_args(TOOL_NAME, args)?;
        self.get_statistics(inputs).await
    }
}
