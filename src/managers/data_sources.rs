use crate::errors::ToolError;
use crate::managers::unexpected_binary;
use crate::models::KNOWN_COLLECTIONS;
use crate::services::logger::Logger;
use crate::services::response::ApiPayload;
use crate::services::sentinel_client::{ApiRequest, Endpoint, SentinelClient};
use crate::services::validation::Validation;
use serde_json::Value;
use std::sync::Arc;

pub const TOOL_NAME: &str = "get_available_data_sources";

#[derive(Clone)]
pub struct DataSourcesManager {
    logger: Logger,
    validation: Validation,
    client: Arc<SentinelClient>,
}

impl DataSourcesManager {
    pub fn new(logger: Logger, validation: Validation, client: Arc<SentinelClient>) -> Self {
        Self {
            logger: logger.child("data_sources"),
            validation,
            client,
        }
    }

    /// The built-in collection list; the remote listing only on request.
    pub async fn list(&self, include_remote: bool) -> Result<Value, ToolError> {
        let mut result = serde_json::json!({
            "success": true,
            "data_sources": KNOWN_COLLECTIONS,
            "count": KNOWN_COLLECTIONS.len(),
        });
        if !include_remote {
            return Ok(result);
        }

        let remote = match self
            .client
            .execute(ApiRequest::json(Endpoint::DataCollections, None))
            .await?
        {
            ApiPayload::Json { data, .. } => data,
            ApiPayload::Binary { content_type, .. } => return Err(unexpected_binary(&content_type)),
        };
        let remote_count = remote.as_array().map(|arr| arr.len()).unwrap_or(1);
        self.logger.debug(
            "remote collection listing fetched",
            Some(&serde_json::json!({ "count": remote_count })),
        );
        if let Value::Object(map) = &mut result {
            map.insert("remote".to_string(), remote);
            map.insert("remote_count".to_string(), Value::from(remote_count));
        }
        Ok(result)
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for DataSourcesManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let include_remote = self
            .validation
            .optional_bool(args.get("include_remote"), "include_remote")?;
        self.list(include_remote).await
    }
}
