use crate::constants::sentinel::USER_AGENT;
use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::config::SentinelConfig;
use crate::services::logger::Logger;
use crate::services::request_builder::RequestBuilder;
use crate::services::sentinel_client::SentinelClient;
use crate::services::token::TokenManager;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: SentinelConfig,
    pub token_manager: Arc<TokenManager>,
    pub sentinel_client: Arc<SentinelClient>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a registered handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(config: SentinelConfig, logger: Logger) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ToolError::internal(format!("failed to build HTTP client: {}", err)))?;

        if config.has_credentials() {
            logger.info(
                "configuration loaded",
                Some(&serde_json::json!({
                    "base_url": config.base_url,
                    "timeout_ms": config.timeout.as_millis() as u64,
                    "max_attempts": config.retry.max_attempts,
                })),
            );
        } else {
            logger.error(
                "Sentinel Hub credentials are not configured; remote tools will fail until SENTINELHUB_CLIENT_ID and SENTINELHUB_CLIENT_SECRET are set",
                None,
            );
        }

        let token_manager = Arc::new(TokenManager::new(logger.clone(), http.clone(), &config));
        let sentinel_client = Arc::new(SentinelClient::new(
            logger.clone(),
            http,
            &config,
            token_manager.clone(),
        ));
        let builder = RequestBuilder::new(logger.clone());

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(
            managers::statistics::TOOL_NAME.to_string(),
            Arc::new(managers::statistics::StatisticsManager::new(
                logger.clone(),
                validation.clone(),
                builder.clone(),
                sentinel_client.clone(),
            )),
        );
        handlers.insert(
            managers::processing::TOOL_NAME.to_string(),
            Arc::new(managers::processing::ProcessingManager::new(
                logger.clone(),
                validation.clone(),
                builder,
                sentinel_client.clone(),
            )),
        );
        handlers.insert(
            managers::data_sources::TOOL_NAME.to_string(),
            Arc::new(managers::data_sources::DataSourcesManager::new(
                logger.clone(),
                validation.clone(),
                sentinel_client.clone(),
            )),
        );
        handlers.insert(
            managers::evalscript::TOOL_NAME.to_string(),
            Arc::new(managers::evalscript::EvalscriptManager::new(
                logger.clone(),
                validation,
            )),
        );

        Self::validate_tool_wiring(&handlers)?;
        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        Ok(Self {
            logger,
            config,
            token_manager,
            sentinel_client,
            tool_executor,
        })
    }

    /// Credential presence only; never triggers a token exchange.
    pub fn has_credentials(&self) -> bool {
        self.token_manager.has_credentials()
    }
}
