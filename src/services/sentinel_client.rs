use crate::constants::retry as retry_constants;
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::config::SentinelConfig;
use crate::services::logger::Logger;
use crate::services::response::{normalize, ApiResult};
use crate::services::token::{BearerToken, TokenManager};
use bytes::Bytes;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Remote API operations this server calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Statistics,
    Process,
    DataCollections,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::Statistics | Endpoint::Process => Method::POST,
            Endpoint::DataCollections => Method::GET,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Statistics => "statistics",
            Endpoint::Process => "process",
            Endpoint::DataCollections => "data",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method(), self.path())
    }
}

/// Status, content type and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{endpoint} timed out after {timeout_ms} ms")]
    Timeout { endpoint: Endpoint, timeout_ms: u64 },
    #[error("{endpoint} failed: {message}")]
    Transport { endpoint: Endpoint, message: String },
    #[error("{endpoint} returned HTTP {}", .response.status.as_u16())]
    Status {
        endpoint: Endpoint,
        response: RawResponse,
    },
}

/// When and how often a failed call is repeated. The default makes exactly
/// one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
    pub status_codes: Vec<u16>,
    pub retry_on_network_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry_constants::MAX_DELAY_MS),
            jitter: retry_constants::JITTER,
            status_codes: retry_constants::STATUS_CODES.to_vec(),
            retry_on_network_error: true,
        }
    }
}

impl RetryPolicy {
    pub fn attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    fn should_retry(&self, attempt: usize, error: &InvokeError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match error {
            InvokeError::Timeout { .. } | InvokeError::Transport { .. } => {
                self.retry_on_network_error
            }
            InvokeError::Status { response, .. } => {
                self.status_codes.contains(&response.status.as_u16())
            }
        }
    }

    /// Exponential backoff with symmetric jitter, capped at `max_delay`.
    fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        let base = self.base_delay.as_millis() as f64 * 2f64.powi(exponent as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let factor = if self.jitter > 0.0 {
            1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter)
        } else {
            1.0
        };
        Duration::from_millis((capped * factor).max(0.0) as u64)
    }
}

/// What to send: endpoint, optional JSON body and the media type to ask for.
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
    pub accept: String,
}

impl ApiRequest {
    pub fn json(endpoint: Endpoint, body: Option<Value>) -> Self {
        Self {
            endpoint,
            body,
            accept: "application/json".to_string(),
        }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }
}

/// Authenticated caller for the Sentinel Hub API.
pub struct SentinelClient {
    logger: Logger,
    client: Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    tokens: Arc<TokenManager>,
}

impl SentinelClient {
    pub fn new(
        logger: Logger,
        client: Client,
        config: &SentinelConfig,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            logger: logger.child("api"),
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            retry: config.retry.clone(),
            tokens,
        }
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Token, invoke, normalize. An upstream 401 drops the cached token so
    /// the next call re-authenticates.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult {
        let token = self.tokens.get_token().await?;
        let started = Instant::now();
        let outcome = self.invoke(&request, &token).await;
        let result = normalize(outcome);
        match &result {
            Ok(_) => self.logger.info(
                "request succeeded",
                Some(&serde_json::json!({
                    "endpoint": request.endpoint.to_string(),
                    "duration_ms": started.elapsed().as_millis() as u64,
                })),
            ),
            Err(err) => {
                self.logger.warn(
                    "request failed",
                    Some(&serde_json::json!({
                        "endpoint": request.endpoint.to_string(),
                        "error_type": err.kind.as_str(),
                        "status": err.status,
                        "message": err.message,
                    })),
                );
                if err.kind == ToolErrorKind::AuthError && err.status == Some(401) {
                    self.tokens.invalidate().await;
                }
            }
        }
        result
    }

    /// Sends the request, repeating per the retry policy. Non-2xx statuses
    /// come back as `InvokeError::Status`.
    pub async fn invoke(
        &self,
        request: &ApiRequest,
        token: &BearerToken,
    ) -> Result<RawResponse, InvokeError> {
        let headers = self.build_headers(token, &request.accept);
        let url = self.url_for(request.endpoint);
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let outcome = self.send_once(request, &url, headers.clone()).await;
            match outcome {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay_for(attempt);
                    self.logger.warn(
                        "retrying request",
                        Some(&serde_json::json!({
                            "endpoint": request.endpoint.to_string(),
                            "attempt": attempt,
                            "delay_ms": delay.as_millis() as u64,
                            "reason": err.to_string(),
                        })),
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        url: &str,
        headers: HeaderMap,
    ) -> Result<RawResponse, InvokeError> {
        let endpoint = request.endpoint;
        let mut builder = self
            .client
            .request(endpoint.method(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                content_type,
                body,
            })
        };

        let raw = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| InvokeError::Timeout {
                endpoint,
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|err| InvokeError::Transport {
                endpoint,
                message: describe_transport_error(&err),
            })?;

        if raw.status.is_success() {
            Ok(raw)
        } else {
            Err(InvokeError::Status {
                endpoint,
                response: raw,
            })
        }
    }

    fn build_headers(&self, token: &BearerToken, accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(accept) {
            headers.insert(ACCEPT, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let kind = if err.is_connect() {
        "connection failed"
    } else if err.is_timeout() {
        "timed out"
    } else if err.is_body() || err.is_decode() {
        "response body could not be read"
    } else {
        "request failed"
    };
    let mut message = format!("{}: {}", kind, err);
    let mut source = StdError::source(err);
    while let Some(inner) = source {
        message.push_str(&format!(": {}", inner));
        source = inner.source();
    }
    message
}

impl From<InvokeError> for ToolError {
    fn from(err: InvokeError) -> Self {
        match normalize(Err(err)) {
            Err(mapped) => mapped,
            Ok(_) => ToolError::internal("invoke error normalized to success"),
        }
    }
}
