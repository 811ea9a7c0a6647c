use crate::constants::{limits::ERROR_BODY_PREVIEW_BYTES, token};
use crate::errors::ToolError;
use crate::services::config::{Credentials, SentinelConfig};
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use crate::utils::text::preview_body;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// OAuth bearer credential attached to API calls.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

#[derive(Clone)]
struct CachedToken {
    token: BearerToken,
    expires_at: Instant,
}

impl CachedToken {
    /// A margin too large to represent counts as already expired.
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now()
            .checked_add(margin)
            .map(|deadline| deadline < self.expires_at)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Owns the single cached client-credentials token.
///
/// The cache mutex is held across the freshness check and the grant
/// exchange, so concurrent callers wait for one refresh instead of racing
/// their own.
pub struct TokenManager {
    logger: Logger,
    client: Client,
    oauth_url: String,
    credentials: Option<Credentials>,
    margin: Duration,
    timeout: Duration,
    cache: Mutex<Option<CachedToken>>,
    refreshes: AtomicU64,
}

impl TokenManager {
    pub fn new(logger: Logger, client: Client, config: &SentinelConfig) -> Self {
        Self {
            logger: logger.child("token"),
            client,
            oauth_url: config.oauth_url.clone(),
            credentials: config.credentials.clone(),
            margin: config.token_margin,
            timeout: config.timeout,
            cache: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Credential presence only. Never touches the network.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Number of grant exchanges performed so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub async fn get_token(&self) -> Result<BearerToken, ToolError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ToolError::auth(
                "credentials_missing",
                "Sentinel Hub credentials are not configured",
            )
            .with_hint("Set SENTINELHUB_CLIENT_ID and SENTINELHUB_CLIENT_SECRET (or CLIENT_ID / CLIENT_SECRET) and restart the server.")
        })?;

        let mut guard = self.cache.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh(self.margin) {
                return Ok(cached.token.clone());
            }
            self.logger.debug("cached token expired", None);
        }

        let fresh = self.exchange(credentials).await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    /// Drops the cached token so the next call performs a new grant.
    pub async fn invalidate(&self) {
        let mut guard = self.cache.lock().await;
        if guard.take().is_some() {
            self.logger.info("cached token invalidated", None);
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<CachedToken, ToolError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.logger.debug(
            "requesting access token",
            Some(&serde_json::json!({ "client_id": credentials.client_id(), "url": self.oauth_url })),
        );

        let form = [
            ("grant_type", token::GRANT_TYPE),
            ("client_id", credentials.client_id()),
            ("client_secret", credentials.client_secret()),
        ];
        let request = self
            .client
            .post(&self.oauth_url)
            .header(ACCEPT, "application/json")
            .form(&form);

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };
        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                ToolError::auth("token_endpoint_unreachable", "OAuth token request timed out")
                    .with_retryable(true)
            })?
            .map_err(|err| {
                ToolError::auth(
                    "token_endpoint_unreachable",
                    format!("OAuth token endpoint unreachable: {}", err),
                )
                .with_retryable(true)
            })?;

        if !status.is_success() {
            let preview = redact_text(
                &preview_body(&body, ERROR_BODY_PREVIEW_BYTES),
                ERROR_BODY_PREVIEW_BYTES,
            );
            self.logger.warn(
                "token request rejected",
                Some(&serde_json::json!({ "status": status.as_u16() })),
            );
            return Err(ToolError::auth(
                "token_request_rejected",
                format!("OAuth token request failed ({})", status.as_u16()),
            )
            .with_status(status.as_u16())
            .with_retryable(status.is_server_error())
            .with_details(serde_json::json!({ "body": preview })));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body).map_err(|_| {
            ToolError::auth("token_response_invalid", "OAuth token response is not valid JSON")
        })?;
        let access_token = parsed
            .access_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ToolError::auth(
                    "token_response_invalid",
                    "OAuth token response did not include access_token",
                )
            })?;
        let expires_in = parsed.expires_in.unwrap_or(token::DEFAULT_EXPIRES_IN_SECS);
        let now = Instant::now();
        let expires_at = match now.checked_add(Duration::from_secs(expires_in)) {
            Some(at) => at,
            None => {
                self.logger.warn(
                    "token lifetime out of range, using default",
                    Some(&serde_json::json!({ "expires_in": expires_in })),
                );
                now + Duration::from_secs(token::DEFAULT_EXPIRES_IN_SECS)
            }
        };
        self.logger.info(
            "access token acquired",
            Some(&serde_json::json!({ "expires_in": expires_in })),
        );

        Ok(CachedToken {
            token: BearerToken(access_token),
            expires_at,
        })
    }
}
