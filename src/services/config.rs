use crate::constants::{network, protocols::ALLOWED_HTTP, sentinel, token};
use crate::services::sentinel_client::RetryPolicy;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CLIENT_ID_KEYS: &[&str] = &["SENTINELHUB_CLIENT_ID", "CLIENT_ID"];
const CLIENT_SECRET_KEYS: &[&str] = &["SENTINELHUB_CLIENT_SECRET", "CLIENT_SECRET"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid http(s) URL: {value}")]
    InvalidUrl { key: String, value: String },
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// OAuth client credentials. The secret never appears in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub credentials: Option<Credentials>,
    pub base_url: String,
    pub oauth_url: String,
    pub timeout: Duration,
    pub token_margin: Duration,
    pub retry: RetryPolicy,
}

impl SentinelConfig {
    /// Defaults pointed at the given endpoints, without credentials.
    pub fn for_endpoints(base_url: &str, oauth_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            credentials: None,
            base_url: normalize_base_url("SENTINELHUB_BASE_URL", base_url)?,
            oauth_url: normalize_base_url("SENTINELHUB_OAUTH_URL", oauth_url)?,
            timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            token_margin: Duration::from_secs(token::SAFETY_MARGIN_SECS),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let base_url = get("SENTINELHUB_BASE_URL")
            .unwrap_or_else(|| sentinel::DEFAULT_BASE_URL.to_string());
        let oauth_url = get("SENTINELHUB_OAUTH_URL")
            .unwrap_or_else(|| sentinel::DEFAULT_OAUTH_URL.to_string());
        let mut config = Self::for_endpoints(&base_url, &oauth_url)?;

        if let (Some(id), Some(secret)) = (first(CLIENT_ID_KEYS), first(CLIENT_SECRET_KEYS)) {
            config.credentials = Some(Credentials::new(id, secret));
        }
        if let Some(raw) = get("SENTINELHUB_TIMEOUT_MS") {
            config.timeout = Duration::from_millis(parse_positive("SENTINELHUB_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = get("SENTINELHUB_TOKEN_MARGIN_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "SENTINELHUB_TOKEN_MARGIN_SECS".to_string(),
                value: raw.clone(),
            })?;
            config.token_margin = Duration::from_secs(secs);
        }
        if let Some(raw) = get("SENTINELHUB_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_positive("SENTINELHUB_MAX_ATTEMPTS", &raw)? as usize;
        }
        Ok(config)
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn normalize_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key: key.to_string(),
        value: raw.to_string(),
    };
    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !ALLOWED_HTTP.contains(&url.scheme()) {
        return Err(invalid());
    }
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}
