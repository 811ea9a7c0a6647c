pub mod sentinel {
    pub const DEFAULT_BASE_URL: &str = "https://services.sentinel-hub.com/api/v1";
    pub const DEFAULT_OAUTH_URL: &str = "https://services.sentinel-hub.com/oauth/token";
    pub const DEFAULT_OUTPUT_FORMAT: &str = "image/png";
    pub const MAX_OUTPUT_DIMENSION: u32 = 2_500;
    pub const USER_AGENT: &str = concat!("sentinelhub-mcp/", env!("CARGO_PKG_VERSION"));
}

pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
}

pub mod token {
    pub const SAFETY_MARGIN_SECS: u64 = 60;
    pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3_600;
    pub const GRANT_TYPE: &str = "client_credentials";
}

pub mod retry {
    // One attempt unless configured otherwise.
    pub const MAX_ATTEMPTS: usize = 1;
    pub const BASE_DELAY_MS: u64 = 250;
    pub const MAX_DELAY_MS: u64 = 5_000;
    pub const JITTER: f64 = 0.2;
    pub const STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];
}

pub mod limits {
    pub const ERROR_BODY_PREVIEW_BYTES: usize = 2_048;
    pub const LOG_SUBSTRING_LENGTH: usize = 200;
    pub const SHORT_EVALSCRIPT_CHARS: usize = 50;
    pub const VERSION_MARKER_SCAN_LINES: usize = 3;
}

pub mod server {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const SERVER_NAME: &str = "sentinelhub-mcp";
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http", "https"];
}
