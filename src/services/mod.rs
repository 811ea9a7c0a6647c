pub mod config;
pub mod evalscript;
pub mod logger;
pub mod request_builder;
pub mod response;
pub mod sentinel_client;
pub mod token;
pub mod tool_executor;
pub mod validation;
