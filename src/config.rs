//! 网关配置：从环境变量读取凭证与后端地址。
//!
//! Gateway configuration, read once at startup from the environment.
//!
//! A missing credential is a startup warning, never a crash: requests go out
//! without auth headers and the backend answers 1004, which surfaces as an
//! [`crate::Error::Auth`] on the first tool call.

use std::env;

/// Environment variable carrying the API credential.
pub const API_KEY_ENV: &str = "SYNCLUB_MCP_API";
/// Environment variable carrying the backend base URL.
pub const API_HOST_ENV: &str = "UNIFIED_API_BASE_URL";

/// Static configuration for the HTTP gateway.
///
/// Constructed once at startup and shared by reference; there is no ambient
/// global state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API credential injected as `Authorization` and `X-API-Key`.
    pub api_key: Option<String>,
    /// Backend base URL, e.g. `https://api.example.com`.
    pub api_host: String,
}

impl GatewayConfig {
    pub fn new(api_key: Option<String>, api_host: impl Into<String>) -> Self {
        Self {
            api_key,
            api_host: api_host.into(),
        }
    }

    /// Read configuration from the environment, warning about gaps instead of
    /// failing.
    pub fn from_env() -> Self {
        let api_key = env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "environment variable {API_KEY_ENV} is not set; backend requests will fail authentication"
            );
        }

        let api_host = match env::var(API_HOST_ENV) {
            Ok(host) if !host.is_empty() => host,
            _ => {
                tracing::warn!(
                    "environment variable {API_HOST_ENV} is not set; backend requests will fail"
                );
                String::new()
            }
        };

        Self { api_key, api_host }
    }
}
