use std::env;

use crate::utils::validation::MAX_UPLOAD_SIZE;

/// Endpoint paths on the portal backend. These are part of the backend's
/// contract and are not configurable.
pub const PRESIGN_PATH: &str = "/s3/presign";
pub const PRESIGN_GET_PATH: &str = "/s3/presign-get";
pub const GRAPHQL_PATH: &str = "/graphql";
pub const EMBED_PATH: &str = "/quicksight/embed-url";

/// Client configuration for the upload workflow
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the portal backend (default: "http://127.0.0.1:3000")
    pub api_base: String,

    /// Maximum upload size in bytes (default: 10 MiB)
    pub max_upload_size: u64,

    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:3000".to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
            request_timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_base: env::var("PORTAL_API_BASE").unwrap_or(default.api_base),

            max_upload_size: env::var("PORTAL_MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            request_timeout_secs: env::var("PORTAL_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),
        }
    }

    /// Config pointed at a specific backend, with defaults for the rest
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    pub fn presign_url(&self) -> String {
        self.join(PRESIGN_PATH)
    }

    pub fn presign_get_url(&self) -> String {
        self.join(PRESIGN_GET_PATH)
    }

    pub fn graphql_url(&self) -> String {
        self.join(GRAPHQL_PATH)
    }

    pub fn embed_url(&self) -> String {
        self.join(EMBED_PATH)
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.presign_url(), "http://127.0.0.1:3000/s3/presign");
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let config = PortalConfig::with_api_base("https://portal.example.com/");
        assert_eq!(config.graphql_url(), "https://portal.example.com/graphql");
        assert_eq!(
            config.embed_url(),
            "https://portal.example.com/quicksight/embed-url"
        );
    }
}
