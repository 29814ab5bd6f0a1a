//! ============================================================================
//! Client Configuration
//! ============================================================================
//! Base URL, timeouts and image host settings, read from the environment
//! (`.env` is loaded by the binary via dotenvy before this runs).
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL for local development
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// ImgBB-compatible upload endpoint
pub const DEFAULT_IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// ZeroBin API base URL (no trailing slash required)
    pub api_base_url: String,
    /// Per-request timeout. A hung request fails instead of spinning forever.
    pub request_timeout_secs: u64,
    /// Page size used by list views
    pub page_size: u64,
    /// Substitute sample data when a dashboard load fails.
    /// When off, failed loads surface as unavailable.
    pub fallback_data: bool,
    pub image_host_url: String,
    pub image_host_key: Option<String>,
    /// Bearer token picked up from the environment, if any
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            fallback_data: true,
            image_host_url: DEFAULT_IMAGE_HOST_URL.to_string(),
            image_host_key: None,
            token: None,
        }
    }
}

impl ClientConfig {
    /// Build from `ZEROBIN_*` environment variables, defaulting anything unset
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (used by `from_env` and tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            api_base_url: lookup("ZEROBIN_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            request_timeout_secs: lookup("ZEROBIN_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            page_size: lookup("ZEROBIN_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.page_size),
            fallback_data: lookup("ZEROBIN_FALLBACK_DATA")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.fallback_data),
            image_host_url: lookup("ZEROBIN_IMAGE_HOST_URL").unwrap_or(defaults.image_host_url),
            image_host_key: lookup("ZEROBIN_IMAGE_HOST_KEY").filter(|k| !k.is_empty()),
            token: lookup("ZEROBIN_TOKEN").filter(|t| !t.is_empty()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_env_empty() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.page_size, 20);
        assert!(config.fallback_data);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ZEROBIN_API_URL", "https://api.zerobin.test/"),
            ("ZEROBIN_TIMEOUT_SECS", "5"),
            ("ZEROBIN_PAGE_SIZE", "0"),
            ("ZEROBIN_FALLBACK_DATA", "off"),
            ("ZEROBIN_TOKEN", "abc"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://api.zerobin.test");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        // zero page size is ignored
        assert_eq!(config.page_size, 20);
        assert!(!config.fallback_data);
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
