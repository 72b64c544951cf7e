//! Extractor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "web")]
use readaloud_guard::GuardConfig;

/// Default timeout for article and social API fetches
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Ceiling on the uncompressed size of a DOCX body member (50 MiB)
pub const DEFAULT_MAX_DOCX_MEMBER_BYTES: u64 = 50 << 20;

/// Default read API for social posts
pub const DEFAULT_SOCIAL_API_BASE: &str = "https://api.fxtwitter.com";

/// Configuration for content extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Upper bound in seconds on one fetch, redirects included
    pub timeout_secs: u64,

    /// Maximum redirects to follow; each hop is re-validated
    pub max_redirects: usize,

    /// User agent for web requests
    pub user_agent: String,

    /// Maximum size of a fetched page or API response
    pub max_body_bytes: u64,

    /// Maximum declared uncompressed size of the DOCX body XML
    pub max_docx_member_bytes: u64,

    /// Uploads up to this size are buffered in memory, larger ones on disk
    pub spool_threshold_bytes: usize,

    /// Maximum size of an uploaded file
    pub max_upload_bytes: u64,

    /// Upper bound on parsing a single document
    pub document_timeout_secs: u64,

    /// Upper bound on reducing one fetched page to its article
    pub reduce_timeout_secs: u64,

    /// Base URL of the social post read API
    pub social_api_base: String,

    /// SSRF guard settings
    #[cfg(feature = "web")]
    pub guard: GuardConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_redirects: 5,
            user_agent: format!(
                "ReadAloud/{} (+https://github.com/read-aloud/read-aloud)",
                env!("CARGO_PKG_VERSION")
            ),
            max_body_bytes: 10 << 20,
            max_docx_member_bytes: DEFAULT_MAX_DOCX_MEMBER_BYTES,
            spool_threshold_bytes: 8 << 20,
            max_upload_bytes: 32 << 20,
            document_timeout_secs: 60,
            reduce_timeout_secs: 15,
            social_api_base: DEFAULT_SOCIAL_API_BASE.to_string(),
            #[cfg(feature = "web")]
            guard: GuardConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Create a new config with custom timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the redirect limit
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Set the response body ceiling
    pub fn with_max_body_bytes(mut self, max: u64) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Set the DOCX body member ceiling
    pub fn with_max_docx_member_bytes(mut self, max: u64) -> Self {
        self.max_docx_member_bytes = max;
        self
    }

    /// Set the upload ceiling
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Point social post lookups at a different API
    pub fn with_social_api_base(mut self, base: impl Into<String>) -> Self {
        self.social_api_base = base.into();
        self
    }

    /// Replace the guard settings
    #[cfg(feature = "web")]
    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// Fetch timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Document parse timeout as a [`Duration`]
    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    /// Article reduction timeout as a [`Duration`]
    pub fn reduce_timeout(&self) -> Duration {
        Duration::from_secs(self.reduce_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_compat_constants() {
        let config = ExtractorConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_docx_member_bytes, 50 * 1024 * 1024);
        assert_eq!(config.social_api_base, "https://api.fxtwitter.com");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExtractorConfig = serde_json::from_str(r#"{"max_redirects": 2}"#).unwrap();
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
    }

    #[test]
    fn test_builders() {
        let config = ExtractorConfig::default()
            .with_timeout(3)
            .with_max_redirects(1)
            .with_max_body_bytes(1024)
            .with_max_docx_member_bytes(2048)
            .with_social_api_base("http://api.test");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.max_redirects, 1);
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.max_docx_member_bytes, 2048);
        assert_eq!(config.social_api_base, "http://api.test");
    }
}
