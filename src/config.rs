//! Client configuration

use crate::error::{ContentError, Result};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "https://api.example.com")
    pub base_url: String,
    /// Optional bearer token for authenticated access
    pub api_token: Option<String>,
    /// Optional session cookie (`name=value`) sent with every request
    pub session_cookie: Option<String>,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_token: None,
            session_cookie: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at the given backend with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Base URL without trailing slashes
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = self.base();
        if base.is_empty() {
            return Err(ContentError::Config("base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ContentError::Config(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ContentError::Config("timeout_secs must be greater than 0".into()));
        }
        if let Some(cookie) = &self.session_cookie {
            if !cookie.contains('=') {
                return Err(ContentError::Config("session_cookie must be name=value".into()));
            }
        }
        Ok(())
    }
}
