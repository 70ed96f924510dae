//! Client configuration.
//!
//! [`ClientConfig`] is built once by the application's startup flow and then
//! shared read-only by every request and stream issued through a client.
//! This module never reads environment variables or files; the binary's
//! `cli` module does that and feeds the values into [`ClientConfigBuilder`].

use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ApiError, ApiResult};

/// Default base URL for the CustomGPT REST API.
pub const DEFAULT_BASE_URL: &str = "https://app.customgpt.ai/api/v1";

/// Default timeout for a single non-streaming attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a whole streaming response.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of attempts for a non-streaming request.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default language sent with streaming requests.
pub const DEFAULT_LANG: &str = "en";

/// Number of leading key characters kept when a key is logged.
const MASK_VISIBLE_CHARS: usize = 10;

static API_KEY_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\|[A-Za-z0-9]+$").expect("Invalid API key regex"));

/// Check that an API key has the `digits|alphanumeric` shape issued by the platform.
pub fn is_valid_api_key(key: &str) -> bool {
    API_KEY_FORMAT.is_match(key)
}

/// Mask an API key for logging, keeping only its first few characters.
pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(MASK_VISIBLE_CHARS).collect();
    format!("{}...", visible)
}

/// Immutable configuration owned by one client instance.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout: Duration,
    stream_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    lang: String,
}

impl ClientConfig {
    /// Start building a configuration for the given API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// The bearer token sent with every request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The API key masked for log output.
    pub fn masked_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }

    /// Base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stream_timeout(&self) -> Duration {
        self.stream_timeout
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("stream_timeout", &self.stream_timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("lang", &self.lang)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    stream_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    lang: String,
}

impl ClientConfigBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            lang: DEFAULT_LANG.to_string(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// An API key that does not match the platform's format is only warned
    /// about, since the server is the authority on which keys are valid.
    pub fn build(self) -> ApiResult<ClientConfig> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::invalid_request("API key must not be empty"));
        }
        if !is_valid_api_key(&self.api_key) {
            tracing::warn!(
                api_key = %mask_api_key(&self.api_key),
                "API key does not match the expected `digits|alphanumeric` format"
            );
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::invalid_request(format!(
                "base URL must be http(s): {}",
                base_url
            )));
        }
        if self.retry_attempts == 0 {
            return Err(ApiError::invalid_request("retry attempts must be at least 1"));
        }

        Ok(ClientConfig {
            api_key: self.api_key,
            base_url,
            timeout: self.timeout,
            stream_timeout: self.stream_timeout,
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay,
            lang: self.lang,
        })
    }
}
