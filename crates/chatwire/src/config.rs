use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ClientError, Result};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default per-event receive timeout for streaming responses
const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration, resolved once at construction
///
/// The API key is threaded explicitly into the client rather than looked up
/// from the environment per call; `from_env` is the only place that reads
/// process state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the provider API
    pub base_url: Url,
    /// Bearer credential sent on every request
    pub api_key: SecretString,
    /// Overall timeout for buffered requests (`None` = reqwest default)
    pub request_timeout: Option<Duration>,
    /// Maximum wait between inbound events on a streaming response
    pub chunk_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the default base URL
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid default URL"),
            api_key: SecretString::from(api_key.into()),
            request_timeout: None,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
        }
    }

    /// Resolve the API key from `OPENAI_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the variable is unset or empty. This
    /// is checked before any request is attempted.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(Self::new(key)),
            _ => Err(ClientError::Config(format!("{API_KEY_ENV} is not set"))),
        }
    }

    /// Override the base URL
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the URL does not parse.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL: {e}")))?;
        Ok(self)
    }

    /// Set an overall timeout for buffered requests
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the per-event receive timeout for streaming responses
    #[must_use]
    pub const fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }
}
