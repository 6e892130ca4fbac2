/// Client-specific result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from the chatwire client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid or missing configuration (e.g. no API key)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// HTTP transport failure (DNS, connect, reset, request timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider returned a non-2xx status
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body, parsed as JSON when possible, raw string otherwise
        body: serde_json::Value,
    },

    /// Failed to decode a response body
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Stream ended in an error state (timeout or mid-stream transport failure)
    #[error("stream error: {0}")]
    Stream(String),

    /// The model supplied arguments that are not valid JSON for a registered function
    #[error("invalid arguments for function {name}: {source}")]
    FunctionArguments {
        /// Name of the function the model tried to call
        name: String,
        /// Underlying JSON decode error
        source: serde_json::Error,
    },

    /// A registered function callback failed
    #[error("function {name} failed: {source}")]
    Callback {
        /// Name of the failed function
        name: String,
        /// Error returned by the callback
        source: anyhow::Error,
    },
}
