//! Chat completion API wire format types
//!
//! Covers the two endpoint bodies this client speaks (`/chat/completions`
//! and the legacy `/completions`) plus the buffered and streamed response
//! shapes. Optional request fields serialize only when set; response types
//! default anything a provider may omit, so schema additions never break
//! decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// -- Request types --

/// Chat completion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Per-token logit biases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f64>>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Function declarations exposed to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionSpec>>,
    /// Function choice: `"auto"`, `"none"`, or `{"name": ...}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Value>,
}

/// Legacy text completion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Per-token logit biases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f64>>,
    /// Echo the prompt back alongside the completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,
    /// Text inserted after the completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role (`system`, `user`, `assistant`, `function`)
    pub role: String,
    /// Text content; `None` on assistant messages that carry only a function call
    pub content: Option<String>,
    /// Participant name; required on `function`-role messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function call requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    /// Create a system message
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_owned(),
            content: Some(content.to_owned()),
            name: None,
            function_call: None,
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_owned(),
            content: Some(content.to_owned()),
            name: None,
            function_call: None,
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_owned(),
            content: Some(content.to_owned()),
            name: None,
            function_call: None,
        }
    }

    /// Create an assistant message carrying a function call and no content
    #[must_use]
    pub fn assistant_function_call(function_call: FunctionCall) -> Self {
        Self {
            role: "assistant".to_owned(),
            content: None,
            name: None,
            function_call: Some(function_call),
        }
    }

    /// Create a function-result message
    #[must_use]
    pub fn function(name: &str, content: &str) -> Self {
        Self {
            role: "function".to_owned(),
            content: Some(content.to_owned()),
            name: Some(name.to_owned()),
            function_call: None,
        }
    }
}

/// Function declaration sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Function name, unique within a call
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the arguments object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Function call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

// -- Response types --

/// Buffered chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response identifier
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Generated choices
    pub choices: Vec<ChatChoice>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Choice within a chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: Message,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Buffered legacy completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Response identifier
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Generated choices
    pub choices: Vec<TextChoice>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Choice within a legacy completion response or chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChoice {
    /// Completion text fragment
    #[serde(default)]
    pub text: String,
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens
    #[serde(default)]
    pub total_tokens: u32,
}

// -- Streaming types --

/// Incremental chunk of a streamed chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaChunk {
    /// Chunk identifier
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<DeltaChoice>,
}

/// Choice within a streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental delta
    #[serde(default)]
    pub delta: Delta,
    /// Finish reason (`None` until the terminal chunk)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content within a streamed choice
///
/// `content` defaults to the empty string when the wire payload omits it;
/// consumers can always append it without a null check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    /// Newly produced text, `""` when absent
    #[serde(default)]
    pub content: String,
    /// Role (present on the first chunk only)
    #[serde(default)]
    pub role: Option<String>,
    /// Partial function call data
    #[serde(default)]
    pub function_call: Option<serde_json::Value>,
}

/// Incremental chunk of a streamed legacy completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Chunk identifier
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Text choices
    #[serde(default)]
    pub choices: Vec<TextChoice>,
}
