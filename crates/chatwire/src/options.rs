//! Per-request options
//!
//! One explicit structure with named optional fields replaces the ad-hoc
//! options maps of dynamically typed clients: a tunable left as `None` is
//! omitted from the serialized body entirely. Fields that only the legacy
//! completions endpoint understands (`echo`, `suffix`) are ignored by the
//! chat path.

use std::collections::HashMap;

use crate::functions::CallableFunction;
use crate::protocol::{ChatRequest, CompletionRequest, FunctionSpec, Message};

/// Model used when the caller does not pick one
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Tunables and function declarations for a single call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
    /// Frequency penalty
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    pub presence_penalty: Option<f64>,
    /// Per-token logit biases
    pub logit_bias: Option<HashMap<String, f64>>,
    /// Echo the prompt back (completions endpoint only)
    pub echo: Option<bool>,
    /// Text inserted after the completion (completions endpoint only)
    pub suffix: Option<String>,
    /// Functions the model may call, with their callbacks
    pub functions: Vec<CallableFunction>,
    /// Function choice: `"auto"`, `"none"`, or `{"name": ...}`
    pub function_call: Option<serde_json::Value>,
    /// Cap on orchestrated function round trips; `None` leaves termination
    /// to the model
    pub max_function_rounds: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl RequestOptions {
    /// Options for `model` with every tunable unset
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
            frequency_penalty: None,
            presence_penalty: None,
            logit_bias: None,
            echo: None,
            suffix: None,
            functions: Vec::new(),
            function_call: None,
            max_function_rounds: None,
        }
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling threshold
    #[must_use]
    pub const fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the generation token limit
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set stop sequences
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Set the frequency penalty
    #[must_use]
    pub const fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Set the presence penalty
    #[must_use]
    pub const fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set per-token logit biases
    #[must_use]
    pub fn with_logit_bias(mut self, logit_bias: HashMap<String, f64>) -> Self {
        self.logit_bias = Some(logit_bias);
        self
    }

    /// Echo the prompt back (completions endpoint only)
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Insert text after the completion (completions endpoint only)
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Declare a callable function
    ///
    /// Declaring two functions with the same name keeps the later one.
    #[must_use]
    pub fn with_function(mut self, function: CallableFunction) -> Self {
        self.functions.push(function);
        self
    }

    /// Force or forbid function selection (`"auto"`, `"none"`, `{"name": ...}`)
    #[must_use]
    pub fn with_function_call(mut self, function_call: serde_json::Value) -> Self {
        self.function_call = Some(function_call);
        self
    }

    /// Cap the number of orchestrated function round trips
    #[must_use]
    pub const fn with_max_function_rounds(mut self, rounds: u32) -> Self {
        self.max_function_rounds = Some(rounds);
        self
    }

    /// Build the chat endpoint body
    pub(crate) fn chat_request(&self, messages: Vec<Message>, stream: bool) -> ChatRequest {
        let functions: Vec<FunctionSpec> =
            self.functions.iter().map(|f| f.spec.clone()).collect();

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            logit_bias: self.logit_bias.clone(),
            stream: stream.then_some(true),
            functions: (!functions.is_empty()).then_some(functions),
            function_call: self.function_call.clone(),
        }
    }

    /// Build the legacy completions endpoint body
    pub(crate) fn completion_request(&self, prompt: &str, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.to_owned(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            logit_bias: self.logit_bias.clone(),
            echo: self.echo,
            suffix: self.suffix.clone(),
            stream: stream.then_some(true),
        }
    }
}
