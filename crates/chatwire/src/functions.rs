//! Function-calling orchestration
//!
//! When a buffered chat response finishes with `function_call`, the
//! orchestrator looks the name up in the per-call registry, runs the
//! caller-supplied handler, appends the exchange to a copy of the
//! conversation, and re-issues the request. The loop is explicit (no
//! recursion) and strictly sequential; round *n+1* is not issued until
//! round *n*'s callback has resolved.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::protocol::{ChatRequest, ChatResponse, FunctionSpec, Message};

/// `finish_reason` value signalling a pending function call
const FINISH_FUNCTION_CALL: &str = "function_call";

/// Caller-supplied callback mapping parsed JSON arguments to a result value
pub type FunctionHandler =
    Arc<dyn Fn(serde_json::Value) -> anyhow::Result<serde_json::Value> + Send + Sync>;

/// A function declaration paired with the callback that implements it
///
/// Only the spec is sent over the wire; the handler stays in-process.
#[derive(Clone)]
pub struct CallableFunction {
    /// Declaration exposed to the model
    pub spec: FunctionSpec,
    handler: FunctionHandler,
}

impl CallableFunction {
    /// Declare a function backed by `handler`
    ///
    /// `parameters` is the JSON Schema describing the arguments object.
    pub fn new<F>(
        name: &str,
        description: &str,
        parameters: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
    {
        Self {
            spec: FunctionSpec {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                parameters: Some(parameters),
            },
            handler: Arc::new(handler),
        }
    }

    /// Run the callback with already-parsed arguments
    ///
    /// Runs synchronously with no isolation or timeout; a slow or failing
    /// handler blocks or aborts the whole call.
    pub(crate) fn invoke(&self, arguments: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        (self.handler)(arguments)
    }
}

impl fmt::Debug for CallableFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableFunction")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Name-to-callback lookup built once per top-level call
///
/// Duplicate names are allowed; the last declaration wins.
pub(crate) struct FunctionRegistry {
    handlers: HashMap<String, CallableFunction>,
}

impl FunctionRegistry {
    pub(crate) fn new(functions: &[CallableFunction]) -> Self {
        let mut handlers = HashMap::new();
        for function in functions {
            handlers.insert(function.spec.name.clone(), function.clone());
        }
        Self { handlers }
    }

    fn get(&self, name: &str) -> Option<&CallableFunction> {
        self.handlers.get(name)
    }
}

/// Seam between the orchestrator and the buffered request executor
#[async_trait]
pub(crate) trait ChatExecutor: Send + Sync {
    async fn execute_chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Drive a buffered chat call through its function-call rounds
///
/// Returns the first response whose `finish_reason` is not `function_call`,
/// or the response verbatim when the requested function is unregistered or
/// the round cap is reached, so callers can handle the pending call
/// themselves. With `max_rounds: None` termination relies on the model
/// eventually choosing another finish reason.
pub(crate) async fn orchestrate(
    executor: &dyn ChatExecutor,
    mut request: ChatRequest,
    functions: &[CallableFunction],
    max_rounds: Option<u32>,
) -> Result<ChatResponse> {
    if functions.is_empty() {
        return executor.execute_chat(&request).await;
    }

    let registry = FunctionRegistry::new(functions);
    let mut rounds: u32 = 0;

    loop {
        let response = executor.execute_chat(&request).await?;

        let Some(choice) = response.choices.first() else {
            return Ok(response);
        };
        if choice.finish_reason.as_deref() != Some(FINISH_FUNCTION_CALL) {
            return Ok(response);
        }
        let Some(call) = choice.message.function_call.clone() else {
            return Ok(response);
        };
        let Some(function) = registry.get(&call.name) else {
            tracing::debug!(function = %call.name, "model requested an unregistered function");
            return Ok(response);
        };
        if let Some(cap) = max_rounds
            && rounds >= cap
        {
            tracing::warn!(rounds, "function round limit reached, returning pending call");
            return Ok(response);
        }
        rounds += 1;

        let arguments: serde_json::Value =
            serde_json::from_str(&call.arguments).map_err(|source| {
                ClientError::FunctionArguments {
                    name: call.name.clone(),
                    source,
                }
            })?;

        tracing::debug!(function = %call.name, round = rounds, "executing model-requested function");
        let result = function
            .invoke(arguments)
            .map_err(|source| ClientError::Callback {
                name: call.name.clone(),
                source,
            })?;
        let serialized = serde_json::to_string(&result)
            .map_err(|e| ClientError::Parse(format!("unserializable function result: {e}")))?;

        request
            .messages
            .push(Message::assistant_function_call(call.clone()));
        request
            .messages
            .push(Message::function(&call.name, &serialized));
    }
}
