//! Client entry points
//!
//! The buffered request executor lives here: one POST per call, 2xx decodes
//! the typed body, anything else becomes a typed failure. The streaming
//! methods hand the response body to [`ChunkStream`]; the buffered chat path
//! runs through the function-call orchestrator when functions are declared.

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::functions::{ChatExecutor, orchestrate};
use crate::options::RequestOptions;
use crate::protocol::{
    ChatRequest, ChatResponse, CompletionChunk, CompletionResponse, DeltaChunk, FunctionSpec,
    Message,
};
use crate::stream::ChunkStream;

/// Name of the synthetic function used by `generate_structured`
const STRUCTURED_FUNCTION_NAME: &str = "format_response";

/// Prompt accepted by the chat entry points: a bare user turn or a full
/// conversation
#[derive(Debug, Clone)]
pub enum ChatPrompt {
    /// Single user message
    Text(String),
    /// Caller-assembled conversation
    Messages(Vec<Message>),
}

impl ChatPrompt {
    fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Text(text) => vec![Message::user(&text)],
            Self::Messages(messages) => messages,
        }
    }
}

impl From<&str> for ChatPrompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ChatPrompt {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Message>> for ChatPrompt {
    fn from(messages: Vec<Message>) -> Self {
        Self::Messages(messages)
    }
}

/// Client for one OpenAI-style API endpoint
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
}

impl Client {
    /// Create a client from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { config, http })
    }

    /// Create a client with the key from `OPENAI_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when the variable is unset; no request
    /// is attempted without a credential.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    // -- Buffered calls --

    /// Send a chat request and run any declared functions to completion
    ///
    /// With no functions declared this is a single round trip. Otherwise the
    /// orchestrator answers the model's `function_call` requests from the
    /// declared callbacks until the model finishes another way (or the
    /// configured round cap is hit, in which case the pending call is
    /// returned for the caller to handle).
    ///
    /// # Errors
    ///
    /// Returns transport, API-status, argument, and callback errors as the
    /// corresponding `ClientError` variants.
    pub async fn chat(
        &self,
        prompt: impl Into<ChatPrompt>,
        options: &RequestOptions,
    ) -> Result<ChatResponse> {
        let request = options.chat_request(prompt.into().into_messages(), false);
        orchestrate(self, request, &options.functions, options.max_function_rounds).await
    }

    /// Send a legacy text completion request
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn completion(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<CompletionResponse> {
        let request = options.completion_request(prompt, false);
        self.post_json("/completions", &request).await
    }

    /// Send a chat request and extract the first choice's text
    ///
    /// Returns the empty string when the first choice carries no content
    /// (e.g. a pending function call).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Parse` when the response carries no choices.
    pub async fn generate_text(
        &self,
        prompt: impl Into<ChatPrompt>,
        options: &RequestOptions,
    ) -> Result<String> {
        let response = self.chat(prompt, options).await?;
        first_content(response)
    }

    /// Ask the model for output conforming to a JSON schema
    ///
    /// Declares a single synthetic function whose parameters are `schema`,
    /// forces the model to call it, and parses the returned arguments. No
    /// orchestration happens; the function exists only as a formatting
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Parse` when the model does not produce a
    /// decodable function call.
    pub async fn generate_structured(
        &self,
        prompt: impl Into<ChatPrompt>,
        schema: serde_json::Value,
        options: &RequestOptions,
    ) -> Result<serde_json::Value> {
        let mut request = options.chat_request(prompt.into().into_messages(), false);
        request.functions = Some(vec![FunctionSpec {
            name: STRUCTURED_FUNCTION_NAME.to_owned(),
            description: Some("Format the response according to the schema".to_owned()),
            parameters: Some(schema),
        }]);
        request.function_call = Some(serde_json::json!({"name": STRUCTURED_FUNCTION_NAME}));

        let response = self.execute_chat(&request).await?;
        structured_arguments(&response)
    }

    // -- Streaming calls --

    /// Open a streaming chat request
    ///
    /// The returned sequence is lazy and single-consumer; dropping it before
    /// the end releases the connection.
    ///
    /// # Errors
    ///
    /// A non-2xx initial status or a connect failure is returned here;
    /// errors after the stream opens arrive as its final item.
    pub async fn chat_stream(
        &self,
        prompt: impl Into<ChatPrompt>,
        options: &RequestOptions,
    ) -> Result<ChunkStream<DeltaChunk>> {
        let request = options.chat_request(prompt.into().into_messages(), true);
        self.open_stream("/chat/completions", &request).await
    }

    /// Open a streaming legacy completion request
    ///
    /// # Errors
    ///
    /// Same contract as [`Client::chat_stream`].
    pub async fn completion_stream(
        &self,
        prompt: &str,
        options: &RequestOptions,
    ) -> Result<ChunkStream<CompletionChunk>> {
        let request = options.completion_request(prompt, true);
        self.open_stream("/completions", &request).await
    }

    // -- Transport helpers --

    /// Build the URL for an endpoint path
    fn endpoint_url(&self, path: &str) -> String {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    /// Issue one buffered POST: the whole buffered request executor
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint_url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path, error = %e, "request failed");
                ClientError::Transport(e)
            })?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(format!("failed to decode response body: {e}")))
    }

    /// Issue one streaming POST and wrap the body in a `ChunkStream`
    async fn open_stream<B, T>(&self, path: &str, body: &B) -> Result<ChunkStream<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send + 'static,
    {
        let response = self
            .http
            .post(self.endpoint_url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path, error = %e, "stream request failed");
                ClientError::Transport(e)
            })?;

        let response = check_status(response).await?;
        let bytes = response
            .bytes_stream()
            .map(|result| result.map_err(ClientError::Transport))
            .boxed();

        Ok(ChunkStream::new(bytes, self.config.chunk_timeout))
    }
}

#[async_trait]
impl ChatExecutor for Client {
    async fn execute_chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.post_json("/chat/completions", request).await
    }
}

/// Turn a non-2xx response into `ClientError::Api`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, "provider returned an error");
    Err(api_error(status.as_u16(), &text))
}

/// Build an `Api` error, keeping the body as JSON when it parses
fn api_error(status: u16, text: &str) -> ClientError {
    let body = serde_json::from_str(text)
        .unwrap_or_else(|_| serde_json::Value::String(text.to_owned()));
    ClientError::Api { status, body }
}

/// Extract the first choice's content from a buffered chat response
fn first_content(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Parse("response contained no choices".to_owned()))?;
    Ok(choice.message.content.unwrap_or_default())
}

/// Extract and parse the forced function call of a structured response
fn structured_arguments(response: &ChatResponse) -> Result<serde_json::Value> {
    let call = response
        .choices
        .first()
        .and_then(|choice| choice.message.function_call.as_ref())
        .ok_or_else(|| {
            ClientError::Parse("structured response carried no function call".to_owned())
        })?;

    serde_json::from_str(&call.arguments)
        .map_err(|e| ClientError::Parse(format!("structured arguments are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChatChoice, FunctionCall};

    fn response_with_content(content: Option<&str>) -> ChatResponse {
        ChatResponse {
            id: "chatcmpl-test".to_owned(),
            model: "gpt-3.5-turbo".to_owned(),
            created: 0,
            choices: vec![ChatChoice {
                index: 0,
                message: Message {
                    role: "assistant".to_owned(),
                    content: content.map(ToOwned::to_owned),
                    name: None,
                    function_call: None,
                },
                finish_reason: Some("stop".to_owned()),
            }],
            usage: None,
        }
    }

    #[test]
    fn text_prompt_becomes_a_user_message() {
        let messages = ChatPrompt::from("2+2?").into_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content.as_deref(), Some("2+2?"));
    }

    #[test]
    fn message_prompt_passes_through_unchanged() {
        let conversation = vec![Message::system("be brief"), Message::user("2+2?")];
        let messages = ChatPrompt::from(conversation.clone()).into_messages();
        assert_eq!(messages.len(), conversation.len());
        assert_eq!(messages[0].role, "system");
    }

    #[test]
    fn base_url_joins_without_double_slashes() {
        let config = ClientConfig::new("sk-test");
        let client = Client::new(config).unwrap();
        assert_eq!(
            client.endpoint_url("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn first_content_extracts_the_answer() {
        let text = first_content(response_with_content(Some("4"))).unwrap();
        assert_eq!(text, "4");
    }

    #[test]
    fn first_content_defaults_missing_content_to_empty() {
        let text = first_content(response_with_content(None)).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn first_content_without_choices_is_a_parse_error() {
        let response = ChatResponse {
            id: String::new(),
            model: String::new(),
            created: 0,
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            first_content(response),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn json_error_bodies_are_kept_structured() {
        let err = api_error(429, r#"{"error":{"message":"slow down","type":"rate_limit"}}"#);
        let ClientError::Api { status, body } = err else {
            panic!("expected Api error");
        };
        assert_eq!(status, 429);
        assert_eq!(body["error"]["type"], "rate_limit");
    }

    #[test]
    fn non_json_error_bodies_are_kept_raw() {
        let err = api_error(502, "Bad Gateway");
        let ClientError::Api { status, body } = err else {
            panic!("expected Api error");
        };
        assert_eq!(status, 502);
        assert_eq!(body, serde_json::Value::String("Bad Gateway".to_owned()));
    }

    #[test]
    fn structured_arguments_parse_the_forced_call() {
        let mut response = response_with_content(None);
        response.choices[0].message.function_call = Some(FunctionCall {
            name: STRUCTURED_FUNCTION_NAME.to_owned(),
            arguments: r#"{"answer": 4}"#.to_owned(),
        });

        let value = structured_arguments(&response).unwrap();
        assert_eq!(value["answer"], 4);
    }

    #[test]
    fn structured_response_without_call_is_a_parse_error() {
        let response = response_with_content(Some("just text"));
        assert!(matches!(
            structured_arguments(&response),
            Err(ClientError::Parse(_))
        ));
    }
}
