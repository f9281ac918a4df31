use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Failure of a single call to the LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM call timed out")]
    Timeout,

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed LLM response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

/// One prompt for the provider: a system preamble plus the user turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a prompt and return the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Runs a completion with a hard upper bound on the wait.
pub async fn complete_within(
    gateway: &dyn LlmGateway,
    request: &CompletionRequest,
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, gateway.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct LlmAgent {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl LlmAgent {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmGateway for LlmAgent {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        debug!(
            model = %self.model,
            prompt_length = request.prompt.len(),
            "Sending completion request"
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), "LLM provider rejected request");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::Malformed("No text in response".to_string()))
    }
}
