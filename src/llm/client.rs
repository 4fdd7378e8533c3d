//! OpenAI-compatible LLM client.
//!
//! This client works with any OpenAI-compatible chat-completions endpoint.

use super::generator::{Generation, Generator};
use crate::config::LlmConfig;
use crate::conversation::{Conversation, ConversationTurn, Role};
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A message in the request body.
#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: Role,
    content: &'a str,
}

impl<'a> From<&'a ConversationTurn> for Message<'a> {
    fn from(turn: &'a ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: &turn.content,
        }
    }
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response from an LLM call including metadata.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Reason the model stopped generating.
    pub finish_reason: Option<String>,
    /// Token usage (if available).
    pub usage: Option<TokenUsage>,
}

/// Token counts reported by the provider. Missing counters read as zero,
/// except the total, which stays unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: Option<u64>,
}

/// OpenAI-compatible LLM client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Model name requests are sent to.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the API endpoint URL.
    fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{}/v1/chat/completions", base)
    }

    /// Send a chat completion request.
    pub async fn chat(&self, conversation: &Conversation) -> Result<LlmResponse> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: conversation.iter().map(Message::from).collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        debug!(
            model = %self.config.model,
            turns = conversation.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(EvalError::LlmApi(format!(
                    "API error ({}): {}",
                    status, api_error.error.message
                )));
            }
            return Err(EvalError::LlmApi(format!(
                "Request failed ({}): {}",
                status, body
            )));
        }

        let response = Self::parse_completion(&body)?;

        debug!(
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            prompt_tokens = response.usage.map(|u| u.prompt_tokens),
            completion_tokens = response.usage.map(|u| u.completion_tokens),
            total_tokens = response.usage.and_then(|u| u.total_tokens),
            "received chat completion"
        );

        Ok(response)
    }

    fn parse_completion(body: &str) -> Result<LlmResponse> {
        let completion: ChatCompletionResponse = serde_json::from_str(body)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EvalError::LlmApi("No choices in response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage: completion.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    /// Test connectivity to the API, returning the reply on success.
    pub async fn test_connection(&self) -> Result<LlmResponse> {
        let conversation = vec![ConversationTurn::user("Say 'hello' and nothing else.")];

        let response = self.chat(&conversation).await?;

        if response.content.to_lowercase().contains("hello") {
            Ok(response)
        } else {
            Err(EvalError::LlmApi(format!(
                "Unexpected response: {}",
                response.content
            )))
        }
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, conversation: &Conversation) -> Result<Generation> {
        let response = self
            .chat(conversation)
            .await
            .map_err(|e| EvalError::Generation(e.to_string()))?;

        Ok(Generation {
            text: response.content,
            token_count: response.usage.and_then(|u| u.total_tokens),
        })
    }
}
