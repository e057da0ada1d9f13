//! OpenAI chat completions client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::config::OpenAIChatConfig;
use super::error_detail;
use crate::chat::{ChatMessage, ChatModel, ChatResponse, Role, TokenUsage};
use crate::error::{RagError, Result};

const PROVIDER: &str = "OpenAI";

/// A [`ChatModel`] backed by the OpenAI chat completions API.
///
/// Each attempt is bounded by the configured timeout. Transport failures,
/// HTTP 429 and HTTP 5xx are retried up to `max_retries` times after a fixed
/// delay; authentication and other client errors fail immediately.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    config: OpenAIChatConfig,
}

impl OpenAIChatModel {
    /// Create a client from a validated configuration.
    pub fn new(config: OpenAIChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &OpenAIChatConfig {
        &self.config
    }

    async fn attempt(
        &self,
        request: &CompletionRequest<'_>,
    ) -> std::result::Result<ChatResponse, Failure> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Failure::Retryable(chat_error(format!("request failed: {e}"))))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Failure::Retryable(chat_error(format!("failed to read response: {e}"))))?;
        if self.config.log_responses {
            debug!(provider = PROVIDER, %status, body = %body, "chat response");
        }

        if !status.is_success() {
            let detail = error_detail(body);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Failure::Fatal(
                    RagError::Authentication { service: PROVIDER.into(), message: detail },
                ),
                StatusCode::TOO_MANY_REQUESTS => {
                    Failure::Retryable(chat_error(format!("API returned {status}: {detail}")))
                }
                s if s.is_server_error() => {
                    Failure::Retryable(chat_error(format!("API returned {status}: {detail}")))
                }
                _ => Failure::Fatal(chat_error(format!("API returned {status}: {detail}"))),
            });
        }

        let completion: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Failure::Fatal(chat_error(format!("failed to parse response: {e}"))))?;
        into_chat_response(completion).map_err(Failure::Fatal)
    }
}

fn chat_error(message: String) -> RagError {
    RagError::ChatError { provider: PROVIDER.into(), message }
}

fn into_chat_response(completion: CompletionResponse) -> Result<ChatResponse> {
    let choice = completion.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let text = choice.and_then(|c| c.message.content).unwrap_or_default();
    if text.trim().is_empty() {
        return Err(RagError::EmptyAnswer { provider: PROVIDER.into() });
    }

    Ok(ChatResponse {
        text,
        finish_reason,
        usage: completion.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

/// Outcome of one failed attempt.
enum Failure {
    Retryable(RagError),
    Fatal(RagError),
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage { role: m.role, content: &m.content })
                .collect(),
            temperature: self.config.temperature,
        };
        if self.config.log_requests {
            let body = serde_json::to_string(&request).unwrap_or_default();
            debug!(provider = PROVIDER, body = %body, "chat request");
        }

        let mut retries = 0;
        loop {
            match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err(Failure::Retryable(e)) if retries < self.config.max_retries => {
                    retries += 1;
                    warn!(
                        provider = PROVIDER,
                        retry = retries,
                        error = %e,
                        "retrying chat request"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(Failure::Retryable(e) | Failure::Fatal(e)) => {
                    error!(provider = PROVIDER, retries, error = %e, "chat request failed");
                    return Err(e);
                }
            }
        }
    }
}
