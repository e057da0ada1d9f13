//! Chat model trait and message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// Input from the user.
    User,
    /// Output of the model.
    Assistant,
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub input_tokens: u32,
    /// Tokens in the answer.
    pub output_tokens: u32,
}

/// A generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The answer text. Never empty.
    pub text: String,
    /// Why generation stopped, as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Token usage, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// A language model that answers a conversation.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::{ChatMessage, ChatModel};
///
/// let response = model.generate(&[ChatMessage::user("Who is Johnny?")]).await?;
/// println!("{}", response.text);
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model name, for logging.
    fn name(&self) -> &str;

    /// Generate an answer to `messages`.
    ///
    /// Implementations return [`RagError::EmptyAnswer`](crate::RagError::EmptyAnswer)
    /// rather than an empty [`ChatResponse`].
    async fn generate(&self, messages: &[ChatMessage]) -> Result<ChatResponse>;
}
