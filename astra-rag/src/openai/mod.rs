//! OpenAI integrations: embeddings and chat completions over the REST API.
//!
//! This module is only available when the `openai` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use astra_rag::openai::{OpenAIChatConfig, OpenAIChatModel, OpenAIEmbeddingProvider};
//!
//! let embedder = OpenAIEmbeddingProvider::from_env()?;
//! let chat = OpenAIChatModel::new(
//!     OpenAIChatConfig::builder(std::env::var("OPENAI_API_KEY")?)
//!         .model("gpt-3.5-turbo")
//!         .temperature(0.7)
//!         .timeout(Duration::from_secs(15))
//!         .max_retries(3)
//!         .log_requests(true)
//!         .log_responses(true)
//!         .build()?,
//! )?;
//! ```

mod chat;
mod config;
mod embedding;

use serde::Deserialize;

pub use chat::OpenAIChatModel;
pub use config::{OpenAIChatConfig, OpenAIChatConfigBuilder};
pub use embedding::OpenAIEmbeddingProvider;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract the `error.message` of an OpenAI error body, falling back to the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}
