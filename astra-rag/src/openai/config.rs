//! Configuration for the OpenAI chat model.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{OPENAI_API_BASE, OPENAI_API_KEY_ENV};
use crate::error::{RagError, Result};

/// Configuration for [`OpenAIChatModel`](super::OpenAIChatModel).
///
/// Build one with [`OpenAIChatConfig::builder`], which validates every field.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAIChatConfig {
    /// API key sent as a bearer token. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Model name, e.g. `gpt-3.5-turbo`.
    pub model: String,
    /// Sampling temperature in `0.0..=2.0`.
    pub temperature: f32,
    /// Upper bound on a single HTTP attempt.
    pub timeout: Duration,
    /// Extra attempts after a retryable failure.
    pub max_retries: u32,
    /// Fixed wait between attempts.
    pub retry_delay: Duration,
    /// Log request bodies at debug level.
    pub log_requests: bool,
    /// Log response bodies at debug level.
    pub log_responses: bool,
    /// API base URL.
    pub base_url: String,
}

impl fmt::Debug for OpenAIChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIChatConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("log_requests", &self.log_requests)
            .field("log_responses", &self.log_responses)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAIChatConfig {
    /// Start a builder with the given API key and default settings.
    pub fn builder(api_key: impl Into<String>) -> OpenAIChatConfigBuilder {
        OpenAIChatConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                model: "gpt-3.5-turbo".to_string(),
                temperature: 0.7,
                timeout: Duration::from_secs(15),
                max_retries: 3,
                retry_delay: Duration::from_secs(1),
                log_requests: false,
                log_responses: false,
                base_url: OPENAI_API_BASE.to_string(),
            },
        }
    }

    /// Start a builder with the key from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<OpenAIChatConfigBuilder> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV).map_err(|_| {
            RagError::ConfigError(format!("{OPENAI_API_KEY_ENV} environment variable not set"))
        })?;
        Ok(Self::builder(api_key))
    }
}

/// Builder for a validated [`OpenAIChatConfig`].
#[derive(Debug, Clone)]
pub struct OpenAIChatConfigBuilder {
    config: OpenAIChatConfig,
}

impl OpenAIChatConfigBuilder {
    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how many times a failed request is retried.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the wait between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Log request bodies.
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.config.log_requests = enabled;
        self
    }

    /// Log response bodies.
    pub fn log_responses(mut self, enabled: bool) -> Self {
        self.config.log_responses = enabled;
        self
    }

    /// Use another OpenAI-compatible server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the [`OpenAIChatConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - the API key or model name is empty
    /// - `temperature` is outside `0.0..=2.0`
    /// - `timeout` is zero
    pub fn build(self) -> Result<OpenAIChatConfig> {
        let config = self.config;
        if config.api_key.trim().is_empty() {
            return Err(RagError::ConfigError("OpenAI API key must not be empty".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(RagError::ConfigError("model name must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                config.temperature
            )));
        }
        if config.timeout.is_zero() {
            return Err(RagError::ConfigError("timeout must be greater than zero".to_string()));
        }
        Ok(config)
    }
}
