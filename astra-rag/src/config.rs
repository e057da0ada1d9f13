//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum segment size in tokens.
    pub max_segment_size: usize,
    /// Number of tokens shared by consecutive segments.
    pub segment_overlap: usize,
    /// Maximum number of segments retrieved for a question.
    pub max_results: usize,
    /// Minimum relevance score for retrieved segments.
    pub min_score: f32,
    /// Separator placed between retrieved segments in the prompt context.
    pub context_separator: String,
    /// Format tag attached to ingested segments.
    pub document_format: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_segment_size: 100,
            segment_overlap: 10,
            max_results: 5,
            min_score: 0.3,
            context_separator: ",".to_string(),
            document_format: "text".to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum segment size in tokens.
    pub fn max_segment_size(mut self, size: usize) -> Self {
        self.config.max_segment_size = size;
        self
    }

    /// Set the overlap between consecutive segments in tokens.
    pub fn segment_overlap(mut self, overlap: usize) -> Self {
        self.config.segment_overlap = overlap;
        self
    }

    /// Set the maximum number of retrieved segments.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    /// Set the minimum relevance score for retrieved segments.
    pub fn min_score(mut self, min_score: f32) -> Self {
        self.config.min_score = min_score;
        self
    }

    /// Set the separator between retrieved segments in the prompt context.
    pub fn context_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.context_separator = separator.into();
        self
    }

    /// Set the format tag attached to ingested segments.
    pub fn document_format(mut self, format: impl Into<String>) -> Self {
        self.config.document_format = format.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `max_segment_size == 0`
    /// - `segment_overlap >= max_segment_size`
    /// - `max_results == 0`
    /// - `min_score` is NaN
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.max_segment_size == 0 {
            return Err(RagError::ConfigError(
                "max_segment_size must be greater than zero".to_string(),
            ));
        }
        if config.segment_overlap >= config.max_segment_size {
            return Err(RagError::ConfigError(format!(
                "segment_overlap ({}) must be less than max_segment_size ({})",
                config.segment_overlap, config.max_segment_size
            )));
        }
        if config.max_results == 0 {
            return Err(RagError::ConfigError("max_results must be greater than zero".to_string()));
        }
        if config.min_score.is_nan() {
            return Err(RagError::ConfigError("min_score must be a number".to_string()));
        }
        Ok(config)
    }
}
