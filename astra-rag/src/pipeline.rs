//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-answer workflow by
//! composing an [`EmbeddingProvider`], a [`VectorStore`], a
//! [`DocumentSplitter`], a [`PromptTemplate`] and an optional [`ChatModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use astra_rag::{Filter, InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chat_model(Arc::new(my_chat_model))
//!     .build()?;
//!
//! pipeline.ingest(&document, "doc-1").await?;
//! let answer = pipeline.answer("Who is Johnny?", Some(Filter::eq("document_id", "doc-1"))).await?;
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chat::{ChatModel, TokenUsage};
use crate::config::RagConfig;
use crate::document::{DOCUMENT_ID_KEY, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::filter::Filter;
use crate::ingest::{EmbeddingStoreIngestor, IngestionReport, document_tagger};
use crate::loader::{DocumentParser, FileSystemDocumentLoader};
use crate::prompt::{Prompt, PromptTemplate};
use crate::retrieval::{EmbeddingStoreRetriever, RetrievalOptions, join_texts};
use crate::splitter::{DocumentSplitter, TokenWindowSplitter};
use crate::vectorstore::VectorStore;

/// Template variable receiving the question.
pub const QUESTION_VARIABLE: &str = "question";

/// Template variable receiving the retrieved context.
pub const INFORMATION_VARIABLE: &str = "information";

/// The outcome of [`RagPipeline::answer`].
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// The model's answer.
    pub answer: String,
    /// The prompt that was sent.
    pub prompt: Prompt,
    /// The segments the prompt was built from, most relevant first.
    pub sources: Vec<SearchResult>,
    /// Token usage reported by the chat model.
    pub usage: Option<TokenUsage>,
}

/// The RAG pipeline orchestrator.
///
/// Coordinates document ingestion (split → tag → embed → store) and question
/// answering (embed → search → filter → prompt → chat). Every step runs one
/// after another; failures are logged and returned unchanged. Construct one
/// via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    splitter: Arc<dyn DocumentSplitter>,
    chat_model: Option<Arc<dyn ChatModel>>,
    prompt_template: PromptTemplate,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    fn ingestor(&self, document_id: &str) -> EmbeddingStoreIngestor {
        EmbeddingStoreIngestor {
            splitter: Arc::clone(&self.splitter),
            embedding_provider: Arc::clone(&self.embedding_provider),
            vector_store: Arc::clone(&self.vector_store),
            transformer: Some(document_tagger(document_id, self.config.document_format.clone())),
        }
    }

    fn retriever(&self) -> EmbeddingStoreRetriever {
        EmbeddingStoreRetriever::new(
            Arc::clone(&self.embedding_provider),
            Arc::clone(&self.vector_store),
        )
    }

    /// Ingest a document under `document_id`.
    ///
    /// Every stored segment carries `document_id` and the configured
    /// `document_format` in its metadata. Ingestion is not atomic: on failure,
    /// segments already written are left in the store.
    pub async fn ingest(&self, document: &Document, document_id: &str) -> Result<IngestionReport> {
        self.ingestor(document_id).ingest(document).await
    }

    /// Load a file with `parser` and ingest it under `document_id`.
    pub async fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        parser: &dyn DocumentParser,
        document_id: &str,
    ) -> Result<IngestionReport> {
        let path = path.as_ref();
        let document = FileSystemDocumentLoader::load_document(path, parser).await.inspect_err(
            |e| error!(path = %path.display(), error = %e, "failed to load document"),
        )?;
        let report = self.ingest(&document, document_id).await?;
        info!(
            path = %path.display(),
            document.id = document_id,
            segment_count = report.segment_count(),
            "ingested file"
        );
        Ok(report)
    }

    /// Retrieve the segments most relevant to `query`.
    ///
    /// Uses the configured `max_results` and `min_score`.
    pub async fn retrieve(&self, query: &str, filter: Option<Filter>) -> Result<Vec<SearchResult>> {
        let options = RetrievalOptions {
            filter,
            max_results: self.config.max_results,
            min_score: self.config.min_score,
        };
        self.retriever().retrieve_with(query, &options).await
    }

    /// Render the prompt for `question` from the retrieved `sources`.
    pub fn compose_prompt(&self, question: &str, sources: &[SearchResult]) -> Result<Prompt> {
        let variables = HashMap::from([
            (QUESTION_VARIABLE.to_string(), question.to_string()),
            (
                INFORMATION_VARIABLE.to_string(),
                join_texts(sources, &self.config.context_separator),
            ),
        ]);
        self.prompt_template.apply(&variables)
    }

    /// Answer `question` from the segments matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no chat model was configured and
    /// propagates retrieval, templating and chat failures unchanged.
    pub async fn answer(&self, question: &str, filter: Option<Filter>) -> Result<RagAnswer> {
        let chat_model = self
            .chat_model
            .as_ref()
            .ok_or_else(|| RagError::ConfigError("chat_model is required to answer".to_string()))?;

        let sources = self.retrieve(question, filter).await?;
        let prompt = self.compose_prompt(question, &sources)?;

        let response =
            chat_model.generate(&[prompt.to_user_message()]).await.inspect_err(|e| {
                error!(model = chat_model.name(), error = %e, "chat generation failed");
            })?;

        info!(model = chat_model.name(), source_count = sources.len(), "answered question");
        Ok(RagAnswer { answer: response.text, prompt, sources, usage: response.usage })
    }

    /// Delete every stored segment of `document_id`, returning how many were removed.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let deleted = self
            .vector_store
            .delete(&Filter::eq(DOCUMENT_ID_KEY, document_id))
            .await
            .inspect_err(|e| error!(document.id = document_id, error = %e, "delete failed"))?;
        info!(document.id = document_id, deleted, "deleted document");
        Ok(deleted)
    }

    /// Delete every record in the store.
    pub async fn clear(&self) -> Result<()> {
        self.vector_store.delete_all().await.inspect_err(|e| error!(error = %e, "flush failed"))
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and vector store are required. Without a splitter,
/// a [`TokenWindowSplitter`] sized from the config is used; without a
/// template, [`PromptTemplate::default`] is used; without a chat model,
/// [`RagPipeline::answer`] is unavailable.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .splitter(Arc::new(RecursiveSplitter::new(100, 10)?))  // optional
///     .chat_model(Arc::new(chat))                            // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    splitter: Option<Arc<dyn DocumentSplitter>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    prompt_template: Option<PromptTemplate>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document splitter.
    pub fn splitter(mut self, splitter: Arc<dyn DocumentSplitter>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Set the chat model used to answer questions.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Set the prompt template.
    ///
    /// The template may use the `{{question}}` and `{{information}}` placeholders.
    pub fn prompt_template(mut self, template: impl Into<PromptTemplate>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// template uses placeholders other than `question` and `information`.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let splitter = match self.splitter {
            Some(splitter) => splitter,
            None => Arc::new(TokenWindowSplitter::new(
                config.max_segment_size,
                config.segment_overlap,
            )?),
        };

        let prompt_template = self.prompt_template.unwrap_or_default();
        if let Some(unknown) = prompt_template
            .variables()
            .into_iter()
            .find(|v| v != QUESTION_VARIABLE && v != INFORMATION_VARIABLE)
        {
            return Err(RagError::ConfigError(format!(
                "prompt template uses unknown variable '{unknown}'"
            )));
        }

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            splitter,
            chat_model: self.chat_model,
            prompt_template,
        })
    }
}
