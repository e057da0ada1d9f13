//! Retrieval: embed a query, search the store, keep the relevant segments.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::filter::Filter;
use crate::vectorstore::{SearchRequest, VectorStore};

/// Parameters of a single retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    /// Optional metadata predicate restricting candidate records.
    pub filter: Option<Filter>,
    /// Maximum number of results.
    pub max_results: usize,
    /// Minimum relevance score; lower-scoring results are dropped.
    pub min_score: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { filter: None, max_results: 5, min_score: 0.0 }
    }
}

/// Retrieves the segments most relevant to a query.
///
/// Each retrieval embeds the query once and issues a single search. Results
/// are ordered by descending score, hold only scores `>= min_score`, and
/// never exceed `max_results`.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::{EmbeddingStoreRetriever, Filter};
///
/// let retriever = EmbeddingStoreRetriever::new(embedder, store)
///     .with_max_results(5)
///     .with_min_score(0.3)
///     .with_filter(Filter::eq("document_id", doc_id));
/// let context = retriever.retrieve_context("Who is Johnny?", ",").await?;
/// ```
pub struct EmbeddingStoreRetriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    options: RetrievalOptions,
}

impl EmbeddingStoreRetriever {
    /// Create a retriever with default options (5 results, no threshold, no filter).
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store, options: RetrievalOptions::default() }
    }

    /// Set the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.options.max_results = max_results;
        self
    }

    /// Set the minimum relevance score.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.options.min_score = min_score;
        self
    }

    /// Restrict every retrieval to records matching `filter`.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.options.filter = Some(filter);
        self
    }

    /// The options used by [`retrieve`](Self::retrieve).
    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    /// Retrieve with the retriever's own options.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_with(query, &self.options).await
    }

    /// Retrieve with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidFilter`](crate::RagError::InvalidFilter)
    /// before any remote call if the filter is malformed, and propagates
    /// embedding and search failures unchanged.
    pub async fn retrieve_with(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<SearchResult>> {
        if let Some(filter) = &options.filter {
            filter.validate()?;
        }
        if options.max_results == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
        })?;

        let mut request = SearchRequest::new(embedding.vector, options.max_results);
        request.filter = options.filter.clone();
        let results = self.vector_store.search(&request).await.inspect_err(|e| {
            error!(error = %e, "vector store search failed");
        })?;
        debug!(candidates = results.len(), "vector store returned candidates");

        let mut results: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= options.min_score).collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(options.max_results);

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Retrieve and join the segment texts with `separator`.
    pub async fn retrieve_context(&self, query: &str, separator: &str) -> Result<String> {
        let results = self.retrieve(query).await?;
        Ok(join_texts(&results, separator))
    }
}

/// Join the texts of `results` in order.
pub fn join_texts(results: &[SearchResult], separator: &str) -> String {
    results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(separator)
}
