//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{SearchResult, StoredRecord};
use crate::error::Result;
use crate::filter::Filter;

/// How vectors are compared when ranking search results.
///
/// Scores are reported on the `[0, 1]` relevance scale used by the Astra
/// Data API `$similarity` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `(1 + cos) / 2`
    #[default]
    Cosine,
    /// `(1 + dot) / 2` clamped to `[0, 1]`, meant for unit-length vectors
    DotProduct,
    /// `1 / (1 + d²)`
    Euclidean,
}

impl SimilarityMetric {
    /// The name used by the Data API collection options.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::DotProduct => "dot_product",
            Self::Euclidean => "euclidean",
        }
    }

    /// Score two vectors of equal length.
    ///
    /// Returns 0.0 for cosine when either vector has zero magnitude. The
    /// result always lies in `[0, 1]`, also for dot product over vectors
    /// that are not unit length.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                ((1.0 + dot(a, b) / (norm_a * norm_b)) / 2.0).clamp(0.0, 1.0)
            }
            Self::DotProduct => ((1.0 + dot(a, b)) / 2.0).clamp(0.0, 1.0),
            Self::Euclidean => {
                let squared: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                1.0 / (1.0 + squared)
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A nearest-neighbour query against a [`VectorStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// The query vector.
    pub vector: Vec<f32>,
    /// Optional metadata predicate restricting candidate records.
    pub filter: Option<Filter>,
    /// Maximum number of results.
    pub top_k: usize,
}

impl SearchRequest {
    /// Search for the `top_k` nearest records to `vector`.
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self { vector, filter: None, top_k }
    }

    /// Restrict the search to records matching `filter`.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A storage backend for vector embeddings with similarity search.
///
/// A store is bound to one collection. Records are created by
/// [`upsert`](VectorStore::upsert) and removed individually or in bulk by
/// filter; they are never mutated in place by this crate.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::{Filter, InMemoryVectorStore, SearchRequest, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(&records).await?;
/// let request = SearchRequest::new(query_vector, 5).with_filter(Filter::eq("document_id", "d1"));
/// let results = store.search(&request).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert records, replacing any record that has the same id.
    async fn upsert(&self, records: &[StoredRecord]) -> Result<()>;

    /// Return up to `top_k` records matching the filter, ordered by
    /// descending score.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;

    /// Delete every record matching `filter`, returning how many were removed.
    async fn delete(&self, filter: &Filter) -> Result<usize>;

    /// Delete the records with the given ids, returning how many were removed.
    ///
    /// Unknown ids are ignored.
    async fn delete_by_ids(&self, ids: &[&str]) -> Result<usize>;

    /// Delete every record in the collection.
    async fn delete_all(&self) -> Result<()>;
}
