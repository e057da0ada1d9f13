//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small-scale use cases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{SearchResult, StoredRecord};
use crate::error::Result;
use crate::filter::Filter;
use crate::vectorstore::{SearchRequest, SimilarityMetric, VectorStore};

/// An in-memory vector store with exhaustive similarity search.
///
/// Records are kept in a map keyed by record id. All operations are
/// async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(&records).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    metric: SimilarityMetric,
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store scoring with cosine similarity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store scoring with the given metric.
    pub fn with_metric(metric: SimilarityMetric) -> Self {
        Self { metric, records: RwLock::default() }
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<()> {
        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        debug!(count = records.len(), "upserted records in memory");
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        if let Some(filter) = &request.filter {
            filter.validate()?;
        }

        let store = self.records.read().await;
        let mut scored: Vec<SearchResult> = store
            .values()
            .filter(|record| request.filter.as_ref().is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| SearchResult {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                score: self.metric.score(&record.vector, &request.vector),
            })
            .collect();

        // Ties broken by id so results do not depend on map iteration order.
        scored.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.id.cmp(&b.id))
        });
        scored.truncate(request.top_k);
        Ok(scored)
    }

    async fn delete(&self, filter: &Filter) -> Result<usize> {
        filter.validate()?;

        let mut store = self.records.write().await;
        let before = store.len();
        store.retain(|_, record| !filter.matches(&record.metadata));
        let deleted = before - store.len();
        debug!(deleted, "deleted records in memory");
        Ok(deleted)
    }

    async fn delete_by_ids(&self, ids: &[&str]) -> Result<usize> {
        let mut store = self.records.write().await;
        let deleted = ids.iter().filter(|id| store.remove(**id).is_some()).count();
        debug!(deleted, "deleted records by id in memory");
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
