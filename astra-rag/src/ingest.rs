//! Document ingestion: split → transform → embed → store.
//!
//! # Example
//!
//! ```rust,ignore
//! use astra_rag::{EmbeddingStoreIngestor, RecursiveSplitter, document_tagger};
//!
//! let ingestor = EmbeddingStoreIngestor::builder()
//!     .splitter(Arc::new(RecursiveSplitter::new(100, 10)?))
//!     .embedding_provider(embedder)
//!     .vector_store(store)
//!     .segment_transformer(document_tagger("doc-1", "text"))
//!     .build()?;
//!
//! let report = ingestor.ingest(&document).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{DOCUMENT_FORMAT_KEY, DOCUMENT_ID_KEY, Document, Segment, StoredRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::splitter::DocumentSplitter;
use crate::vectorstore::VectorStore;

/// A pure function applied to every segment before it is embedded.
pub type SegmentTransformer = Arc<dyn Fn(Segment) -> Segment + Send + Sync>;

/// A transformer that tags segments with a document id and a format.
///
/// The tagged id replaces the one inherited from the parent document, which
/// lets callers group segments under their own logical identifier.
pub fn document_tagger(
    document_id: impl Into<String>,
    format: impl Into<String>,
) -> SegmentTransformer {
    let document_id = document_id.into();
    let format = format.into();
    Arc::new(move |segment: Segment| {
        let mut segment = segment
            .with_metadata(DOCUMENT_ID_KEY, document_id.clone())
            .with_metadata(DOCUMENT_FORMAT_KEY, format.clone());
        segment.document_id = document_id.clone();
        segment
    })
}

/// What an ingestion wrote to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    /// The id carried in the `document_id` metadata of the stored records.
    pub document_id: String,
    /// Ids of the stored records, in segment order, as accepted by
    /// [`VectorStore::delete_by_ids`](crate::VectorStore::delete_by_ids).
    pub record_ids: Vec<String>,
}

impl IngestionReport {
    /// Number of segments stored.
    pub fn segment_count(&self) -> usize {
        self.record_ids.len()
    }
}

/// Splits documents, embeds the segments, and writes them to a vector store.
///
/// Ingestion is not atomic: if the embedding provider or the store fails,
/// the error is returned as-is and records already written stay in place.
pub struct EmbeddingStoreIngestor {
    pub(crate) splitter: Arc<dyn DocumentSplitter>,
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) vector_store: Arc<dyn VectorStore>,
    pub(crate) transformer: Option<SegmentTransformer>,
}

impl EmbeddingStoreIngestor {
    /// Create a new [`EmbeddingStoreIngestorBuilder`].
    pub fn builder() -> EmbeddingStoreIngestorBuilder {
        EmbeddingStoreIngestorBuilder::default()
    }

    /// Split `document` into the segments that [`ingest`](Self::ingest) would store.
    pub fn segments(&self, document: &Document) -> Vec<Segment> {
        self.splitter
            .split(document)
            .into_iter()
            .map(|segment| match &self.transformer {
                Some(transform) => transform(segment),
                None => segment,
            })
            .map(|mut segment| {
                let document_id = segment.document_id.clone();
                segment.metadata.entry(DOCUMENT_ID_KEY.to_string()).or_insert(document_id);
                segment
            })
            .collect()
    }

    /// Ingest a single document.
    ///
    /// # Errors
    ///
    /// Propagates embedding and store failures unchanged. Returns
    /// [`RagError::PipelineError`] if the provider returns the wrong number of
    /// embeddings.
    pub async fn ingest(&self, document: &Document) -> Result<IngestionReport> {
        let segments = self.segments(document);
        let document_id = segments
            .first()
            .and_then(|s| s.metadata.get(DOCUMENT_ID_KEY).cloned())
            .unwrap_or_else(|| document.id.clone());

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(document.id = %document_id, error = %e, "embedding failed during ingestion");
        })?;
        if embeddings.len() != segments.len() {
            return Err(RagError::PipelineError(format!(
                "expected {} embeddings for document '{document_id}', got {}",
                segments.len(),
                embeddings.len()
            )));
        }

        let records: Vec<StoredRecord> = segments
            .into_iter()
            .zip(embeddings)
            .map(|(segment, embedding)| StoredRecord::from_segment(segment, embedding))
            .collect();

        self.vector_store.upsert(&records).await.inspect_err(|e| {
            error!(document.id = %document_id, error = %e, "upsert failed during ingestion");
        })?;

        let record_ids: Vec<String> = records.into_iter().map(|r| r.id).collect();
        info!(document.id = %document_id, segment_count = record_ids.len(), "ingested document");
        Ok(IngestionReport { document_id, record_ids })
    }

    /// Ingest documents one after another, stopping at the first failure.
    pub async fn ingest_all(&self, documents: &[Document]) -> Result<Vec<IngestionReport>> {
        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            reports.push(self.ingest(document).await?);
        }
        Ok(reports)
    }
}

/// Builder for constructing an [`EmbeddingStoreIngestor`].
///
/// All fields except the segment transformer are required.
#[derive(Default)]
pub struct EmbeddingStoreIngestorBuilder {
    splitter: Option<Arc<dyn DocumentSplitter>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    transformer: Option<SegmentTransformer>,
}

impl EmbeddingStoreIngestorBuilder {
    /// Set the document splitter.
    pub fn splitter(mut self, splitter: Arc<dyn DocumentSplitter>) -> Self {
        self.splitter = Some(splitter);
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

    /// Set a transformer applied to every segment before embedding.
    pub fn segment_transformer(mut self, transformer: SegmentTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Build the ingestor, validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<EmbeddingStoreIngestor> {
        let splitter =
            self.splitter.ok_or_else(|| RagError::ConfigError("splitter is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        Ok(EmbeddingStoreIngestor {
            splitter,
            embedding_provider,
            vector_store,
            transformer: self.transformer,
        })
    }
}
