//! Data types for documents, segments, embeddings, and stored records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key-value metadata attached to documents, segments, and stored records.
pub type Metadata = HashMap<String, String>;

/// Metadata key carrying the identifier of the originating document.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Metadata key carrying the format tag of the originating document.
pub const DOCUMENT_FORMAT_KEY: &str = "document_format";

/// Metadata key carrying a segment's position within its document.
pub const SEGMENT_INDEX_KEY: &str = "index";

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: Metadata,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with a generated UUID identifier and no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    /// Create a document with an explicit identifier and no metadata.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: Metadata::new(), source_uri: None }
    }

    /// Add a metadata entry, returning the updated document.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A contiguous slice of a [`Document`]'s text, prepared for embedding.
///
/// The metadata is the parent document's metadata plus the segment index and
/// the [`DOCUMENT_ID_KEY`] entry, so filters can scope operations to one
/// logical document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// The text content of the segment.
    pub text: String,
    /// Position of the segment within its parent document.
    pub index: usize,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Key-value metadata inherited from the parent plus segment-specific fields.
    pub metadata: Metadata,
}

impl Segment {
    /// Build the segment at `index` of `document`, inheriting its metadata.
    pub fn from_document(document: &Document, index: usize, text: impl Into<String>) -> Self {
        let mut metadata = document.metadata.clone();
        metadata.insert(SEGMENT_INDEX_KEY.to_string(), index.to_string());
        metadata.insert(DOCUMENT_ID_KEY.to_string(), document.id.clone());
        Self { text: text.into(), index, document_id: document.id.clone(), metadata }
    }

    /// Add a metadata entry, returning the updated segment.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A vector embedding computed from a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// The embedding vector.
    pub vector: Vec<f32>,
}

impl Embedding {
    /// Wrap a raw vector.
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    /// The number of components in the vector.
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vector: Vec<f32>) -> Self {
        Self::new(vector)
    }
}

/// A persisted `(vector, text, metadata)` triple held by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    /// Generated unique identifier of the record.
    pub id: String,
    /// The embedding vector of the text.
    pub vector: Vec<f32>,
    /// The embedded text.
    pub text: String,
    /// Metadata used for filtering.
    pub metadata: Metadata,
}

impl StoredRecord {
    /// Build a record for an embedded segment under a fresh UUID.
    pub fn from_segment(segment: Segment, embedding: Embedding) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector: embedding.vector,
            text: segment.text,
            metadata: segment.metadata,
        }
    }
}

/// A stored record's text and metadata paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Identifier of the matching record.
    pub id: String,
    /// The stored text.
    pub text: String,
    /// The stored metadata.
    pub metadata: Metadata,
    /// The relevance score in `[0, 1]` (higher is more relevant).
    pub score: f32,
}
