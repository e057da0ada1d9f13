//! # astra-rag
//!
//! Retrieval-Augmented Generation over AstraDB vector collections.
//!
//! Documents are loaded, split into overlapping segments, embedded and
//! upserted into a vector collection. Questions are embedded, the closest
//! segments are retrieved (optionally scoped by a metadata [`Filter`]), and
//! their text is substituted into a prompt template that is sent to a chat
//! model.
//!
//! ## Features
//!
//! - `openai` (default): OpenAI embeddings and chat completions
//! - `astra` (default): AstraDB vector store over the JSON Data API
//! - `full`: everything
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use astra_rag::astra::AstraDb;
//! use astra_rag::openai::{OpenAIChatConfig, OpenAIChatModel, OpenAIEmbeddingProvider};
//! use astra_rag::{Filter, RagPipeline, SimilarityMetric, TextDocumentParser};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = OpenAIEmbeddingProvider::from_env()?;
//!     let db = AstraDb::from_env()?;
//!     let store = db.create_collection("rag", 1536, SimilarityMetric::Cosine).await?;
//!     let chat = OpenAIChatModel::new(OpenAIChatConfig::from_env()?.build()?)?;
//!
//!     let pipeline = RagPipeline::builder()
//!         .embedding_provider(Arc::new(embedder))
//!         .vector_store(Arc::new(store))
//!         .chat_model(Arc::new(chat))
//!         .build()?;
//!
//!     pipeline.ingest_file("johnny.txt", &TextDocumentParser, "johnny").await?;
//!     let filter = Filter::eq("document_id", "johnny");
//!     let answer = pipeline.answer("Who is Johnny?", Some(filter)).await?;
//!     println!("{}", answer.answer);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod splitter;
pub mod vectorstore;

#[cfg(feature = "astra")]
pub mod astra;
#[cfg(feature = "openai")]
pub mod openai;

pub use chat::{ChatMessage, ChatModel, ChatResponse, Role, TokenUsage};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    DOCUMENT_FORMAT_KEY, DOCUMENT_ID_KEY, Document, Embedding, Metadata, SEGMENT_INDEX_KEY,
    SearchResult, Segment, StoredRecord,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filter::Filter;
pub use ingest::{
    EmbeddingStoreIngestor, EmbeddingStoreIngestorBuilder, IngestionReport, SegmentTransformer,
    document_tagger,
};
pub use inmemory::InMemoryVectorStore;
pub use loader::{
    DIRECTORY_KEY, DocumentParser, FILE_NAME_KEY, FileSystemDocumentLoader, TextDocumentParser,
};
pub use pipeline::{
    INFORMATION_VARIABLE, QUESTION_VARIABLE, RagAnswer, RagPipeline, RagPipelineBuilder,
};
pub use prompt::{DEFAULT_RAG_TEMPLATE, Prompt, PromptTemplate};
pub use retrieval::{EmbeddingStoreRetriever, RetrievalOptions, join_texts};
pub use splitter::{
    CharTokenizer, DocumentSplitter, RecursiveSplitter, TokenWindowSplitter, Tokenizer,
    WordTokenizer,
};
pub use vectorstore::{SearchRequest, SimilarityMetric, VectorStore};
