//! Error types for the `astra-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document to load does not exist.
    #[error("Document not found: {}", path.display())]
    DocumentNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The document exists but contains no text.
    #[error("Document is blank: {}", path.display())]
    BlankDocument {
        /// The path of the blank document.
        path: PathBuf,
    },

    /// The document bytes could not be parsed into text.
    #[error("Document parse error: {0}")]
    DocumentParse(String),

    /// An I/O error other than a missing file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote service rejected the supplied credentials.
    #[error("Authentication failed ({service}): {message}")]
    Authentication {
        /// The service that rejected the request.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// A metadata filter is structurally invalid.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// An error occurred while calling the chat model.
    #[error("Chat error ({provider}): {message}")]
    ChatError {
        /// The chat provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat model answered without any content.
    #[error("Chat model ({provider}) returned an empty answer")]
    EmptyAnswer {
        /// The chat provider that produced the empty answer.
        provider: String,
    },

    /// A prompt template references a variable that was not supplied.
    #[error("Value for the variable '{0}' is missing")]
    MissingTemplateVariable(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
