//! Loading documents from the file system.
//!
//! A [`DocumentParser`] turns raw bytes into a [`Document`];
//! [`FileSystemDocumentLoader`] reads files and records where they came from
//! in the document metadata.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::document::{Document, Metadata};
use crate::error::{RagError, Result};

/// Metadata key holding the file name of a loaded document.
pub const FILE_NAME_KEY: &str = "file_name";

/// Metadata key holding the absolute directory of a loaded document.
pub const DIRECTORY_KEY: &str = "absolute_directory_path";

/// Converts the raw bytes of a file into a [`Document`].
pub trait DocumentParser: Send + Sync {
    /// Parse `bytes` into a document with a generated id.
    fn parse(&self, bytes: &[u8]) -> Result<Document>;

    /// A short tag describing the format this parser handles, e.g. `"text"`.
    fn format(&self) -> &str;
}

/// Parses UTF-8 text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentParser;

impl DocumentParser for TextDocumentParser {
    fn parse(&self, bytes: &[u8]) -> Result<Document> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RagError::DocumentParse(format!("invalid UTF-8: {e}")))?;
        Ok(Document::new(text))
    }

    fn format(&self) -> &str {
        "text"
    }
}

/// Loads documents from the local file system.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::{FileSystemDocumentLoader, TextDocumentParser};
///
/// let document =
///     FileSystemDocumentLoader::load_document("johnny.txt", &TextDocumentParser).await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemDocumentLoader;

impl FileSystemDocumentLoader {
    /// Load a single file.
    ///
    /// The document gets a generated id; its metadata records the file name
    /// and the absolute directory.
    ///
    /// # Errors
    ///
    /// - [`RagError::DocumentNotFound`] if `path` does not exist
    /// - [`RagError::BlankDocument`] if the parsed text is empty or whitespace
    /// - [`RagError::DocumentParse`] if the parser rejects the bytes
    pub async fn load_document(
        path: impl AsRef<Path>,
        parser: &dyn DocumentParser,
    ) -> Result<Document> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RagError::DocumentNotFound { path: path.to_path_buf() },
            _ => RagError::Io(e),
        })?;

        let mut document = parser.parse(&bytes)?;
        if document.text.trim().is_empty() {
            return Err(RagError::BlankDocument { path: path.to_path_buf() });
        }

        document.metadata.extend(file_metadata(path).await);
        document.source_uri = Some(path.display().to_string());
        debug!(path = %path.display(), bytes = bytes.len(), "loaded document");
        Ok(document)
    }

    /// Load every regular file directly inside `directory`, in file name order.
    ///
    /// Blank files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentNotFound`] if the directory does not exist,
    /// and propagates any other load failure.
    pub async fn load_documents(
        directory: impl AsRef<Path>,
        parser: &dyn DocumentParser,
    ) -> Result<Vec<Document>> {
        let directory = directory.as_ref();
        let mut entries = tokio::fs::read_dir(directory).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RagError::DocumentNotFound { path: directory.to_path_buf() },
            _ => RagError::Io(e),
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load_document(&path, parser).await {
                Ok(document) => documents.push(document),
                Err(RagError::BlankDocument { path }) => {
                    debug!(path = %path.display(), "skipping blank document");
                }
                Err(e) => return Err(e),
            }
        }

        info!(directory = %directory.display(), count = documents.len(), "loaded documents");
        Ok(documents)
    }
}

async fn file_metadata(path: &Path) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(name) = path.file_name() {
        metadata.insert(FILE_NAME_KEY.to_string(), name.to_string_lossy().into_owned());
    }
    let absolute = tokio::fs::canonicalize(path).await.unwrap_or_else(|_| path.to_path_buf());
    if let Some(parent) = absolute.parent() {
        metadata.insert(DIRECTORY_KEY.to_string(), parent.display().to_string());
    }
    metadata
}
