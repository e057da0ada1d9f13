//! Loading documents from disk.

use astra_rag::{
    DIRECTORY_KEY, FILE_NAME_KEY, FileSystemDocumentLoader, RagError, TextDocumentParser,
};

#[tokio::test]
async fn loads_text_and_records_file_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("johnny.txt");
    std::fs::write(&path, "Johnny is a boy who likes carrots.").unwrap();

    let document =
        FileSystemDocumentLoader::load_document(&path, &TextDocumentParser).await.unwrap();

    assert_eq!(document.text, "Johnny is a boy who likes carrots.");
    assert_eq!(document.metadata[FILE_NAME_KEY], "johnny.txt");
    let canonical_dir = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(document.metadata[DIRECTORY_KEY], canonical_dir.display().to_string());
    assert_eq!(document.source_uri.as_deref(), Some(path.display().to_string().as_str()));
    assert!(!document.id.is_empty());
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");

    let err =
        FileSystemDocumentLoader::load_document(&path, &TextDocumentParser).await.unwrap_err();
    assert!(matches!(err, RagError::DocumentNotFound { path: p } if p == path));
}

#[tokio::test]
async fn blank_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.txt");
    std::fs::write(&path, " \n\t ").unwrap();

    let err =
        FileSystemDocumentLoader::load_document(&path, &TextDocumentParser).await.unwrap_err();
    assert!(matches!(err, RagError::BlankDocument { .. }));
}

#[tokio::test]
async fn invalid_utf8_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.txt");
    std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    let err =
        FileSystemDocumentLoader::load_document(&path, &TextDocumentParser).await.unwrap_err();
    assert!(matches!(err, RagError::DocumentParse(_)));
}

#[tokio::test]
async fn directory_loading_is_sorted_and_skips_blank_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), "second").unwrap();
    std::fs::write(dir.path().join("a.txt"), "first").unwrap();
    std::fs::write(dir.path().join("c.txt"), "   ").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let documents =
        FileSystemDocumentLoader::load_documents(dir.path(), &TextDocumentParser).await.unwrap();

    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}
