//! # AstraDB Quickstart
//!
//! Connects to a database, lists its collections and creates the collection
//! used by the `astra_rag` demo.
//!
//! Requires `ASTRA_DB_APPLICATION_TOKEN` and `ASTRA_DB_API_ENDPOINT`
//! (`ASTRA_DB_KEYSPACE` is optional).
//!
//! Run: `cargo run --example quickstart`

use astra_rag::astra::AstraDb;
use astra_rag::openai::OpenAIEmbeddingProvider;
use astra_rag::{EmbeddingProvider, SimilarityMetric};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let db = AstraDb::from_env()?;
    println!("Connected to keyspace '{}'", db.keyspace());

    for collection in db.find_collections().await? {
        match collection.dimension {
            Some(dimension) => println!("Collection: {} dimension: {dimension}", collection.name),
            None => println!("Collection: {} (no vector)", collection.name),
        }
    }

    let embedder = OpenAIEmbeddingProvider::from_env()?;
    let store =
        db.create_collection("test", embedder.dimensions(), SimilarityMetric::Cosine).await?;
    println!("Collection '{}' is ready.", store.collection());

    Ok(())
}
