//! # AstraDB RAG
//!
//! The full flow against a real database and OpenAI:
//!
//! 1. create (or reuse) `demo_collection` and flush it
//! 2. ingest two text files, each under its own random document id
//! 3. search the raw collection for the first document's segments, then
//!    retrieve them through the embedding store with a score threshold
//! 4. answer the question with `gpt-3.5-turbo`
//!
//! Requires `ASTRA_DB_APPLICATION_TOKEN`, `ASTRA_DB_API_ENDPOINT` and
//! `OPENAI_API_KEY`.
//!
//! Run: `cargo run --example astra_rag`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use astra_rag::astra::AstraDb;
use astra_rag::openai::{OpenAIChatConfig, OpenAIChatModel, OpenAIEmbeddingProvider};
use astra_rag::{
    DOCUMENT_ID_KEY, EmbeddingProvider, Filter, RagConfig, RagPipeline, RecursiveSplitter,
    SearchRequest, SimilarityMetric, TextDocumentParser, VectorStore,
};
use tracing::info;
use uuid::Uuid;

const COLLECTION: &str = "demo_collection";
const QUESTION: &str = "Who is Johnny ?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Collection ----------------------------------------------------
    let db = AstraDb::from_env()?;
    info!(keyspace = db.keyspace(), "connected to astra");

    let embedder = Arc::new(OpenAIEmbeddingProvider::from_env()?);
    let store =
        db.create_collection(COLLECTION, embedder.dimensions(), SimilarityMetric::Cosine).await?;
    let store = Arc::new(store);

    // -- 2. Pipeline ------------------------------------------------------
    let config = RagConfig::builder()
        .max_segment_size(100)
        .segment_overlap(10)
        .max_results(5)
        .min_score(0.3)
        .context_separator(",")
        .build()?;
    let chat = OpenAIChatModel::new(
        OpenAIChatConfig::from_env()?
            .model("gpt-3.5-turbo")
            .temperature(0.7)
            .timeout(Duration::from_secs(15))
            .max_retries(3)
            .log_requests(true)
            .log_responses(true)
            .build()?,
    )?;
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .splitter(Arc::new(RecursiveSplitter::new(100, 10)?))
        .chat_model(Arc::new(chat))
        .build()?;

    pipeline.clear().await?;
    info!(collection = COLLECTION, "collection flushed");

    // -- 3. Ingestion -----------------------------------------------------
    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let johnny_id = Uuid::new_v4().to_string();
    let carrot_id = Uuid::new_v4().to_string();
    pipeline.ingest_file(data.join("johnny.txt"), &TextDocumentParser, &johnny_id).await?;
    let carrot = data.join("story-about-happy-carrot.txt");
    pipeline.ingest_file(carrot, &TextDocumentParser, &carrot_id).await?;

    // -- 4. Retrieval and answer ------------------------------------------
    let filter = Filter::eq(DOCUMENT_ID_KEY, johnny_id.as_str());

    // Raw collection search: nearest records, no score threshold.
    let query = embedder.embed(QUESTION).await?;
    let request = SearchRequest::new(query.vector, 5).with_filter(filter.clone());
    for hit in store.search(&request).await? {
        info!(score = hit.score, "collection hit: {}", hit.text);
    }

    // Embedding store search: same filter, results below the minimum score dropped.
    for segment in pipeline.retrieve(QUESTION, Some(filter.clone())).await? {
        info!(score = segment.score, "segment: {}", segment.text);
    }

    let answer = pipeline.answer(QUESTION, Some(filter)).await?;
    info!("final prompt:\n{}", answer.prompt.text());
    println!("Answer from the model: {}", answer.answer);

    // -- 5. Clean up ------------------------------------------------------
    let deleted = pipeline.delete_document(&johnny_id).await?
        + pipeline.delete_document(&carrot_id).await?;
    info!(deleted, "removed demo documents");
    Ok(())
}
