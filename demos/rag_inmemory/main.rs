//! # In-Memory RAG
//!
//! The `astra_rag` flow with no external services: an `InMemoryVectorStore`,
//! a deterministic bag-of-words embedder and a chat model that echoes the
//! context it was given. Runs with **zero API keys**.
//!
//! Run: `cargo run --example rag_inmemory`

use std::path::Path;
use std::sync::Arc;

use astra_rag::{
    ChatMessage, ChatModel, ChatResponse, DOCUMENT_ID_KEY, Embedding, EmbeddingProvider, Filter,
    InMemoryVectorStore, RagConfig, RagPipeline, RecursiveSplitter, TextDocumentParser,
};

// ---------------------------------------------------------------------------
// BagOfWordsEmbedder: hashes words into buckets, so shared words mean similar vectors
// ---------------------------------------------------------------------------

struct BagOfWordsEmbedder {
    dimensions: usize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> astra_rag::Result<Embedding> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(Embedding::new(vector))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// EchoChatModel: answers with the last line of the prompt
// ---------------------------------------------------------------------------

struct EchoChatModel;

#[async_trait::async_trait]
impl ChatModel for EchoChatModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, messages: &[ChatMessage]) -> astra_rag::Result<ChatResponse> {
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        let context = prompt.lines().last().unwrap_or_default();
        Ok(ChatResponse {
            text: format!("From what I was told: {context}"),
            finish_reason: None,
            usage: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Build the pipeline with in-memory components ------------------
    // 40-token segments keep several segments per file; min_score 0.5 drops
    // segments sharing no words with the question.
    let config = RagConfig::builder()
        .max_segment_size(40)
        .segment_overlap(5)
        .max_results(3)
        .min_score(0.5)
        .build()?;
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(BagOfWordsEmbedder { dimensions: 64 }))
        .vector_store(store.clone())
        .splitter(Arc::new(RecursiveSplitter::new(40, 5)?))
        .chat_model(Arc::new(EchoChatModel))
        .build()?;

    // -- 2. Ingest the sample documents -----------------------------------
    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    for (id, file) in [("johnny", "johnny.txt"), ("carrot", "story-about-happy-carrot.txt")] {
        let report = pipeline.ingest_file(data.join(file), &TextDocumentParser, id).await?;
        println!("  {file} → {} segment(s)", report.segment_count());
    }
    println!("Store holds {} records", store.len().await);

    // -- 3. Ask, scoped to one document -----------------------------------
    let question = "Who is Johnny?";
    let answer = pipeline.answer(question, Some(Filter::eq(DOCUMENT_ID_KEY, "johnny"))).await?;
    println!("\nQuestion: {question}");
    for (i, source) in answer.sources.iter().enumerate() {
        println!("  {}. [score={:.4}] {}", i + 1, source.score, source.text.trim());
    }
    println!("Answer: {}", answer.answer);

    // -- 4. Remove one document -------------------------------------------
    let deleted = pipeline.delete_document("carrot").await?;
    println!("\nDeleted {deleted} carrot segment(s); {} records left", store.len().await);
    Ok(())
}
