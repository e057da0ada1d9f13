//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use astra_rag::{
    ChatMessage, ChatModel, ChatResponse, Embedding, EmbeddingProvider, RagError, Result,
    TokenUsage,
};
use async_trait::async_trait;

pub const DIM: usize = 32;

/// Hashes each lowercase word into one of `DIM` buckets and L2-normalizes
/// the counts, so texts sharing words score high under cosine similarity.
#[derive(Debug, Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(2_166_136_261u32, |h, b| (h ^ u32::from(b)).wrapping_mul(16_777_619));
        vector[hash as usize % DIM] += 1.0;
    }
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    } else {
        vector[0] = 1.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Embedding::new(bag_of_words(text)))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Fails on any text containing `poison`, embeds everything else.
#[derive(Debug)]
pub struct PoisonedEmbedder {
    pub poison: &'static str,
}

#[async_trait]
impl EmbeddingProvider for PoisonedEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.contains(self.poison) {
            return Err(RagError::Authentication {
                service: "mock".to_string(),
                message: "invalid api key".to_string(),
            });
        }
        Ok(Embedding::new(bag_of_words(text)))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Replies with a fixed answer and records every conversation it receives.
#[derive(Debug)]
pub struct ScriptedChatModel {
    pub answer: String,
    pub received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), received: Mutex::new(Vec::new()) }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.received.lock().unwrap().last().and_then(|m| m.last()).map(|m| m.content.clone())
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        self.received.lock().unwrap().push(messages.to_vec());
        if self.answer.trim().is_empty() {
            return Err(RagError::EmptyAnswer { provider: "scripted".to_string() });
        }
        Ok(ChatResponse {
            text: self.answer.clone(),
            finish_reason: Some("stop".to_string()),
            usage: Some(TokenUsage { input_tokens: 10, output_tokens: 3 }),
        })
    }
}
