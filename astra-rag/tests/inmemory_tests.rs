//! Search ordering, filtering and deletion in the in-memory vector store.

use std::collections::HashMap;
use std::sync::Arc;

use astra_rag::{
    Embedding, EmbeddingProvider, EmbeddingStoreRetriever, Filter, InMemoryVectorStore, Metadata,
    RagError, SearchRequest, SimilarityMetric, StoredRecord, VectorStore,
};
use async_trait::async_trait;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// Generate a record with a normalized embedding, tagged with one of three documents.
fn arb_record(dim: usize) -> impl Strategy<Value = StoredRecord> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim), 0u8..3).prop_map(
        |(id, text, vector, doc)| StoredRecord {
            id,
            text,
            vector,
            metadata: Metadata::from([("document_id".to_string(), format!("doc_{doc}"))]),
        },
    )
}

fn dedup(records: &[StoredRecord]) -> Vec<StoredRecord> {
    let mut deduped: HashMap<String, StoredRecord> = HashMap::new();
    for record in records {
        deduped.entry(record.id.clone()).or_insert_with(|| record.clone());
    }
    deduped.into_values().collect()
}

/// For any set of stored records, search returns results ordered by descending
/// score, with scores in `[0, 1]`, and at most `top_k` of them.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            records in proptest::collection::vec(arb_record(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let unique = dedup(&records);
                store.upsert(&unique).await.unwrap();
                let request = SearchRequest::new(query.clone(), top_k);
                let results = store.search(&request).await.unwrap();
                (results, unique.len())
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
            for result in &results {
                prop_assert!((-1e-6..=1.0 + 1e-6).contains(&result.score));
            }
        }

        #[test]
        fn filtered_search_only_returns_matching_records(
            records in proptest::collection::vec(arb_record(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            doc in 0u8..3,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let document_id = format!("doc_{doc}");
            let (results, expected) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let unique = dedup(&records);
                store.upsert(&unique).await.unwrap();
                let request = SearchRequest::new(query.clone(), 50)
                    .with_filter(Filter::eq("document_id", document_id.clone()));
                let expected =
                    unique.iter().filter(|r| r.metadata["document_id"] == document_id).count();
                (store.search(&request).await.unwrap(), expected)
            });

            prop_assert_eq!(results.len(), expected);
            for result in &results {
                prop_assert_eq!(&result.metadata["document_id"], &document_id);
            }
        }
    }
}

fn record(id: &str, document_id: &str, vector: Vec<f32>) -> StoredRecord {
    StoredRecord {
        id: id.to_string(),
        vector,
        text: format!("text of {id}"),
        metadata: Metadata::from([("document_id".to_string(), document_id.to_string())]),
    }
}

#[tokio::test]
async fn upsert_replaces_records_with_the_same_id() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "d1", vec![1.0, 0.0])]).await.unwrap();
    let mut replacement = record("a", "d2", vec![0.0, 1.0]);
    replacement.text = "replaced".to_string();
    store.upsert(&[replacement]).await.unwrap();

    assert_eq!(store.len().await, 1);
    let results = store.search(&SearchRequest::new(vec![0.0, 1.0], 5)).await.unwrap();
    assert_eq!(results[0].text, "replaced");
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn delete_by_filter_reports_count_and_keeps_other_documents() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("a", "d1", vec![1.0, 0.0]),
            record("b", "d1", vec![0.0, 1.0]),
            record("c", "d2", vec![1.0, 1.0]),
        ])
        .await
        .unwrap();

    assert_eq!(store.delete(&Filter::eq("document_id", "d1")).await.unwrap(), 2);
    assert_eq!(store.delete(&Filter::eq("document_id", "d1")).await.unwrap(), 0);

    let remaining = store.search(&SearchRequest::new(vec![1.0, 0.0], 10)).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "c");
}

#[tokio::test]
async fn delete_by_ids_removes_individual_records() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("r1", "d1", vec![1.0, 0.0]),
            record("r2", "d1", vec![0.0, 1.0]),
            record("r3", "d2", vec![1.0, 1.0]),
        ])
        .await
        .unwrap();

    assert_eq!(store.delete_by_ids(&["r1", "r3", "missing"]).await.unwrap(), 2);
    assert_eq!(store.delete_by_ids(&["r1"]).await.unwrap(), 0);

    let remaining = store.search(&SearchRequest::new(vec![1.0, 0.0], 10)).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "r2");
}

#[tokio::test]
async fn record_id_is_not_a_filter_field() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("r1", "d1", vec![1.0])]).await.unwrap();

    let err = store.delete(&Filter::eq("_id", "r1")).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidFilter(_)));
    assert_eq!(store.len().await, 1);
}

/// Always embeds to the same, deliberately non-unit, vector.
struct FixedEmbedder(Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str) -> astra_rag::Result<Embedding> {
        Ok(Embedding::new(self.0.clone()))
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

#[tokio::test]
async fn dot_product_scores_stay_in_unit_range_for_long_vectors() {
    let store = Arc::new(InMemoryVectorStore::with_metric(SimilarityMetric::DotProduct));
    store
        .upsert(&[record("long", "d1", vec![3.0, 0.0]), record("opposite", "d1", vec![-3.0, 0.0])])
        .await
        .unwrap();

    let results = store.search(&SearchRequest::new(vec![3.0, 0.0], 10)).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    assert_eq!(results[0].score, 1.0);

    let embedder = Arc::new(FixedEmbedder(vec![3.0, 0.0]));
    let retriever = EmbeddingStoreRetriever::new(embedder, store).with_min_score(1.1);
    assert!(retriever.retrieve("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_all_empties_the_store() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "d1", vec![1.0]), record("b", "d2", vec![1.0])]).await.unwrap();
    store.delete_all().await.unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_filters_are_rejected() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "d1", vec![1.0])]).await.unwrap();

    let request = SearchRequest::new(vec![1.0], 5)
        .with_filter(Filter::is_in("document_id", Vec::<String>::new()));
    assert!(matches!(store.search(&request).await, Err(RagError::InvalidFilter(_))));
    assert!(matches!(store.delete(&Filter::eq("", "x")).await, Err(RagError::InvalidFilter(_))));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn zero_top_k_returns_nothing() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "d1", vec![1.0])]).await.unwrap();
    assert!(store.search(&SearchRequest::new(vec![1.0], 0)).await.unwrap().is_empty());
}
