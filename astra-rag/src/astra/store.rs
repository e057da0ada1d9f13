//! [`VectorStore`] implementation for one Astra collection.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{DataApiClient, store_error};
use crate::document::{Metadata, SearchResult, StoredRecord};
use crate::error::Result;
use crate::filter::Filter;
use crate::vectorstore::{SearchRequest, VectorStore};

/// Field holding the record id.
const ID_FIELD: &str = "_id";
/// Field holding the vector.
const VECTOR_FIELD: &str = "$vector";
/// Field holding the similarity in search results.
const SIMILARITY_FIELD: &str = "$similarity";
/// Field holding the embedded text.
const TEXT_FIELD: &str = "body_blob";

/// A [`VectorStore`] backed by an Astra collection.
///
/// Records are stored as `{_id, $vector, body_blob, ...metadata}`: metadata
/// fields live at the top level of the document so Data API filters can
/// address them directly.
#[derive(Clone)]
pub struct AstraVectorStore {
    client: DataApiClient,
    collection: String,
}

impl std::fmt::Debug for AstraVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstraVectorStore").field("collection", &self.collection).finish()
    }
}

impl AstraVectorStore {
    pub(super) fn new(client: DataApiClient, collection: &str) -> Self {
        Self { client, collection: collection.to_string() }
    }

    /// The collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn command(&self, command: Value) -> Result<super::ApiResponse> {
        self.client.command(Some(&self.collection), command).await
    }

    /// Run `deleteMany` until the server reports no more matches.
    async fn delete_matching(&self, filter: Value) -> Result<usize> {
        let mut deleted = 0;
        loop {
            let response = self.command(json!({ "deleteMany": { "filter": filter } })).await?;
            let status = response.status.as_ref();
            let count = status_field(status, "deletedCount").and_then(|v| v.as_u64()).unwrap_or(0);
            deleted += count as usize;

            let more = status_field(status, "moreData").and_then(|v| v.as_bool()).unwrap_or(false);
            if !more {
                return Ok(deleted);
            }
        }
    }
}

/// Build the Data API document for a record.
fn to_document(record: &StoredRecord) -> Value {
    let mut document: Map<String, Value> = record
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    document.insert(ID_FIELD.to_string(), Value::String(record.id.clone()));
    document.insert(VECTOR_FIELD.to_string(), json!(record.vector));
    document.insert(TEXT_FIELD.to_string(), Value::String(record.text.clone()));
    Value::Object(document)
}

/// Read a search hit back into a [`SearchResult`].
///
/// Reserved fields are stripped from the metadata; non-string scalar
/// metadata values are kept in their JSON text form.
fn from_document(document: Map<String, Value>) -> SearchResult {
    let mut id = String::new();
    let mut text = String::new();
    let mut score = 0.0;
    let mut metadata = Metadata::new();

    for (key, value) in document {
        match (key.as_str(), value) {
            (ID_FIELD, Value::String(s)) => id = s,
            (ID_FIELD, other) => id = other.to_string(),
            (TEXT_FIELD, Value::String(s)) => text = s,
            (SIMILARITY_FIELD, value) => score = value.as_f64().unwrap_or_default() as f32,
            (VECTOR_FIELD, _) => {}
            (_, Value::String(s)) => {
                metadata.insert(key, s);
            }
            (_, value @ (Value::Number(_) | Value::Bool(_))) => {
                metadata.insert(key, value.to_string());
            }
            _ => {}
        }
    }

    SearchResult { id, text, metadata, score }
}

fn status_field(status: Option<&Value>, field: &str) -> Option<Value> {
    status.and_then(|s| s.get(field)).cloned()
}

#[async_trait]
impl VectorStore for AstraVectorStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<()> {
        for record in records {
            self.command(json!({ "findOneAndReplace": {
                "filter": { ID_FIELD: record.id },
                "replacement": to_document(record),
                "options": { "upsert": true }
            }}))
            .await?;
        }
        debug!(collection = %self.collection, count = records.len(), "upserted records to astra");
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        if request.top_k == 0 {
            return Ok(Vec::new());
        }

        let mut find = json!({
            "sort": { VECTOR_FIELD: request.vector },
            "options": { "limit": request.top_k, "includeSimilarity": true }
        });
        if let Some(filter) = &request.filter {
            filter.validate()?;
            find["filter"] = filter.to_json();
        }

        let response = self.command(json!({ "find": find })).await?;
        let documents = response
            .data
            .and_then(|mut data| data.get_mut("documents").map(Value::take))
            .unwrap_or(Value::Array(Vec::new()));
        let Value::Array(documents) = documents else {
            return Err(store_error("find response 'documents' is not an array".to_string()));
        };

        let mut results: Vec<SearchResult> = documents
            .into_iter()
            .filter_map(|d| match d {
                Value::Object(map) => Some(from_document(map)),
                _ => None,
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(request.top_k);

        debug!(collection = %self.collection, count = results.len(), "searched astra");
        Ok(results)
    }

    async fn delete(&self, filter: &Filter) -> Result<usize> {
        filter.validate()?;
        let deleted = self.delete_matching(filter.to_json()).await?;
        debug!(collection = %self.collection, deleted, "deleted records from astra");
        Ok(deleted)
    }

    async fn delete_by_ids(&self, ids: &[&str]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.delete_matching(json!({ ID_FIELD: { "$in": ids } })).await?;
        debug!(collection = %self.collection, deleted, "deleted records by id from astra");
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<()> {
        self.command(json!({ "deleteMany": {} })).await?;
        debug!(collection = %self.collection, "flushed astra collection");
        Ok(())
    }
}
