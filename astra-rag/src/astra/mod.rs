//! AstraDB vector store backend over the JSON Data API.
//!
//! [`AstraDb`] is a handle on one keyspace of a database; it lists, creates
//! and deletes collections. [`AstraVectorStore`] implements [`VectorStore`]
//! for a single collection.
//!
//! This module is only available when the `astra` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use astra_rag::astra::{AstraConfig, AstraDb};
//! use astra_rag::SimilarityMetric;
//!
//! let db = AstraDb::new(AstraConfig::from_env()?)?;
//! let store = db.create_collection("demo_collection", 1536, SimilarityMetric::Cosine).await?;
//! store.delete_all().await?;
//! ```
//!
//! [`VectorStore`]: crate::VectorStore

mod store;

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info};

pub use store::AstraVectorStore;

use crate::error::{RagError, Result};
use crate::vectorstore::SimilarityMetric;

/// Environment variable holding the application token.
pub const ASTRA_TOKEN_ENV: &str = "ASTRA_DB_APPLICATION_TOKEN";

/// Environment variable holding the database API endpoint.
pub const ASTRA_ENDPOINT_ENV: &str = "ASTRA_DB_API_ENDPOINT";

/// Environment variable holding the keyspace.
pub const ASTRA_KEYSPACE_ENV: &str = "ASTRA_DB_KEYSPACE";

/// Keyspace used when none is configured.
pub const DEFAULT_KEYSPACE: &str = "default_keyspace";

const BACKEND: &str = "AstraDB";

/// Connection settings for an Astra database.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AstraConfig {
    /// Application token (`AstraCS:...`). Never serialized.
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Database API endpoint, e.g. `https://<db-id>-<region>.apps.astra.datastax.com`.
    pub api_endpoint: String,
    /// Keyspace holding the collections.
    pub keyspace: String,
}

impl fmt::Debug for AstraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstraConfig")
            .field("token", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint)
            .field("keyspace", &self.keyspace)
            .finish()
    }
}

impl AstraConfig {
    /// Settings for the default keyspace.
    pub fn new(token: impl Into<String>, api_endpoint: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_endpoint: api_endpoint.into(),
            keyspace: DEFAULT_KEYSPACE.to_string(),
        }
    }

    /// Use another keyspace.
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    /// Read `ASTRA_DB_APPLICATION_TOKEN`, `ASTRA_DB_API_ENDPOINT` and the
    /// optional `ASTRA_DB_KEYSPACE`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| RagError::ConfigError(format!("{name} environment variable not set")))
        };
        let config = Self::new(var(ASTRA_TOKEN_ENV)?, var(ASTRA_ENDPOINT_ENV)?);
        Ok(match std::env::var(ASTRA_KEYSPACE_ENV) {
            Ok(keyspace) if !keyspace.is_empty() => config.with_keyspace(keyspace),
            _ => config,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(RagError::ConfigError("Astra token must not be empty".to_string()));
        }
        if !self.api_endpoint.starts_with("http://") && !self.api_endpoint.starts_with("https://")
        {
            return Err(RagError::ConfigError(format!(
                "Astra API endpoint '{}' must be an http(s) URL",
                self.api_endpoint
            )));
        }
        if self.keyspace.trim().is_empty() {
            return Err(RagError::ConfigError("keyspace must not be empty".to_string()));
        }
        Ok(())
    }
}

/// A collection as reported by [`AstraDb::find_collections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Vector dimension, for vector-enabled collections.
    pub dimension: Option<usize>,
    /// Similarity metric, for vector-enabled collections.
    pub metric: Option<SimilarityMetric>,
}

// ── Data API envelope ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
}

#[derive(Deserialize)]
struct CollectionDescriptor {
    name: String,
    #[serde(default)]
    options: CollectionOptions,
}

#[derive(Default, Deserialize)]
struct CollectionOptions {
    #[serde(default)]
    vector: Option<VectorOptions>,
}

#[derive(Deserialize)]
struct VectorOptions {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    metric: Option<SimilarityMetric>,
}

/// Sends commands to one keyspace of the Data API.
#[derive(Clone)]
struct DataApiClient {
    http: reqwest::Client,
    token: String,
    keyspace_url: String,
}

impl DataApiClient {
    fn url(&self, collection: Option<&str>) -> String {
        match collection {
            Some(name) => format!("{}/{name}", self.keyspace_url),
            None => self.keyspace_url.clone(),
        }
    }

    /// Post one command and return the response envelope.
    ///
    /// Fails on transport errors, non-success HTTP statuses, and responses
    /// carrying an `errors` array.
    async fn command(&self, collection: Option<&str>, command: Value) -> Result<ApiResponse> {
        let url = self.url(collection);
        debug!(backend = BACKEND, %url, "sending data api command");

        let response = self
            .http
            .post(&url)
            .header("Token", &self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| {
                error!(backend = BACKEND, error = %e, "request failed");
                store_error(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, "authentication failed");
            return Err(RagError::Authentication { service: BACKEND.into(), message: body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, "API error");
            return Err(store_error(format!("API returned {status}: {body}")));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| store_error(format!("failed to parse response: {e}")))?;
        if !body.errors.is_empty() {
            let message = body
                .errors
                .iter()
                .map(|e| match &e.error_code {
                    Some(code) => format!("{code}: {}", e.message),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            error!(backend = BACKEND, %message, "data api command rejected");
            return Err(store_error(message));
        }
        Ok(body)
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.into(), message }
}

/// A handle on one keyspace of an Astra database.
#[derive(Clone)]
pub struct AstraDb {
    client: DataApiClient,
    keyspace: String,
}

impl fmt::Debug for AstraDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstraDb").field("keyspace_url", &self.client.keyspace_url).finish()
    }
}

impl AstraDb {
    /// Connect to the database described by `config`.
    ///
    /// No request is made until the first command.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the token, endpoint or keyspace is invalid.
    pub fn new(config: AstraConfig) -> Result<Self> {
        config.validate()?;
        let keyspace_url = format!(
            "{}/api/json/v1/{}",
            config.api_endpoint.trim_end_matches('/'),
            config.keyspace
        );
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        info!(keyspace = %config.keyspace, "connected to astra keyspace");
        let client = DataApiClient { http, token: config.token, keyspace_url };
        Ok(Self { client, keyspace: config.keyspace })
    }

    /// Connect using [`AstraConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(AstraConfig::from_env()?)
    }

    /// The keyspace this handle works in.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// List the collections of the keyspace.
    pub async fn find_collections(&self) -> Result<Vec<CollectionInfo>> {
        let response = self
            .client
            .command(None, json!({ "findCollections": { "options": { "explain": true } } }))
            .await?;

        let collections = response
            .status
            .and_then(|mut status| status.get_mut("collections").map(Value::take))
            .unwrap_or(Value::Array(Vec::new()));
        let descriptors: Vec<CollectionDescriptor> = serde_json::from_value(collections)
            .map_err(|e| store_error(format!("unexpected findCollections response: {e}")))?;

        Ok(descriptors
            .into_iter()
            .map(|d| {
                let vector = d.options.vector;
                CollectionInfo {
                    name: d.name,
                    dimension: vector.as_ref().and_then(|v| v.dimension),
                    metric: vector.and_then(|v| v.metric),
                }
            })
            .collect())
    }

    /// Whether a collection named `name` exists.
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_collections().await?.iter().any(|c| c.name == name))
    }

    /// Create a vector collection, or reuse it if it already exists with the
    /// same options.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimension` is zero, and
    /// [`RagError::VectorStoreError`] if the Data API rejects the command.
    pub async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<AstraVectorStore> {
        if dimension == 0 {
            return Err(RagError::ConfigError(
                "vector dimension must be greater than zero".to_string(),
            ));
        }
        self.client
            .command(
                None,
                json!({ "createCollection": {
                    "name": name,
                    "options": { "vector": { "dimension": dimension, "metric": metric.as_str() } }
                }}),
            )
            .await?;
        info!(collection = name, dimension, metric = metric.as_str(), "collection ready");
        Ok(self.collection(name))
    }

    /// Drop a collection and all its records.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.command(None, json!({ "deleteCollection": { "name": name } })).await?;
        info!(collection = name, "deleted collection");
        Ok(())
    }

    /// A store bound to an existing collection.
    pub fn collection(&self, name: &str) -> AstraVectorStore {
        AstraVectorStore::new(self.client.clone(), name)
    }
}
