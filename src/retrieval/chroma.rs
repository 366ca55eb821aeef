//! HTTP client for a Chroma-compatible vector store
//!
//! Collections are addressed by name in configuration but by id in the query
//! endpoint, so the id is resolved once on first use and cached.
//!
//! Exemplars are stored with their code as the document and the remaining
//! fields in metadata. `tags` and `parameters` are written by the population
//! scripts as JSON-encoded strings; both encoded and native forms decode.

use crate::retrieval::store::{Exemplar, ExemplarStore, StoreError, StoreQuery};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub struct ChromaStore {
    base_url: String,
    collection: String,
    collection_id: OnceCell<String>,
    http_client: Client,
    timeout: Duration,
}

impl ChromaStore {
    pub fn new(base_url: String, collection: String) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, collection, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: String,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        if collection.trim().is_empty() {
            return Err(StoreError::ConfigurationError(
                "collection name cannot be empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            collection_id: OnceCell::new(),
            http_client,
            timeout,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true when the store answers its heartbeat endpoint.
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}/api/v1/heartbeat", self.base_url);
        debug!("Checking store health at {}", url);

        match self.http_client.get(&url).send().await {
            Ok(response) => {
                let healthy = response.status().is_success();
                if healthy {
                    info!("Store health check successful");
                } else {
                    warn!("Store health check failed with status: {}", response.status());
                }
                Ok(healthy)
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!("Cannot reach store at {}", self.base_url);
                Ok(false)
            }
            Err(e) => Err(StoreError::Unreachable(format!("Health check failed: {}", e))),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else {
            StoreError::Unreachable(format!("{}: {}", self.base_url, e))
        }
    }

    async fn resolve_collection_id(&self) -> Result<&String, StoreError> {
        self.collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
                debug!("Resolving collection '{}'", self.collection);

                let response = self
                    .http_client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(StoreError::CollectionNotFound(self.collection.clone()));
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    if body.contains("does not exist") {
                        return Err(StoreError::CollectionNotFound(self.collection.clone()));
                    }
                    return Err(StoreError::ApiError {
                        message: body,
                        status_code: status.as_u16(),
                    });
                }

                let info: CollectionInfo = response
                    .json()
                    .await
                    .map_err(|e| StoreError::InvalidResponse(format!("collection: {}", e)))?;
                debug!("Collection '{}' has id {}", info.name, info.id);
                Ok::<String, StoreError>(info.id)
            })
            .await
    }
}

#[async_trait]
impl ExemplarStore for ChromaStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Exemplar>, StoreError> {
        let collection_id = self.resolve_collection_id().await?;
        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, collection_id
        );

        let request = QueryRequest::from_query(query);
        debug!(
            "Querying store: text='{}', n_results={}, category={:?}",
            query.text, query.n_results, query.category
        );

        let start = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Store query failed: {}", e);
                self.map_send_error(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Store returned error status {}: {}", status, body);
            return Err(StoreError::ApiError {
                message: body,
                status_code: status.as_u16(),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        let exemplars = decode_query_response(body)?;
        info!(
            "Store returned {} exemplar(s) in {:.2}s",
            exemplars.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(exemplars)
    }

    fn name(&self) -> &str {
        "chroma"
    }
}

impl fmt::Debug for ChromaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromaStore")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_texts: Vec<String>,
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_clause: Option<Value>,
    include: Vec<&'static str>,
}

impl QueryRequest {
    fn from_query(query: &StoreQuery) -> Self {
        let where_clause = query.category.as_ref().map(|category| {
            let mut clause = Map::new();
            clause.insert("category".to_string(), Value::String(category.clone()));
            Value::Object(clause)
        });

        Self {
            query_texts: vec![query.text.clone()],
            n_results: query.n_results,
            where_clause,
            include: vec!["documents", "metadatas", "distances"],
        }
    }
}

/// Columnar query result: one inner list per query text
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
}

fn first_column<T>(column: Option<Vec<Vec<T>>>) -> Vec<T> {
    column
        .and_then(|outer| outer.into_iter().next())
        .unwrap_or_default()
}

fn decode_query_response(response: QueryResponse) -> Result<Vec<Exemplar>, StoreError> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let documents = first_column(response.documents);
    let metadatas = first_column(response.metadatas);
    let distances = first_column(response.distances);

    if documents.len() != ids.len() {
        return Err(StoreError::InvalidResponse(format!(
            "{} ids but {} documents",
            ids.len(),
            documents.len()
        )));
    }

    let exemplars = ids
        .into_iter()
        .zip(documents)
        .enumerate()
        .map(|(i, (id, document))| {
            let metadata = metadatas.get(i).cloned().flatten().unwrap_or_default();
            let distance = distances.get(i).copied().flatten();
            exemplar_from_parts(id, document.unwrap_or_default(), &metadata, distance)
        })
        .collect();

    Ok(exemplars)
}

fn exemplar_from_parts(
    id: String,
    code: String,
    metadata: &Map<String, Value>,
    distance: Option<f64>,
) -> Exemplar {
    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|s| !s.is_empty())
    };

    Exemplar {
        id,
        title: text("title"),
        description: text("description"),
        category: text("category"),
        tags: metadata.get("tags").map(decode_tags).unwrap_or_default(),
        parameters: metadata
            .get("parameters")
            .map(decode_parameters)
            .unwrap_or_default(),
        code,
        distance,
    }
}

fn decode_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded @ Value::Array(_)) => decode_tags(&decoded),
            _ => encoded
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        },
        _ => Vec::new(),
    }
}

fn decode_parameters(value: &Value) -> BTreeMap<String, Value> {
    match value {
        Value::Object(map) => map.clone().into_iter().collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => {
                debug!("Ignoring undecodable parameters metadata: {}", encoded);
                BTreeMap::new()
            }
        },
        _ => BTreeMap::new(),
    }
}
