//! Milvus vector store backend.
//!
//! Provides [`MilvusVectorStore`] which implements [`VectorStore`] over the
//! Milvus RESTful API (v2, `/v2/vectordb/...`) using `reqwest`.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_support::milvus::MilvusVectorStore;
//!
//! let store = MilvusVectorStore::new().with_token("root:Milvus");
//! store.connect(&Endpoint { host: "localhost".into(), port: 19530 }).await?;
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::schema::{
    CollectionDescription, CollectionSchema, DistanceMetric, FieldSchema, FieldType,
    PRIMARY_KEY_FIELD, TEXT_FIELD, VECTOR_FIELD,
};
use crate::vectorstore::{Endpoint, VectorStore};

const BACKEND: &str = "milvus";

/// Milvus reports a missing or rejected credential with this code.
const AUTH_ERROR_CODE: i64 = 1800;

/// Response envelope shared by every v2 endpoint.
#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeData {
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<DescribeField>,
    #[serde(default)]
    load: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeField {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    auto_id: bool,
    #[serde(default)]
    params: Vec<FieldParam>,
}

#[derive(Deserialize)]
struct FieldParam {
    key: String,
    value: String,
}

impl DescribeField {
    fn param(&self, key: &str) -> Option<usize> {
        self.params.iter().find(|p| p.key == key).and_then(|p| p.value.parse().ok())
    }

    fn into_schema(self) -> Option<FieldSchema> {
        let data_type = match self.data_type.as_str() {
            "Int64" => FieldType::Int64,
            "FloatVector" => FieldType::FloatVector,
            "VarChar" => FieldType::VarChar,
            _ => return None,
        };
        Some(FieldSchema {
            dim: self.param("dim"),
            max_length: self.param("max_length"),
            name: self.name,
            data_type,
            is_primary: self.primary_key,
            auto_id: self.auto_id,
        })
    }
}

/// Integer keys may arrive as JSON numbers or strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Decode search hits. Hits without a key or a distance are skipped.
fn parse_hits(data: &Value) -> Vec<SearchResult> {
    let Some(hits) = data.as_array() else {
        return Vec::new();
    };
    hits.iter()
        .filter_map(|hit| {
            let id = hit.get(PRIMARY_KEY_FIELD).and_then(as_i64);
            let score = hit.get("distance").and_then(Value::as_f64);
            let (Some(id), Some(score)) = (id, score) else {
                debug!(%hit, "skipping incomplete search hit");
                return None;
            };
            let text = hit.get(TEXT_FIELD).and_then(Value::as_str).unwrap_or_default();
            Some(SearchResult { id, text: text.to_string(), score: score as f32 })
        })
        .collect()
}

/// A [`VectorStore`] backed by [Milvus](https://milvus.io/).
///
/// Collections are created with an `AUTOINDEX` index on the vector field
/// using the metric configured for the gateway.
pub struct MilvusVectorStore {
    client: reqwest::Client,
    token: Option<String>,
    metric: DistanceMetric,
    base_url: RwLock<Option<String>>,
}

impl Default for MilvusVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MilvusVectorStore {
    /// Create an unconnected store.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            token: None,
            metric: DistanceMetric::default(),
            base_url: RwLock::new(None),
        }
    }

    /// Authenticate with a bearer token (`user:password` or an API key).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the metric used when creating collection indexes.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// The metric new collection indexes use.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn connection_error(message: impl Into<String>) -> RagError {
        RagError::ConnectionError { backend: BACKEND.to_string(), message: message.into() }
    }

    fn store_error(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
    }

    async fn post_to(&self, base_url: &str, path: &str, body: Value) -> Result<Value> {
        let url = format!("{base_url}/v2/vectordb/{path}");
        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(backend = BACKEND, %url, error = %e, "request failed");
            Self::connection_error(format!("request to {url} failed: {e}"))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Self::connection_error(format!("authentication rejected ({status})")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::store_error(format!("{path} returned {status}: {body}")));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| Self::store_error(format!("failed to parse {path} response: {e}")))?;

        if envelope.code == 0 {
            return Ok(envelope.data);
        }
        debug!(
            backend = BACKEND,
            path,
            code = envelope.code,
            message = %envelope.message,
            "call failed"
        );
        if envelope.code == AUTH_ERROR_CODE {
            return Err(Self::connection_error(envelope.message));
        }
        Err(Self::store_error(format!("{path} failed ({}): {}", envelope.code, envelope.message)))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let base_url = self
            .base_url
            .read()
            .await
            .clone()
            .ok_or_else(|| Self::connection_error("not connected"))?;
        self.post_to(&base_url, path, body).await
    }

    fn create_request(&self, name: &str, schema: &CollectionSchema) -> Value {
        json!({
            "collectionName": name,
            "description": schema.description,
            "schema": {
                "autoId": schema.primary_key.auto_id,
                "enableDynamicField": false,
                "fields": [
                    {
                        "fieldName": schema.primary_key.name,
                        "dataType": "Int64",
                        "isPrimary": true,
                    },
                    {
                        "fieldName": schema.vector.name,
                        "dataType": "FloatVector",
                        "elementTypeParams": { "dim": schema.dimensions().to_string() },
                    },
                    {
                        "fieldName": schema.text.name,
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": schema.max_text_length().to_string() },
                    },
                ],
            },
            "indexParams": [{
                "fieldName": schema.vector.name,
                "indexName": schema.vector.name,
                "metricType": self.metric.as_str(),
                "indexType": "AUTOINDEX",
            }],
        })
    }
}

#[async_trait]
impl VectorStore for MilvusVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        let base_url = format!("http://{}:{}", endpoint.host, endpoint.port);
        // any authenticated call proves reachability
        self.post_to(&base_url, "collections/list", json!({})).await.map_err(|e| match e {
            RagError::VectorStoreError { message, .. } => Self::connection_error(message),
            other => other,
        })?;
        *self.base_url.write().await = Some(base_url);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let data = self.post("collections/list", json!({})).await?;
        serde_json::from_value(data)
            .map_err(|e| Self::store_error(format!("unexpected collection list: {e}")))
    }

    async fn has_collection(&self, name: &str) -> Result<bool> {
        let data = self.post("collections/has", json!({ "collectionName": name })).await?;
        Ok(data.get("has").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        self.post("collections/create", self.create_request(name, schema)).await?;
        debug!(collection = name, dimensions = schema.dimensions(), "created milvus collection");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<()> {
        self.post("collections/load", json!({ "collectionName": name })).await?;
        Ok(())
    }

    async fn insert(&self, name: &str, vector: &[f32], text: &str) -> Result<i64> {
        let body = json!({
            "collectionName": name,
            "data": [{ VECTOR_FIELD: vector, TEXT_FIELD: text }],
        });
        let data = self.post("entities/insert", body).await.map_err(|e| match e {
            RagError::VectorStoreError { message, .. }
                if message.contains("dim") || message.contains("length") =>
            {
                RagError::SchemaError { collection: name.to_string(), message }
            }
            other => other,
        })?;

        data.get("insertIds")
            .and_then(Value::as_array)
            .and_then(|ids| ids.first())
            .and_then(as_i64)
            .ok_or_else(|| Self::store_error("insert returned no primary key"))
    }

    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<SearchResult>> {
        let body = json!({
            "collectionName": name,
            "data": [vector],
            "annsField": VECTOR_FIELD,
            "limit": top_k,
            "outputFields": [TEXT_FIELD],
            "searchParams": { "metricType": metric.as_str() },
        });
        let data = self.post("entities/search", body).await?;
        Ok(parse_hits(&data))
    }

    async fn count(&self, name: &str) -> Result<u64> {
        let data = self.post("collections/get_stats", json!({ "collectionName": name })).await?;
        data.get("rowCount")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .ok_or_else(|| Self::store_error("get_stats returned no rowCount"))
    }

    async fn describe(&self, name: &str) -> Result<CollectionDescription> {
        let data = self.post("collections/describe", json!({ "collectionName": name })).await?;
        let described: DescribeData = serde_json::from_value(data)
            .map_err(|e| Self::store_error(format!("unexpected describe response: {e}")))?;

        let fields: Vec<FieldSchema> =
            described.fields.into_iter().filter_map(DescribeField::into_schema).collect();
        let take = |field_name: &str| {
            fields.iter().find(|f| f.name == field_name).cloned().ok_or_else(|| {
                Self::store_error(format!("collection '{name}' has no '{field_name}' field"))
            })
        };
        let schema = CollectionSchema {
            primary_key: take(PRIMARY_KEY_FIELD)?,
            vector: take(VECTOR_FIELD)?,
            text: take(TEXT_FIELD)?,
            description: described.description,
        };

        Ok(CollectionDescription {
            name: name.to_string(),
            schema,
            row_count: self.count(name).await?,
            loaded: described.load == "LoadStateLoaded",
        })
    }

    async fn drop_collection(&self, name: &str) -> Result<bool> {
        if !self.has_collection(name).await? {
            return Ok(false);
        }
        self.post("collections/drop", json!({ "collectionName": name })).await?;
        Ok(true)
    }
}
