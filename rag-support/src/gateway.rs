//! Vector store gateway.
//!
//! [`VectorStoreGateway`] owns the connection lifecycle and the collection
//! schema, and mediates every read and write against a [`VectorStore`].
//! Records are validated against the configured schema before they reach the
//! store, so a vector of the wrong width never gets padded or truncated.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_support::{InMemoryVectorStore, StoreConfig, VectorStoreGateway};
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! let gateway = VectorStoreGateway::new(store, StoreConfig::default());
//! gateway.connect_default().await?;
//! gateway.ensure_collection("rag_data", 768).await?;
//! let id = gateway.insert("rag_data", &embedding, "chunk text").await?;
//! gateway.load("rag_data").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::StoreConfig;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::schema::{CollectionDescription, CollectionSchema, CollectionStatus};
use crate::vectorstore::{Endpoint, VectorStore};

/// Connection and schema owner for one vector store service.
pub struct VectorStoreGateway {
    store: Arc<dyn VectorStore>,
    config: StoreConfig,
    connections: Mutex<HashMap<String, Endpoint>>,
    /// Vector width of each collection this gateway created.
    dimensions: Mutex<HashMap<String, usize>>,
}

impl VectorStoreGateway {
    /// Create a gateway over `store`. No connection is made until
    /// [`connect`](Self::connect) is called.
    pub fn new(store: Arc<dyn VectorStore>, config: StoreConfig) -> Self {
        Self {
            store,
            config,
            connections: Mutex::new(HashMap::new()),
            dimensions: Mutex::new(HashMap::new()),
        }
    }

    /// Return a reference to the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Return the backend name of the underlying store.
    pub fn backend(&self) -> &str {
        self.store.backend()
    }

    fn connection_error(&self, message: impl Into<String>) -> RagError {
        RagError::ConnectionError { backend: self.backend().to_string(), message: message.into() }
    }

    fn schema_error(collection: &str, message: impl Into<String>) -> RagError {
        RagError::SchemaError { collection: collection.to_string(), message: message.into() }
    }

    /// Establish a connection registered under `alias`.
    ///
    /// Repeating the call with the same alias and address is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConnectionError`] if the service cannot be reached,
    /// or if `alias` is already bound to a different address.
    pub async fn connect(&self, alias: &str, host: &str, port: u16) -> Result<()> {
        let endpoint = Endpoint { host: host.to_string(), port };
        let mut connections = self.connections.lock().await;

        if let Some(existing) = connections.get(alias) {
            if *existing == endpoint {
                debug!(alias, %endpoint, "connection already established");
                return Ok(());
            }
            return Err(self.connection_error(format!(
                "alias '{alias}' is already connected to {existing}, not {endpoint}"
            )));
        }

        self.store.connect(&endpoint).await.map_err(|e| {
            error!(alias, %endpoint, error = %e, "failed to connect to vector store");
            match e {
                RagError::ConnectionError { .. } => e,
                other => self.connection_error(other.to_string()),
            }
        })?;

        info!(alias, %endpoint, backend = self.backend(), "connected to vector store");
        connections.insert(alias.to_string(), endpoint);
        Ok(())
    }

    /// Connect with the alias, host and port from the configuration.
    pub async fn connect_default(&self) -> Result<()> {
        let StoreConfig { alias, host, port, .. } = &self.config;
        self.connect(alias, host, *port).await
    }

    /// Whether any connection has been established.
    pub async fn is_connected(&self) -> bool {
        !self.connections.lock().await.is_empty()
    }

    async fn require_connection(&self) -> Result<()> {
        if self.is_connected().await {
            Ok(())
        } else {
            Err(self.connection_error("not connected; call connect first"))
        }
    }

    /// Create the collection with the RAG schema unless it already exists.
    ///
    /// Records written through this gateway to a collection it created are
    /// checked against `dimensions`. An existing collection is left untouched
    /// and checked against the configured dimensions; a mismatch with its real
    /// schema surfaces as a [`RagError::SchemaError`] from the store at insert.
    pub async fn ensure_collection(
        &self,
        name: &str,
        dimensions: usize,
    ) -> Result<CollectionStatus> {
        self.require_connection().await?;

        if self.store.has_collection(name).await? {
            debug!(collection = name, "collection already exists, skipping creation");
            return Ok(CollectionStatus::Existing);
        }

        let schema = CollectionSchema::rag(dimensions, self.config.max_text_length);
        self.store.create_collection(name, &schema).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            e
        })?;
        self.dimensions.lock().await.insert(name.to_string(), dimensions);
        info!(collection = name, dimensions, "created collection");
        Ok(CollectionStatus::Created)
    }

    /// Create a collection with the configured dimensions.
    ///
    /// Used by the admin shell; returns whether the collection is new.
    pub async fn create_collection(&self, name: &str) -> Result<CollectionStatus> {
        self.ensure_collection(name, self.config.dimensions).await
    }

    async fn expected_dimensions(&self, collection: &str) -> usize {
        let known = self.dimensions.lock().await.get(collection).copied();
        known.unwrap_or(self.config.dimensions)
    }

    async fn check_vector(&self, collection: &str, vector: &[f32]) -> Result<()> {
        let expected = self.expected_dimensions(collection).await;
        if vector.len() != expected {
            return Err(Self::schema_error(
                collection,
                format!("expected {expected} dimensions, got {}", vector.len()),
            ));
        }
        if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
            return Err(Self::schema_error(
                collection,
                format!("component {position} is not a finite number"),
            ));
        }
        Ok(())
    }

    /// Append one `(vector, text)` record and return its primary key.
    ///
    /// The record is not visible to [`search`](Self::search) until the
    /// collection is [loaded](Self::load) again.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SchemaError`] if the vector width differs from the
    /// collection's dimensions or the text exceeds the configured bound.
    pub async fn insert(&self, collection: &str, vector: &[f32], text: &str) -> Result<i64> {
        self.require_connection().await?;
        self.check_vector(collection, vector).await?;

        let max_length = self.config.max_text_length;
        let length = text.chars().count();
        if length > max_length {
            return Err(Self::schema_error(
                collection,
                format!("text length {length} exceeds max_length {max_length}"),
            ));
        }

        let id = self.store.insert(collection, vector, text).await?;
        debug!(collection, id, "inserted record");
        Ok(id)
    }

    /// Refresh the collection so recent inserts become searchable.
    pub async fn load(&self, collection: &str) -> Result<()> {
        self.require_connection().await?;
        self.store.load(collection).await
    }

    /// Return the `top_k` nearest records under the configured metric.
    pub async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.require_connection().await?;
        self.check_vector(collection, query).await?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        self.store.search(collection, query, top_k, self.config.metric).await
    }

    /// Number of persisted records in the collection.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        self.require_connection().await?;
        self.store.count(collection).await
    }

    /// Describe the collection.
    pub async fn describe(&self, collection: &str) -> Result<CollectionDescription> {
        self.require_connection().await?;
        self.store.describe(collection).await
    }

    /// Drop the collection. Returns `false` if it did not exist.
    pub async fn drop(&self, collection: &str) -> Result<bool> {
        self.require_connection().await?;
        let dropped = self.store.drop_collection(collection).await?;
        self.dimensions.lock().await.remove(collection);
        if dropped {
            info!(collection, "dropped collection");
        }
        Ok(dropped)
    }

    /// Whether the collection exists.
    pub async fn has_collection(&self, collection: &str) -> Result<bool> {
        self.require_connection().await?;
        self.store.has_collection(collection).await
    }

    /// List all collection names.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.require_connection().await?;
        self.store.list_collections().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::InMemoryVectorStore;

    fn gateway(dimensions: usize) -> VectorStoreGateway {
        let config = StoreConfig::builder().dimensions(dimensions).build().unwrap();
        VectorStoreGateway::new(Arc::new(InMemoryVectorStore::new()), config)
    }

    #[tokio::test]
    async fn operations_require_a_connection() {
        let gateway = gateway(2);
        let err = gateway.ensure_collection("docs", 2).await.unwrap_err();
        assert!(err.is_connection());
        let err = gateway.insert("docs", &[0.0, 1.0], "text").await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn alias_cannot_be_rebound_to_another_address() {
        let gateway = gateway(2);
        gateway.connect("default", "localhost", 19530).await.unwrap();
        gateway.connect("default", "localhost", 19530).await.unwrap();
        let err = gateway.connect("default", "elsewhere", 19530).await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn ensure_collection_reports_status() {
        let gateway = gateway(2);
        gateway.connect_default().await.unwrap();
        assert_eq!(gateway.ensure_collection("docs", 2).await.unwrap(), CollectionStatus::Created);
        assert_eq!(gateway.ensure_collection("docs", 2).await.unwrap(), CollectionStatus::Existing);
    }

    #[tokio::test]
    async fn non_finite_components_are_schema_errors() {
        let gateway = gateway(2);
        gateway.connect_default().await.unwrap();
        gateway.ensure_collection("docs", 2).await.unwrap();
        let err = gateway.insert("docs", &[f32::NAN, 1.0], "text").await.unwrap_err();
        assert!(err.is_schema());
    }

    #[tokio::test]
    async fn zero_top_k_returns_nothing() {
        let gateway = gateway(2);
        gateway.connect_default().await.unwrap();
        gateway.ensure_collection("docs", 2).await.unwrap();
        gateway.load("docs").await.unwrap();
        assert!(gateway.search("docs", &[1.0, 0.0], 0).await.unwrap().is_empty());
    }
}
