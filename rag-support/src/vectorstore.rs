//! Vector store trait: the service boundary of an external vector database.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;
use crate::schema::{CollectionDescription, CollectionSchema, DistanceMetric};

/// Network address of a vector store service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A vector database reached over the network.
///
/// Implementations manage named collections of `(vector, text)` records with
/// store-assigned integer keys. They are driven by
/// [`VectorStoreGateway`](crate::gateway::VectorStoreGateway), which owns
/// connection aliases and schema decisions.
///
/// # Example
///
/// ```rust,ignore
/// use rag_support::{CollectionSchema, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", &CollectionSchema::rag(768, 65535)).await?;
/// let id = store.insert("docs", &embedding, "some text").await?;
/// store.load("docs").await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in errors and logs.
    fn backend(&self) -> &str;

    /// Open (or verify) a connection to the service.
    async fn connect(&self, endpoint: &Endpoint) -> Result<()>;

    /// List collection names.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Whether a collection exists.
    async fn has_collection(&self, name: &str) -> Result<bool>;

    /// Create a collection with the given schema.
    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()>;

    /// Make all persisted records of a collection visible to search.
    async fn load(&self, name: &str) -> Result<()>;

    /// Append a record and return the assigned primary key.
    async fn insert(&self, name: &str, vector: &[f32], text: &str) -> Result<i64>;

    /// Return the `top_k` nearest loaded records under `metric`.
    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<SearchResult>>;

    /// Number of persisted records.
    async fn count(&self, name: &str) -> Result<u64>;

    /// Describe a collection.
    async fn describe(&self, name: &str) -> Result<CollectionDescription>;

    /// Drop a collection. Returns `false` if it did not exist.
    async fn drop_collection(&self, name: &str) -> Result<bool>;
}
