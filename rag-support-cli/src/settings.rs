//! Environment-derived settings for the command-line tools.
//!
//! Everything is read once at startup and turned into the library's config
//! structs; nothing below the binaries looks at the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rag_support::milvus::MilvusVectorStore;
use rag_support::ollama::{DEFAULT_BASE_URL, OllamaEmbeddingProvider, OllamaGenerationProvider};
use rag_support::{
    DistanceMetric, IngestConfig, InMemoryVectorStore, QueryConfig, StoreConfig, VectorStore,
    VectorStoreGateway,
};

/// Values read from the process environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `MILVUS_HOST`.
    pub milvus_host: String,
    /// `MILVUS_PORT`.
    pub milvus_port: u16,
    /// `MILVUS_ALIAS`, the connection alias registered with the gateway.
    pub milvus_alias: String,
    /// `MILVUS_TOKEN`; blank counts as unset.
    pub milvus_token: Option<String>,
    /// `RAG_COLLECTION`.
    pub collection: String,
    /// `RAG_METRIC`: `L2`, `IP` or `COSINE`.
    pub metric: DistanceMetric,
    /// `EMBEDDING_MODEL`, as known to Ollama.
    pub embedding_model: String,
    /// `EMBEDDING_DIM`; must match what the embedding model produces.
    pub embedding_dim: usize,
    /// `LLM_MODEL`, as known to Ollama.
    pub llm_model: String,
    /// `OLLAMA_BASE_URL`.
    pub ollama_base_url: String,
    /// `INGEST_DIR`, where pending documents are staged.
    pub ingest_dir: PathBuf,
    /// `PROCESSED_DIR`, where indexed documents are moved.
    pub processed_dir: PathBuf,
    /// `RAG_TOP_K`.
    pub top_k: usize,
    /// `RAG_MAX_ANSWER_CHARS`.
    pub max_answer_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            milvus_host: "localhost".to_string(),
            milvus_port: 19530,
            milvus_alias: "default".to_string(),
            milvus_token: None,
            collection: "rag_data".to_string(),
            metric: DistanceMetric::default(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            llm_model: "llama3".to_string(),
            ollama_base_url: DEFAULT_BASE_URL.to_string(),
            ingest_dir: PathBuf::from("./ingest"),
            processed_dir: PathBuf::from("./processed"),
            top_k: 4,
            max_answer_chars: 200,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => {
            raw.trim().parse().with_context(|| format!("invalid value for {key}: '{raw}'"))
        }
        None => Ok(default),
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        Ok(Self {
            milvus_host: text("MILVUS_HOST", defaults.milvus_host),
            milvus_port: parsed(&lookup, "MILVUS_PORT", defaults.milvus_port)?,
            milvus_alias: text("MILVUS_ALIAS", defaults.milvus_alias),
            milvus_token: lookup("MILVUS_TOKEN").filter(|t| !t.trim().is_empty()),
            collection: text("RAG_COLLECTION", defaults.collection),
            metric: parsed(&lookup, "RAG_METRIC", defaults.metric)?,
            embedding_model: text("EMBEDDING_MODEL", defaults.embedding_model),
            embedding_dim: parsed(&lookup, "EMBEDDING_DIM", defaults.embedding_dim)?,
            llm_model: text("LLM_MODEL", defaults.llm_model),
            ollama_base_url: text("OLLAMA_BASE_URL", defaults.ollama_base_url),
            ingest_dir: path("INGEST_DIR", defaults.ingest_dir),
            processed_dir: path("PROCESSED_DIR", defaults.processed_dir),
            top_k: parsed(&lookup, "RAG_TOP_K", defaults.top_k)?,
            max_answer_chars: parsed(&lookup, "RAG_MAX_ANSWER_CHARS", defaults.max_answer_chars)?,
        })
    }

    pub fn store_config(&self) -> Result<StoreConfig> {
        StoreConfig::builder()
            .alias(&self.milvus_alias)
            .host(&self.milvus_host)
            .port(self.milvus_port)
            .collection(&self.collection)
            .dimensions(self.embedding_dim)
            .metric(self.metric)
            .build()
            .context("invalid vector store settings")
    }

    pub fn ingest_config(&self, batch_size: usize) -> Result<IngestConfig> {
        IngestConfig::builder()
            .batch_size(batch_size)
            .staging_dir(&self.ingest_dir)
            .processed_dir(&self.processed_dir)
            .build()
            .context("invalid ingestion settings")
    }

    pub fn query_config(&self) -> Result<QueryConfig> {
        QueryConfig::builder()
            .top_k(self.top_k)
            .max_answer_chars(self.max_answer_chars)
            .build()
            .context("invalid query settings")
    }

    /// An unconnected Milvus store indexing with the configured metric.
    pub fn milvus_store(&self) -> MilvusVectorStore {
        let store = MilvusVectorStore::new().with_metric(self.metric);
        match &self.milvus_token {
            Some(token) => store.with_token(token),
            None => store,
        }
    }

    /// The Milvus store, or a process-local in-memory store.
    pub fn vector_store(&self, in_memory: bool) -> Arc<dyn VectorStore> {
        if in_memory {
            return Arc::new(InMemoryVectorStore::new());
        }
        Arc::new(self.milvus_store())
    }

    pub fn gateway(&self, in_memory: bool) -> Result<Arc<VectorStoreGateway>> {
        Ok(Arc::new(VectorStoreGateway::new(self.vector_store(in_memory), self.store_config()?)))
    }

    pub fn embedding_provider(&self) -> Arc<OllamaEmbeddingProvider> {
        Arc::new(OllamaEmbeddingProvider::new(
            &self.ollama_base_url,
            &self.embedding_model,
            self.embedding_dim,
        ))
    }

    pub fn generation_provider(&self) -> Arc<OllamaGenerationProvider> {
        Arc::new(OllamaGenerationProvider::new(&self.ollama_base_url, &self.llm_model))
    }
}
