//! Retrieval-augmented generation support pipeline.
//!
//! This crate provides:
//! - A batched ingestion orchestrator that moves documents from a staging
//!   directory into a vector collection, isolating failures per document
//! - A vector store gateway that owns connections and the collection schema
//! - A query orchestrator that retrieves context, generates an answer and
//!   post-processes it through a small stage graph
//! - Provider traits for embedding and generation models
//!
//! Optional backends:
//! - `milvus`: Milvus REST v2 vector store
//! - `ollama`: Ollama embedding and generation providers

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod ingest;
pub mod inmemory;
pub mod query;
pub mod response;
pub mod schema;
pub mod source;
pub mod vectorstore;

#[cfg(feature = "milvus")]
pub mod milvus;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_ANSWER_CHARS, IngestConfig, QueryConfig, StoreConfig,
    parse_batch_size,
};
pub use document::{Document, DocumentRef, IngestionRecord, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gateway::VectorStoreGateway;
pub use generation::GenerationProvider;
pub use ingest::{DocumentFailure, IngestionOrchestrator, IngestionOutcome, IngestionTally};
pub use inmemory::InMemoryVectorStore;
pub use query::{QueryOrchestrator, QueryOrchestratorBuilder};
pub use response::{LengthLimit, QueryState, ResponsePipeline, ResponseStage};
pub use schema::{CollectionDescription, CollectionSchema, CollectionStatus, DistanceMetric};
pub use source::{DirectorySource, DocumentSource};
pub use vectorstore::{Endpoint, VectorStore};
