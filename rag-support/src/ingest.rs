//! Batched ingestion orchestrator.
//!
//! One call to [`IngestionOrchestrator::run`] walks the state machine
//!
//! ```text
//! SELECT_BATCH → CONNECT_STORE → ENSURE_SCHEMA
//!   → FOR_EACH(READ → EMBED → INDEX → ARCHIVE) → REPORT
//! ```
//!
//! Documents are processed strictly one at a time. A failure anywhere in one
//! document's steps is logged, counted, and the loop moves on to the next
//! document.
//!
//! A document is archived only after its record was inserted. If the process
//! dies between the insert and the archive, the document is still pending and
//! the next run inserts it again, so delivery is at-least-once and duplicate
//! records are possible. Exactly-once would need the archive and the insert to
//! commit together, which the store boundary does not offer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::document::DocumentRef;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::gateway::VectorStoreGateway;
use crate::source::DocumentSource;

/// A document that failed during a run, with the cause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Identifier of the failed document.
    pub document: String,
    /// Rendered error.
    pub cause: String,
}

/// Success and failure counters for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionTally {
    /// Number of documents attempted.
    pub attempted: usize,
    /// Documents indexed and archived.
    pub succeeded: usize,
    /// Documents that failed at any step.
    pub failed: usize,
    /// One entry per failed document, in processing order.
    pub failures: Vec<DocumentFailure>,
}

impl IngestionTally {
    fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn record_failure(&mut self, document: &DocumentRef, cause: String) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(DocumentFailure { document: document.id.clone(), cause });
    }
}

/// Terminal state of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// The staging location was empty; no connection was attempted.
    NothingToDo,
    /// The store could not be connected or prepared; no document was processed.
    StoreUnavailable {
        /// Rendered error.
        cause: String,
    },
    /// The batch was processed.
    Completed(IngestionTally),
}

impl IngestionOutcome {
    /// The tally, if the batch was processed.
    pub fn tally(&self) -> Option<&IngestionTally> {
        match self {
            Self::Completed(tally) => Some(tally),
            _ => None,
        }
    }
}

/// Drives documents from a [`DocumentSource`] into the vector store.
pub struct IngestionOrchestrator {
    config: IngestConfig,
    source: Arc<dyn DocumentSource>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    gateway: Arc<VectorStoreGateway>,
}

impl IngestionOrchestrator {
    /// Create an orchestrator from its collaborators.
    pub fn new(
        config: IngestConfig,
        source: Arc<dyn DocumentSource>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        gateway: Arc<VectorStoreGateway>,
    ) -> Self {
        Self { config, source, embedding_provider, gateway }
    }

    /// Return a reference to the ingestion configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pending documents cannot be listed. Store
    /// failures end in [`IngestionOutcome::StoreUnavailable`]; per-document
    /// failures are counted in the tally.
    pub async fn run(&self) -> Result<IngestionOutcome> {
        // SELECT_BATCH
        let mut batch = self.source.list_pending()?;
        batch.truncate(self.config.batch_size);
        if batch.is_empty() {
            info!("all documents are ingested");
            return Ok(IngestionOutcome::NothingToDo);
        }
        info!(batch_size = batch.len(), "selected documents for ingestion");

        // CONNECT_STORE / ENSURE_SCHEMA
        let collection = self.gateway.config().collection.clone();
        if let Err(e) = self.prepare_store(&collection).await {
            error!(collection = %collection, error = %e, "vector store unavailable");
            return Ok(IngestionOutcome::StoreUnavailable { cause: e.to_string() });
        }

        // FOR_EACH
        let mut tally = IngestionTally::default();
        for document in &batch {
            match self.ingest_document(&collection, document).await {
                Ok(id) => {
                    info!(document.id = %document.id, record.id = id, "ingested document");
                    tally.record_success();
                }
                Err(e) => {
                    error!(document.id = %document.id, error = %e, "failed to ingest document");
                    tally.record_failure(document, e.to_string());
                }
            }
        }

        // REPORT
        self.log_entity_count(&collection).await;
        info!(
            attempted = tally.attempted,
            succeeded = tally.succeeded,
            failed = tally.failed,
            "ingestion run completed"
        );
        Ok(IngestionOutcome::Completed(tally))
    }

    async fn prepare_store(&self, collection: &str) -> Result<()> {
        self.gateway.connect_default().await?;

        let dimensions = self.gateway.config().dimensions;
        if self.embedding_provider.dimensions() != dimensions {
            warn!(
                model = self.embedding_provider.model_name(),
                provider_dimensions = self.embedding_provider.dimensions(),
                schema_dimensions = dimensions,
                "embedding dimensions differ from the collection schema; inserts will fail"
            );
        }

        self.gateway.ensure_collection(collection, dimensions).await?;
        Ok(())
    }

    /// READ → EMBED → INDEX → ARCHIVE for one document.
    async fn ingest_document(&self, collection: &str, document: &DocumentRef) -> Result<i64> {
        let content = self.source.read(document)?;
        let embedding = self.embedding_provider.embed(&content.text).await?;
        let id = self.gateway.insert(collection, &embedding, &content.text).await?;
        // must come last: a pending document is retried on the next run
        self.source.archive(document)?;
        Ok(id)
    }

    async fn log_entity_count(&self, collection: &str) {
        let counted = async {
            self.gateway.load(collection).await?;
            self.gateway.count(collection).await
        };
        match counted.await {
            Ok(entities) => info!(collection, entities, "collection entity count"),
            Err(e) => warn!(collection, error = %e, "could not refresh collection after ingestion"),
        }
    }
}
