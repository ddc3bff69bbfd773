//! Query orchestrator: embed → retrieve → generate → post-process.
//!
//! Errors from any step reach the caller unchanged, with their original
//! [`RagError`] variant. Nothing is retried here; retry policy belongs to the
//! caller or to the provider adapters.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::QueryConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::gateway::VectorStoreGateway;
use crate::generation::GenerationProvider;
use crate::response::{QueryState, ResponsePipeline};

/// Answers questions from the indexed collection.
pub struct QueryOrchestrator {
    config: QueryConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generation_provider: Arc<dyn GenerationProvider>,
    gateway: Arc<VectorStoreGateway>,
    response: ResponsePipeline,
}

impl QueryOrchestrator {
    /// Create a new [`QueryOrchestratorBuilder`].
    pub fn builder() -> QueryOrchestratorBuilder {
        QueryOrchestratorBuilder::default()
    }

    /// Return a reference to the query configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Return a reference to the response pipeline.
    pub fn response_pipeline(&self) -> &ResponsePipeline {
        &self.response
    }

    /// Connect the gateway and load the collection for search.
    pub async fn prepare(&self) -> Result<()> {
        self.gateway.connect_default().await?;
        let collection = &self.gateway.config().collection;
        self.gateway.load(collection).await.inspect_err(|e| {
            error!(collection = %collection, error = %e, "failed to load collection");
        })?;
        info!(
            collection = %collection,
            embedding_model = self.embedding_provider.model_name(),
            generation_model = self.generation_provider.model_name(),
            "query path ready"
        );
        Ok(())
    }

    /// Embed the question and fetch the best-matching records.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(question).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let collection = &self.gateway.config().collection;
        let results = self
            .gateway
            .search(collection, &query_embedding, self.config.top_k)
            .await
            .inspect_err(|e| {
                error!(collection = %collection, error = %e, "vector store search failed");
            })?;

        debug!(result_count = results.len(), "retrieved context");
        Ok(results)
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] for an empty question and
    /// [`RagError::GenerationError`] for an empty generated answer; any
    /// embedding, store or generation error is returned as is.
    pub async fn answer(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(RagError::PipelineError("question must not be empty".to_string()));
        }

        let context = self.retrieve(question).await?;

        let raw = self.generation_provider.generate(question, &context).await.inspect_err(|e| {
            error!(error = %e, "generation failed");
        })?;
        if raw.trim().is_empty() {
            error!(model = self.generation_provider.model_name(), "generation returned no text");
            return Err(RagError::GenerationError {
                provider: self.generation_provider.model_name().to_string(),
                message: "model returned an empty answer".to_string(),
            });
        }

        let state = self.response.run(QueryState::new(question, raw));
        let answer_chars = state.answer.chars().count();
        info!(context_count = context.len(), answer_chars, "answered");
        Ok(state.answer)
    }
}

/// Builder for constructing a [`QueryOrchestrator`].
///
/// All fields except `config` and `response_pipeline` are required. Without a
/// response pipeline, the answer is limited to `config.max_answer_chars`.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = QueryOrchestrator::builder()
///     .config(QueryConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .generation_provider(Arc::new(llm))
///     .gateway(gateway)
///     .build()?;
/// ```
#[derive(Default)]
pub struct QueryOrchestratorBuilder {
    config: Option<QueryConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    gateway: Option<Arc<VectorStoreGateway>>,
    response: Option<ResponsePipeline>,
}

impl QueryOrchestratorBuilder {
    /// Set the query configuration.
    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Set the vector store gateway.
    pub fn gateway(mut self, gateway: Arc<VectorStoreGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Replace the default response pipeline.
    pub fn response_pipeline(mut self, pipeline: ResponsePipeline) -> Self {
        self.response = Some(pipeline);
        self
    }

    /// Build the [`QueryOrchestrator`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<QueryOrchestrator> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::ConfigError("generation_provider is required".to_string()))?;
        let gateway =
            self.gateway.ok_or_else(|| RagError::ConfigError("gateway is required".to_string()))?;
        let response = self
            .response
            .unwrap_or_else(|| ResponsePipeline::with_length_limit(config.max_answer_chars));

        Ok(QueryOrchestrator { config, embedding_provider, generation_provider, gateway, response })
    }
}
