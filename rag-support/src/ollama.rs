//! Ollama embedding and generation providers.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{GenerationProvider, render_context};

/// The default local Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const PROVIDER: &str = "Ollama";

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// POST `body`; a non-success status becomes a message carrying the server's error text.
async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> std::result::Result<reqwest::Response, String> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
        return Err(format!("API returned {status}: {detail}"));
    }
    Ok(response)
}

/// An [`EmbeddingProvider`] backed by a local Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use rag_support::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("http://localhost:11434", "nomic-embed-text", 768);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model`, whose vectors have `dimensions` components.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
        }
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn error(&self, message: impl Into<String>) -> RagError {
        RagError::EmbeddingError {
            provider: format!("{PROVIDER}/{}", self.model),
            message: message.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding text");

        let url = endpoint(&self.base_url, "api/embeddings");
        let request = EmbeddingRequest { model: &self.model, prompt: text };
        let response = post_json(&self.client, &url, &request).await.map_err(|message| {
            error!(provider = PROVIDER, model = %self.model, error = %message, "embedding failed");
            self.error(message)
        })?;

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;

        if parsed.embedding.len() != self.dimensions {
            return Err(self.error(format!(
                "model returned {} dimensions, expected {}",
                parsed.embedding.len(),
                self.dimensions
            )));
        }
        Ok(parsed.embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`GenerationProvider`] backed by a local Ollama server.
pub struct OllamaGenerationProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerationProvider {
    /// Create a provider for `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), model: model.into() }
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn error(&self, message: impl Into<String>) -> RagError {
        RagError::GenerationError {
            provider: format!("{PROVIDER}/{}", self.model),
            message: message.into(),
        }
    }
}

/// Build the single-turn prompt sent to the model.
pub fn build_prompt(question: &str, context: &[SearchResult]) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: ",
        render_context(context)
    )
}

#[async_trait]
impl GenerationProvider for OllamaGenerationProvider {
    async fn generate(&self, question: &str, context: &[SearchResult]) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, context = context.len(), "generating");

        let prompt = build_prompt(question, context);
        let url = endpoint(&self.base_url, "api/generate");
        let request = GenerateRequest { model: &self.model, prompt: &prompt, stream: false };
        let response = post_json(&self.client, &url, &request).await.map_err(|message| {
            error!(provider = PROVIDER, model = %self.model, error = %message, "generation failed");
            self.error(message)
        })?;

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;
        Ok(parsed.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
