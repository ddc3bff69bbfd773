//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rag_support::{
    CollectionDescription, CollectionSchema, DistanceMetric, EmbeddingProvider, Endpoint,
    GenerationProvider, InMemoryVectorStore, RagError, SearchResult, VectorStore,
};

/// Deterministic hash-based embeddings; fails on selected texts.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    fail_on: HashSet<String>,
    seen: Mutex<Vec<String>>,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, fail_on: HashSet::new(), seen: Mutex::new(Vec::new()) }
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.insert(text.to_string());
        self
    }

    /// Texts embedded so far, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> rag_support::Result<Vec<f32>> {
        self.seen.lock().unwrap().push(text.to_string());
        if self.fail_on.contains(text) {
            return Err(RagError::EmbeddingError {
                provider: "mock".into(),
                message: format!("refusing to embed '{text}'"),
            });
        }

        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            let h = hash.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let h = h ^ (h >> 29);
            *v = (h % 2000) as f32 / 1000.0 - 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Returns a canned answer and records the context it was given.
pub struct MockGenerationProvider {
    answer: Result<String, String>,
    calls: Mutex<Vec<(String, Vec<SearchResult>)>>,
}

impl MockGenerationProvider {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self { answer: Ok(answer.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { answer: Err(message.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(String, Vec<SearchResult>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        question: &str,
        context: &[SearchResult],
    ) -> rag_support::Result<String> {
        self.calls.lock().unwrap().push((question.to_string(), context.to_vec()));
        self.answer.clone().map_err(|message| RagError::GenerationError {
            provider: "mock".into(),
            message,
        })
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

/// An [`InMemoryVectorStore`] that counts connection attempts and can refuse them.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryVectorStore,
    connects: AtomicUsize,
    refuse: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self { refuse: true, ..Self::default() }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    fn backend(&self) -> &str {
        "counting"
    }

    async fn connect(&self, endpoint: &Endpoint) -> rag_support::Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(RagError::ConnectionError {
                backend: "counting".into(),
                message: format!("{endpoint} refused the connection"),
            });
        }
        self.inner.connect(endpoint).await
    }

    async fn list_collections(&self) -> rag_support::Result<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn has_collection(&self, name: &str) -> rag_support::Result<bool> {
        self.inner.has_collection(name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> rag_support::Result<()> {
        self.inner.create_collection(name, schema).await
    }

    async fn load(&self, name: &str) -> rag_support::Result<()> {
        self.inner.load(name).await
    }

    async fn insert(&self, name: &str, vector: &[f32], text: &str) -> rag_support::Result<i64> {
        self.inner.insert(name, vector, text).await
    }

    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> rag_support::Result<Vec<SearchResult>> {
        self.inner.search(name, vector, top_k, metric).await
    }

    async fn count(&self, name: &str) -> rag_support::Result<u64> {
        self.inner.count(name).await
    }

    async fn describe(&self, name: &str) -> rag_support::Result<CollectionDescription> {
        self.inner.describe(name).await
    }

    async fn drop_collection(&self, name: &str) -> rag_support::Result<bool> {
        self.inner.drop_collection(name).await
    }
}
