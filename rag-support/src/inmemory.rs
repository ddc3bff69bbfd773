//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a [`VectorStore`] backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It mirrors the behavior the
//! orchestrators rely on from a real service: schemas are enforced at insert
//! time, and inserted records only become searchable after [`load`].
//! It is suitable for development, testing and single-process demos.
//!
//! [`load`]: VectorStore::load

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{IngestionRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::schema::{CollectionDescription, CollectionSchema, DistanceMetric};
use crate::vectorstore::{Endpoint, VectorStore};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct Collection {
    schema: CollectionSchema,
    records: Vec<IngestionRecord>,
    /// Number of leading records visible to search.
    visible: usize,
    loaded: bool,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    next_id: i64,
}

/// An in-memory vector store.
///
/// Records keep insertion order, which is also the order used to break score
/// ties in search results.
///
/// # Example
///
/// ```rust,ignore
/// use rag_support::{CollectionSchema, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", &CollectionSchema::rag(384, 65535)).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(name: &str) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("collection '{name}' does not exist"),
    }
}

fn check_vector(name: &str, schema: &CollectionSchema, vector: &[f32]) -> Result<()> {
    let expected = schema.dimensions();
    if vector.len() != expected {
        return Err(RagError::SchemaError {
            collection: name.to_string(),
            message: format!("expected {expected} dimensions, got {}", vector.len()),
        });
    }
    Ok(())
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    inner_product(a, b) / (norm_a * norm_b)
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::L2 => euclidean_distance(a, b),
        DistanceMetric::InnerProduct => inner_product(a, b),
        DistanceMetric::Cosine => cosine_similarity(a, b),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        debug!(backend = BACKEND, %endpoint, "connected");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.inner.read().await.collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.collections.contains_key(name) {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("collection '{name}' already exists"),
            });
        }
        inner.collections.insert(
            name.to_string(),
            Collection { schema: schema.clone(), records: Vec::new(), visible: 0, loaded: false },
        );
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let collection = inner.collections.get_mut(name).ok_or_else(|| missing(name))?;
        collection.visible = collection.records.len();
        collection.loaded = true;
        Ok(())
    }

    async fn insert(&self, name: &str, vector: &[f32], text: &str) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id + 1;
        let collection = inner.collections.get_mut(name).ok_or_else(|| missing(name))?;

        check_vector(name, &collection.schema, vector)?;
        let max_length = collection.schema.max_text_length();
        let length = text.chars().count();
        if length > max_length {
            return Err(RagError::SchemaError {
                collection: name.to_string(),
                message: format!("text length {length} exceeds max_length {max_length}"),
            });
        }

        collection.records.push(IngestionRecord {
            id,
            text: text.to_string(),
            embedding: vector.to_vec(),
        });
        inner.next_id = id;
        Ok(id)
    }

    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read().await;
        let collection = inner.collections.get(name).ok_or_else(|| missing(name))?;
        check_vector(name, &collection.schema, vector)?;
        if !collection.loaded {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("collection '{name}' is not loaded"),
            });
        }

        let mut scored: Vec<SearchResult> = collection.records[..collection.visible]
            .iter()
            .map(|record| SearchResult {
                id: record.id,
                text: record.text.clone(),
                score: score(metric, &record.embedding, vector),
            })
            .collect();

        // stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| {
            let ordering = a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal);
            if metric.ascending() { ordering } else { ordering.reverse() }
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, name: &str) -> Result<u64> {
        let inner = self.inner.read().await;
        let collection = inner.collections.get(name).ok_or_else(|| missing(name))?;
        Ok(collection.records.len() as u64)
    }

    async fn describe(&self, name: &str) -> Result<CollectionDescription> {
        let inner = self.inner.read().await;
        let collection = inner.collections.get(name).ok_or_else(|| missing(name))?;
        Ok(CollectionDescription {
            name: name.to_string(),
            schema: collection.schema.clone(),
            row_count: collection.records.len() as u64,
            loaded: collection.loaded,
        })
    }

    async fn drop_collection(&self, name: &str) -> Result<bool> {
        Ok(self.inner.write().await.collections.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(dim: usize) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", &CollectionSchema::rag(dim, 16)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn records_are_searchable_only_after_load() {
        let store = store_with(2).await;
        store.load("docs").await.unwrap();
        store.insert("docs", &[1.0, 0.0], "east").await.unwrap();

        let before = store.search("docs", &[1.0, 0.0], 5, DistanceMetric::Cosine).await.unwrap();
        assert!(before.is_empty());
        assert_eq!(store.count("docs").await.unwrap(), 1);

        store.load("docs").await.unwrap();
        let after = store.search("docs", &[1.0, 0.0], 5, DistanceMetric::Cosine).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].text, "east");
    }

    #[tokio::test]
    async fn search_on_unloaded_collection_fails() {
        let store = store_with(2).await;
        let err = store.search("docs", &[1.0, 0.0], 1, DistanceMetric::L2).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }

    #[tokio::test]
    async fn insert_enforces_schema() {
        let store = store_with(3).await;
        let err = store.insert("docs", &[1.0, 2.0], "short").await.unwrap_err();
        assert!(err.is_schema());

        let err = store.insert("docs", &[1.0, 2.0, 3.0], &"x".repeat(17)).await.unwrap_err();
        assert!(err.is_schema());
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn keys_are_unique_and_increasing() {
        let store = store_with(1).await;
        let a = store.insert("docs", &[1.0], "a").await.unwrap();
        let b = store.insert("docs", &[2.0], "b").await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn l2_ranks_nearest_first_and_ties_keep_insertion_order() {
        let store = store_with(1).await;
        store.insert("docs", &[5.0], "far").await.unwrap();
        store.insert("docs", &[1.0], "near-first").await.unwrap();
        store.insert("docs", &[1.0], "near-second").await.unwrap();
        store.load("docs").await.unwrap();

        let results = store.search("docs", &[0.0], 3, DistanceMetric::L2).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["near-first", "near-second", "far"]);
    }

    #[tokio::test]
    async fn drop_reports_whether_anything_was_removed() {
        let store = store_with(1).await;
        assert!(store.drop_collection("docs").await.unwrap());
        assert!(!store.drop_collection("docs").await.unwrap());
        assert!(store.list_collections().await.unwrap().is_empty());
    }
}
