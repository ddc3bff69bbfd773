//! Gateway behavior over the in-memory store, plus search ordering properties.

mod common;

use std::sync::Arc;

use common::CountingStore;
use proptest::prelude::*;
use rag_support::schema::FieldType;
use rag_support::{
    CollectionStatus, DistanceMetric, InMemoryVectorStore, StoreConfig, VectorStoreGateway,
};

const DIM: usize = 4;

fn gateway_over(store: Arc<CountingStore>, metric: DistanceMetric) -> VectorStoreGateway {
    let config = StoreConfig::builder().dimensions(DIM).metric(metric).build().unwrap();
    VectorStoreGateway::new(store, config)
}

async fn connected() -> (Arc<CountingStore>, VectorStoreGateway) {
    let store = Arc::new(CountingStore::new());
    let gateway = gateway_over(store.clone(), DistanceMetric::Cosine);
    gateway.connect_default().await.unwrap();
    (store, gateway)
}

#[tokio::test]
async fn connecting_twice_reuses_the_connection() {
    let (store, gateway) = connected().await;

    gateway.connect("default", "localhost", 19530).await.unwrap();
    gateway.connect_default().await.unwrap();

    assert_eq!(store.connects(), 1);
    assert!(gateway.is_connected().await);
}

#[tokio::test]
async fn distinct_aliases_open_distinct_connections() {
    let (store, gateway) = connected().await;

    gateway.connect("replica", "replica.internal", 19530).await.unwrap();

    assert_eq!(store.connects(), 2);
}

#[tokio::test]
async fn unreachable_store_is_a_connection_error() {
    let store = Arc::new(CountingStore::unreachable());
    let gateway = gateway_over(store, DistanceMetric::Cosine);

    let err = gateway.connect_default().await.unwrap_err();

    assert!(err.is_connection());
    assert!(!gateway.is_connected().await);
}

#[tokio::test]
async fn ensuring_a_collection_twice_creates_it_once() {
    let (_, gateway) = connected().await;

    let first = gateway.ensure_collection("rag_data", DIM).await.unwrap();
    let second = gateway.ensure_collection("rag_data", DIM).await.unwrap();

    assert_eq!(first, CollectionStatus::Created);
    assert_eq!(second, CollectionStatus::Existing);

    assert_eq!(gateway.list_collections().await.unwrap(), ["rag_data"]);
}

#[tokio::test]
async fn wrong_width_is_rejected_before_the_store() {
    let (_, gateway) = connected().await;
    gateway.ensure_collection("rag_data", DIM).await.unwrap();

    let err = gateway.insert("rag_data", &[0.1, 0.2, 0.3], "too narrow").await.unwrap_err();

    assert!(err.is_schema());
    assert!(err.to_string().contains("expected 4 dimensions, got 3"));
    assert_eq!(gateway.count("rag_data").await.unwrap(), 0);
}

#[tokio::test]
async fn collections_created_with_other_widths_accept_their_own_vectors() {
    let (_, gateway) = connected().await;
    gateway.ensure_collection("small", 2).await.unwrap();
    gateway.load("small").await.unwrap();

    let id = gateway.insert("small", &[1.0, 0.0], "narrow").await.unwrap();
    let err = gateway.insert("small", &[1.0, 0.0, 0.0, 0.0], "configured").await.unwrap_err();
    assert!(err.to_string().contains("expected 2 dimensions, got 4"));

    gateway.load("small").await.unwrap();
    let results = gateway.search("small", &[1.0, 0.0], 1).await.unwrap();
    assert_eq!(results[0].id, id);
    assert_eq!(gateway.count("small").await.unwrap(), 1);
}

#[tokio::test]
async fn a_dropped_collection_can_be_recreated_at_the_configured_width() {
    let (_, gateway) = connected().await;
    gateway.ensure_collection("docs", 2).await.unwrap();
    gateway.drop("docs").await.unwrap();
    gateway.create_collection("docs").await.unwrap();

    gateway.insert("docs", &[0.5, 0.5, 0.5, 0.5], "wide").await.unwrap();
    assert_eq!(gateway.count("docs").await.unwrap(), 1);
}

#[tokio::test]
async fn oversized_text_is_rejected() {
    let config = StoreConfig::builder().dimensions(DIM).max_text_length(8).build().unwrap();
    let gateway = VectorStoreGateway::new(Arc::new(InMemoryVectorStore::new()), config);
    gateway.connect_default().await.unwrap();
    gateway.ensure_collection("rag_data", DIM).await.unwrap();

    // eight characters, more than eight bytes
    gateway.insert("rag_data", &[1.0, 0.0, 0.0, 0.0], "ééééééé!").await.unwrap();
    let err = gateway.insert("rag_data", &[1.0, 0.0, 0.0, 0.0], "nine char").await.unwrap_err();

    assert!(err.is_schema());
    assert_eq!(gateway.count("rag_data").await.unwrap(), 1);
}

#[tokio::test]
async fn inserts_become_searchable_after_load() {
    let (_, gateway) = connected().await;
    gateway.ensure_collection("rag_data", DIM).await.unwrap();
    gateway.load("rag_data").await.unwrap();

    let first = gateway.insert("rag_data", &[1.0, 0.0, 0.0, 0.0], "north").await.unwrap();
    let second = gateway.insert("rag_data", &[0.0, 1.0, 0.0, 0.0], "east").await.unwrap();
    assert!(second > first);

    let query = [1.0, 0.1, 0.0, 0.0];
    assert!(gateway.search("rag_data", &query, 5).await.unwrap().is_empty());

    gateway.load("rag_data").await.unwrap();
    let results = gateway.search("rag_data", &query, 5).await.unwrap();
    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["north", "east"]);
    assert_eq!(results[0].id, first);
}

#[tokio::test]
async fn describe_reports_schema_and_rows() {
    let (_, gateway) = connected().await;
    gateway.create_collection("rag_data").await.unwrap();
    gateway.insert("rag_data", &[0.5, 0.5, 0.5, 0.5], "row").await.unwrap();
    gateway.load("rag_data").await.unwrap();

    let description = gateway.describe("rag_data").await.unwrap();

    assert_eq!(description.name, "rag_data");
    assert_eq!(description.row_count, 1);
    assert!(description.loaded);
    assert_eq!(description.schema.dimensions(), DIM);
    assert_eq!(description.schema.vector.data_type, FieldType::FloatVector);
    assert!(description.schema.primary_key.auto_id);
}

#[tokio::test]
async fn drop_removes_the_collection() {
    let (_, gateway) = connected().await;
    gateway.create_collection("rag_data").await.unwrap();

    assert!(gateway.drop("rag_data").await.unwrap());
    assert!(!gateway.drop("rag_data").await.unwrap());
    assert!(!gateway.has_collection("rag_data").await.unwrap());
}

#[tokio::test]
async fn admin_operations_require_a_connection() {
    let gateway = gateway_over(Arc::new(CountingStore::new()), DistanceMetric::Cosine);

    assert!(gateway.list_collections().await.unwrap_err().is_connection());
    assert!(gateway.count("rag_data").await.unwrap_err().is_connection());
    assert!(gateway.drop("rag_data").await.unwrap_err().is_connection());
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-3 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// For any set of loaded records, search returns at most `top_k` results
/// ordered best-first under the configured metric.
mod prop_search_ordering {
    use super::*;

    fn run_search(
        metric: DistanceMetric,
        records: &[Vec<f32>],
        query: &[f32],
        top_k: usize,
    ) -> Vec<rag_support::SearchResult> {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let gateway = gateway_over(Arc::new(CountingStore::new()), metric);
            gateway.connect_default().await.unwrap();
            gateway.ensure_collection("rag_data", DIM).await.unwrap();
            for (i, embedding) in records.iter().enumerate() {
                gateway.insert("rag_data", embedding, &format!("record {i}")).await.unwrap();
            }
            gateway.load("rag_data").await.unwrap();
            gateway.search("rag_data", query, top_k).await.unwrap()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn cosine_results_descend_and_respect_top_k(
            records in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let results = run_search(DistanceMetric::Cosine, &records, &query, top_k);

            prop_assert_eq!(results.len(), top_k.min(records.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            for result in &results {
                prop_assert!(result.score >= -1.01 && result.score <= 1.01);
            }
        }

        #[test]
        fn l2_results_ascend(
            records in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let results = run_search(DistanceMetric::L2, &records, &query, top_k);

            prop_assert_eq!(results.len(), top_k.min(records.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score <= pair[1].score);
            }
        }
    }
}
