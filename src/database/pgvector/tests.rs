use super::layout::{
    DOCUMENT_LAYOUTS, EMBEDDING_LAYOUTS, MODEL_LAYOUTS, ModelRow, exhausted, model_name,
};
use super::*;
use crate::AdapterError;
use crate::embeddings::HashedEmbedder;
use serde_json::json;

const DIM: u32 = 16;

fn memory_store() -> MemoryVectorStore {
    MemoryVectorStore::new(VectorTables::default(), "langflow")
}

fn index(store: MemoryVectorStore) -> VectorIndex<MemoryVectorStore, HashedEmbedder> {
    VectorIndex::new(
        store,
        HashedEmbedder::new(DIM as usize).expect("embedder should build"),
        DIM,
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn strings(columns: &[&str]) -> Vec<String> {
    let mut owned: Vec<String> = columns.iter().map(|c| (*c).to_string()).collect();
    owned.sort();
    owned
}

#[test]
fn model_naming() {
    assert_eq!(model_name(384), "langflow-384d");
    let row = ModelRow { dimension: 384 };
    assert_eq!(
        row.value("notes").and_then(|v| v.as_text().map(str::to_string)),
        Some("Langflow 384D embeddings".to_string())
    );
}

#[test]
fn exhausted_error_names_table_and_layouts() {
    let err = exhausted("documents", &DOCUMENT_LAYOUTS);
    match err {
        AdapterError::SchemaMismatch { table, tried } => {
            assert_eq!(table, "documents");
            assert_eq!(tried, "(source, content, metadata), (source, content), (content)");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn layouts_go_from_richest_to_minimal() {
    for layouts in [&DOCUMENT_LAYOUTS[..], &EMBEDDING_LAYOUTS[..], &MODEL_LAYOUTS[..]] {
        let widths: Vec<usize> = layouts.iter().map(|l| l.columns.len()).collect();
        assert!(widths.windows(2).all(|w| w[0] > w[1]));
    }
}

#[test]
fn cosine_distance_bounds() {
    assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    assert!((cosine_distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn batch_checks_reject_mismatches() {
    let docs = vec![NewVectorDocument::new("a")];
    assert!(matches!(
        check_batch(&docs, &[], DIM),
        Err(AdapterError::MalformedInput(_))
    ));
    assert!(matches!(
        check_batch(&docs, &[vec![0.0; 3]], DIM),
        Err(AdapterError::MalformedInput(_))
    ));
    assert!(check_batch(&docs, &[vec![0.0; DIM as usize]], DIM).is_ok());
}

#[tokio::test]
async fn full_schema_uses_richest_layouts() -> crate::Result<()> {
    let index = index(memory_store());
    let id = index
        .store_structured(object(json!({"title": "Hello", "code": "print(1)"})))
        .await?;

    assert_eq!(
        index.store().document_columns(id),
        Some(strings(&["content", "metadata", "source"]))
    );
    assert_eq!(
        index.store().embedding_columns(id),
        Some(strings(&["document_id", "embedding", "model_id"]))
    );

    let listed = index.list(10).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "Title: Hello | Code: print(1)");
    assert_eq!(listed[0].metadata.get("title"), Some(&json!("Hello")));
    Ok(())
}

#[tokio::test]
async fn missing_metadata_column_falls_back_to_source_and_content() -> crate::Result<()> {
    let store = memory_store().with_document_columns(&["id", "source", "content"]);
    let index = index(store);
    let id = index.store_structured(object(json!({"title": "Fallback"}))).await?;

    assert_eq!(
        index.store().document_columns(id),
        Some(strings(&["content", "source"]))
    );
    // metadata is not persisted, so it reads back empty
    let listed = index.list(1).await?;
    assert!(listed[0].metadata.is_empty());
    Ok(())
}

#[tokio::test]
async fn content_only_documents_and_no_model_column() -> crate::Result<()> {
    let store = memory_store()
        .with_document_columns(&["id", "content"])
        .with_embedding_columns(&["id", "document_id", "embedding"]);
    let index = index(store);
    let id = index.store_structured(object(json!({"title": "Minimal"}))).await?;

    assert_eq!(index.store().document_columns(id), Some(strings(&["content"])));
    assert_eq!(
        index.store().embedding_columns(id),
        Some(strings(&["document_id", "embedding"]))
    );
    Ok(())
}

#[tokio::test]
async fn no_matching_layout_is_schema_mismatch() {
    let store = memory_store().with_document_columns(&["id", "body"]);
    let index = index(store);

    let err = index
        .store_structured(object(json!({"title": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::SchemaMismatch { ref table, .. } if table == "documents"));
    assert_eq!(index.store().document_count(), 0);
    assert_eq!(index.store().model_count(), 0);
}

#[tokio::test]
async fn failed_embedding_rolls_back_whole_batch() {
    let store = memory_store().failing_embeddings_after(1);
    let index = index(store);

    let docs = vec![NewVectorDocument::new("first"), NewVectorDocument::new("second")];
    let err = index.add(&docs).await.unwrap_err();

    assert!(matches!(err, AdapterError::Database(_)));
    assert_eq!(index.store().document_count(), 0);
    assert_eq!(index.store().count_embeddings().await.unwrap(), 0);
    assert_eq!(index.store().model_count(), 0);
}

#[tokio::test]
async fn model_is_created_once_per_dimension() -> crate::Result<()> {
    let store = memory_store();
    let first = store.ensure_model(384).await?;
    let second = store.ensure_model(384).await?;
    let other = store.ensure_model(768).await?;

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(store.model_count(), 2);
    Ok(())
}

#[tokio::test]
async fn concurrently_created_model_is_reused() -> crate::Result<()> {
    let store = memory_store();
    let unrelated = store.ensure_model(768).await?;

    let store = store.with_concurrent_model_insert();
    let id = store.ensure_model(384).await?;

    assert_ne!(id, unrelated);
    assert_eq!(store.model_count(), 2);
    assert_eq!(store.ensure_model(384).await?, id);
    assert_eq!(store.model_count(), 2);
    Ok(())
}

#[tokio::test]
async fn write_after_concurrent_model_insert_keeps_one_model() -> crate::Result<()> {
    let index = index(memory_store().with_concurrent_model_insert());
    index.add(&[NewVectorDocument::new("racing")]).await?;
    index.add(&[NewVectorDocument::new("again")]).await?;

    assert_eq!(index.store().model_count(), 1);
    assert_eq!(index.store().count_embeddings().await?, 2);
    Ok(())
}

#[tokio::test]
async fn model_table_without_dimension_uses_name_only() -> crate::Result<()> {
    let store = memory_store().with_model_columns(&["id", "name"]);
    let id = store.ensure_model(DIM).await?;
    assert_eq!(store.ensure_model(DIM).await?, id);
    Ok(())
}

#[tokio::test]
async fn repeated_stores_share_one_model() -> crate::Result<()> {
    let index = index(memory_store());
    index.add(&[NewVectorDocument::new("one")]).await?;
    index.add(&[NewVectorDocument::new("two")]).await?;

    assert_eq!(index.store().model_count(), 1);
    assert_eq!(index.store().count_embeddings().await?, 2);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_no_op() -> crate::Result<()> {
    let index = index(memory_store());
    assert!(index.add(&[]).await?.is_empty());
    assert_eq!(index.store().model_count(), 0);
    Ok(())
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let store = memory_store();
    let err = store
        .add_documents(&[NewVectorDocument::new("x")], &[vec![1.0; 3]], DIM)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::MalformedInput(_)));
    assert_eq!(store.document_count(), 0);
}

#[tokio::test]
async fn search_on_empty_store_is_not_populated() {
    let index = index(memory_store());
    let err = index.similarity_search("anything", 4).await.unwrap_err();

    assert!(matches!(err, AdapterError::NotPopulated { ref table } if table == "embeddings_d384"));
    assert_eq!(err.to_string(), "No embeddings found in embeddings_d384");
}

#[tokio::test]
async fn zero_k_returns_nothing_even_when_empty() -> crate::Result<()> {
    let index = index(memory_store());
    assert!(index.similarity_search("anything", 0).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn exact_match_ranks_first_with_zero_distance() -> crate::Result<()> {
    let index = index(memory_store());
    index
        .add(&[
            NewVectorDocument::new("weather forecast api"),
            NewVectorDocument::new("redis connection pooling"),
            NewVectorDocument::new("postgres vector search"),
        ])
        .await?;

    let results = index.similarity_search("redis connection pooling", 2).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].content, "redis connection pooling");
    assert!(results[0].distance.abs() < 1e-5);
    assert!(results[0].distance <= results[1].distance);
    Ok(())
}

#[tokio::test]
async fn k_larger_than_corpus_returns_everything() -> crate::Result<()> {
    let index = index(memory_store());
    index
        .add(&[NewVectorDocument::new("alpha"), NewVectorDocument::new("beta")])
        .await?;

    assert_eq!(index.similarity_search("alpha", 10).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn search_returns_metadata() -> crate::Result<()> {
    let index = index(memory_store());
    index
        .store_structured(object(json!({"title": "Doc", "language": "rust"})))
        .await?;

    let results = index.similarity_search("Doc rust", 1).await?;
    assert_eq!(results[0].metadata.get("language"), Some(&json!("rust")));
    Ok(())
}

#[tokio::test]
async fn listing_respects_limit() -> crate::Result<()> {
    let index = index(memory_store());
    let docs: Vec<_> = (0..5)
        .map(|i| NewVectorDocument::new(format!("doc {i}")))
        .collect();
    index.add(&docs).await?;

    let listed = index.list(3).await?;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].content, "doc 0");
    Ok(())
}

#[tokio::test]
async fn schema_validation_reports_missing_table() {
    let store = memory_store().with_missing_table("embedding_models");
    let err = store.validate_schema().await.unwrap_err();

    assert!(err.to_string().contains("Schema validation failed"));
    assert!(memory_store().validate_schema().await.is_ok());
}

#[test]
fn postgres_store_rejects_unsafe_table_names() {
    let config = crate::config::PgVectorConfig {
        documents_table: "documents; DROP TABLE x".to_string(),
        ..crate::config::PgVectorConfig::default()
    };
    assert!(matches!(
        PgVectorStore::new(&config),
        Err(AdapterError::Config(_))
    ));
}

#[tokio::test]
async fn unreachable_postgres_is_connection_failure() {
    let config = crate::config::PgVectorConfig {
        connection_string: "postgresql://user:pw@127.0.0.1:1/db".to_string(),
        ..crate::config::PgVectorConfig::default()
    };
    let store = PgVectorStore::new(&config).expect("store should build");

    assert!(matches!(
        store.count_embeddings().await,
        Err(AdapterError::Connection(_))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector and the documents/embeddings/models tables"]
async fn live_store_and_search() {
    let config = crate::config::PgVectorConfig {
        embedding_dimension: DIM,
        ..crate::config::PgVectorConfig::default()
    };
    let store = PgVectorStore::new(&config).unwrap();
    store.validate_schema().await.unwrap();

    let index = VectorIndex::new(store, HashedEmbedder::new(DIM as usize).unwrap(), DIM);
    index
        .store_structured(object(json!({"title": "live test"})))
        .await
        .unwrap();
    assert!(!index.similarity_search("live test", 1).await.unwrap().is_empty());
}
