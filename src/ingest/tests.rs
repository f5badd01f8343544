use super::*;
use crate::config::{Config, OllamaConfig, SearchConfig};
use crate::splitter::split_sections;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const DIM: usize = 4;

/// Deterministic embedder: a fixed vector per text, no network.
struct StubEmbedder;

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let seed = text.len() as f32;
        Ok(vec![1.0, seed * 0.01, 0.0, 0.0])
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Fails on the nth embed call, succeeding before it.
struct FailingEmbedder {
    fail_at: usize,
    calls: AtomicUsize,
}

impl FailingEmbedder {
    fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_at {
            Err(RagError::embedding("model unavailable"))
        } else {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Produces vectors that do not match the table dimension, forcing the
/// bulk insert to fail.
struct WrongDimensionEmbedder;

impl EmbeddingProvider for WrongDimensionEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimension(&self) -> usize {
        2
    }
}

async fn create_test_store() -> (TempDir, Arc<VectorStore>) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        ollama: OllamaConfig {
            embedding_dimension: DIM as u32,
            ..OllamaConfig::default()
        },
        search: SearchConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    };
    let store = VectorStore::connect(&config)
        .await
        .expect("should connect store");
    (temp_dir, Arc::new(store))
}

#[tokio::test]
async fn stored_section_count_matches_splitter() {
    let (_temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(StubEmbedder));

    let content = "Alpha fact.\n\nBeta fact.\n\n\nGamma fact.";
    let outcome = pipeline
        .ingest("facts.txt", content)
        .await
        .expect("should ingest");

    let expected = split_sections(content).len();
    assert_eq!(outcome.sections_stored, expected);
    assert_eq!(
        store
            .section_count_for_document(outcome.document_id)
            .await
            .expect("should count"),
        expected as u64
    );
}

#[tokio::test]
async fn blank_document_ingests_with_zero_sections() {
    let (_temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(StubEmbedder));

    let outcome = pipeline
        .ingest("blank.txt", "\n\n   \n\n")
        .await
        .expect("blank content is a success outcome");

    assert_eq!(outcome.sections_stored, 0);

    // Metadata is persisted even without sections
    let document = store
        .get_document(outcome.document_id)
        .await
        .expect("should get document");
    assert_eq!(document.name, "blank.txt");
}

#[tokio::test]
async fn embed_failure_carries_chunk_index_and_inserts_no_sections() {
    let (_temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(FailingEmbedder::new(1)));

    let result = pipeline
        .ingest("fails.txt", "first\n\nsecond\n\nthird")
        .await;

    match result {
        Err(RagError::Embedding { index, .. }) => assert_eq!(index, Some(1)),
        other => panic!("expected embedding error with chunk index, got {other:?}"),
    }

    // Fail-fast: no sections inserted, but the metadata row remains
    assert_eq!(store.section_count().await.expect("should count"), 0);
    assert_eq!(store.document_count().await.expect("should count"), 1);
}

#[tokio::test]
async fn bulk_insert_failure_leaves_orphaned_document() {
    let (_temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(WrongDimensionEmbedder));

    let result = pipeline.ingest("mismatch.txt", "some content").await;
    assert!(matches!(result, Err(RagError::StoreWrite(_))));

    assert_eq!(store.section_count().await.expect("should count"), 0);
    assert_eq!(store.document_count().await.expect("should count"), 1);
}

#[tokio::test]
async fn missing_sections_table_is_a_configuration_error() {
    let (temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(StubEmbedder));

    // Simulate the setup disappearing between connect and use
    std::fs::remove_dir_all(temp_dir.path().join("vectors").join("sections.lance"))
        .expect("should remove sections table directory");

    let result = pipeline.ingest("notes.txt", "some content").await;
    assert!(matches!(result, Err(RagError::Config(_))));

    // The precondition fires before the metadata insert, so no orphan
    assert_eq!(store.document_count().await.expect("should count"), 0);
}

#[tokio::test]
async fn metadata_insert_failure_is_terminal() {
    let (_temp_dir, store) = create_test_store().await;
    let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::new(StubEmbedder));

    // Empty name fails the metadata insert before anything else runs
    let result = pipeline.ingest("", "content").await;
    assert!(matches!(result, Err(RagError::StoreWrite(_))));
    assert_eq!(store.document_count().await.expect("should count"), 0);
}
