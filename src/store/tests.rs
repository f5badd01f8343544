use super::*;
use crate::config::{OllamaConfig, SearchConfig};
use tempfile::TempDir;

const DIM: usize = 4;

fn test_config(base_dir: &std::path::Path) -> Config {
    Config {
        ollama: OllamaConfig {
            embedding_dimension: DIM as u32,
            ..OllamaConfig::default()
        },
        search: SearchConfig::default(),
        base_dir: base_dir.to_path_buf(),
    }
}

async fn create_test_store() -> (TempDir, VectorStore) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(temp_dir.path());
    let store = VectorStore::connect(&config)
        .await
        .expect("should connect store");
    (temp_dir, store)
}

#[tokio::test]
async fn connect_provisions_both_tables() {
    let (_temp_dir, store) = create_test_store().await;

    store
        .ensure_provisioned()
        .await
        .expect("freshly connected store should be provisioned");
}

#[tokio::test]
async fn missing_documents_table_fails_provisioning_check() {
    let (_temp_dir, store) = create_test_store().await;

    sqlx::query("DROP TABLE documents")
        .execute(store.documents.pool())
        .await
        .expect("should drop documents table");

    assert!(matches!(
        store.ensure_provisioned().await,
        Err(RagError::Config(_))
    ));
}

#[tokio::test]
async fn default_search_options() {
    let options = SearchOptions::default();
    assert_eq!(options.threshold, 0.7);
    assert_eq!(options.limit, 5);
}

#[tokio::test]
async fn search_options_from_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = test_config(temp_dir.path());
    config.search.match_threshold = 0.5;
    config.search.match_count = 3;

    let options = SearchOptions::from_config(&config);
    assert_eq!(options.threshold, 0.5);
    assert_eq!(options.limit, 3);
}

#[tokio::test]
async fn find_by_id_branch_never_falls_back_to_name() {
    let (_temp_dir, store) = create_test_store().await;

    // A document literally named "42" must not be found via id parse
    store
        .insert_document("42", "content")
        .await
        .expect("should insert");

    let result = store.find_by_name_or_id("42").await;
    assert!(matches!(result, Err(RagError::NotFound(_))));
}

#[tokio::test]
async fn find_by_id_returns_existing_id() {
    let (_temp_dir, store) = create_test_store().await;

    let id = store
        .insert_document("notes.txt", "content")
        .await
        .expect("should insert");

    let found = store
        .find_by_name_or_id(&id.to_string())
        .await
        .expect("should find by id");
    assert_eq!(found, id);
}

#[tokio::test]
async fn find_by_name_branches() {
    let (_temp_dir, store) = create_test_store().await;

    let id = store
        .insert_document("unique.txt", "a")
        .await
        .expect("should insert");
    store
        .insert_document("dupe.txt", "b")
        .await
        .expect("should insert");
    store
        .insert_document("dupe.txt", "c")
        .await
        .expect("should insert");

    let found = store
        .find_by_name_or_id("unique.txt")
        .await
        .expect("should find by name");
    assert_eq!(found, id);

    assert!(matches!(
        store.find_by_name_or_id("missing.txt").await,
        Err(RagError::NotFound(_))
    ));

    assert!(matches!(
        store.find_by_name_or_id("dupe.txt").await,
        Err(RagError::AmbiguousName(_))
    ));
}

#[tokio::test]
async fn delete_document_cascades_to_sections() {
    let (_temp_dir, store) = create_test_store().await;

    let id = store
        .insert_document("doomed.txt", "Alpha.\n\nBeta.")
        .await
        .expect("should insert");

    store
        .insert_sections(&[
            NewSection {
                document_id: id,
                content: "Alpha.".to_string(),
                embedding: vec![1.0, 0.0, 0.0, 0.0],
            },
            NewSection {
                document_id: id,
                content: "Beta.".to_string(),
                embedding: vec![0.0, 1.0, 0.0, 0.0],
            },
        ])
        .await
        .expect("should insert sections");

    // The search matches before deletion
    let before = store
        .search(&[1.0, 0.0, 0.0, 0.0], &SearchOptions::default())
        .await
        .expect("should search");
    assert!(before.iter().any(|m| m.document_id == id));

    store.delete_document(id).await.expect("should delete");

    assert!(matches!(
        store.get_document(id).await,
        Err(RagError::NotFound(_))
    ));

    let after = store
        .search(&[1.0, 0.0, 0.0, 0.0], &SearchOptions::default())
        .await
        .expect("should search");
    assert!(after.iter().all(|m| m.document_id != id));
}

#[tokio::test]
async fn document_with_zero_sections_is_valid_but_unsearchable() {
    let (_temp_dir, store) = create_test_store().await;

    let id = store
        .insert_document("empty.txt", "")
        .await
        .expect("should insert");

    assert_eq!(
        store
            .section_count_for_document(id)
            .await
            .expect("should count"),
        0
    );

    let matches = store
        .search(&[1.0, 0.0, 0.0, 0.0], &SearchOptions::default())
        .await
        .expect("should search");
    assert!(matches.iter().all(|m| m.document_id != id));

    // The metadata row is still retrievable
    let document = store.get_document(id).await.expect("should get document");
    assert_eq!(document.name, "empty.txt");
}

#[tokio::test]
async fn document_lookup_trait_resolves_names() {
    let (_temp_dir, store) = create_test_store().await;

    let id = store
        .insert_document("notes.txt", "content")
        .await
        .expect("should insert");

    let lookup: &dyn DocumentLookup = &store;
    let document = lookup
        .get_document(id)
        .await
        .expect("should resolve document");
    assert_eq!(document.name, "notes.txt");
}
