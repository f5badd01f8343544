use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::RagError;
use crate::config::Config;
use crate::context::assemble_context;
use crate::engine::RagEngine;
use crate::store::SearchOptions;

/// Ingest a file as a new document
#[inline]
pub async fn add_document(path: &Path, name: Option<String>) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    // Derive the name from the file name when not provided
    let document_name = name.unwrap_or_else(|| {
        path.file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
    });

    info!("Adding document '{}' from {}", document_name, path.display());

    let config = Config::load_default().context("Failed to load configuration")?;
    let engine = RagEngine::new(config);
    let pipeline = engine
        .ingestion()
        .await
        .context("Failed to initialize ingestion pipeline")?;

    match pipeline.ingest(&document_name, &content).await {
        Ok(outcome) => {
            println!(
                "Added document: {} (ID: {})",
                document_name, outcome.document_id
            );
            println!("  Sections stored: {}", outcome.sections_stored);
            if outcome.sections_stored == 0 {
                println!("  Note: the document had no content to index; it will not match any query.");
            }
            Ok(())
        }
        Err(e @ RagError::Embedding { .. } | e @ RagError::StoreWrite(_)) => {
            println!("Failed to index '{document_name}': {e}");
            println!(
                "The document entry may have been created without content; \
                 use 'ragdocs list' to check and 'ragdocs delete' to remove it."
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Answer a question from the indexed documents
#[inline]
pub async fn ask(query: String, threshold: Option<f32>, limit: Option<usize>) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let options = resolve_search_options(&config, threshold, limit)?;

    let engine = RagEngine::new(config);
    let pipeline = engine
        .retrieval()
        .await
        .context("Failed to initialize retrieval pipeline")?;

    let matches = pipeline
        .retrieve(&query, &options)
        .await
        .context("Failed to search the indexed documents")?;

    let store = engine.store().await?;
    let context = assemble_context(&matches, store.as_ref()).await;

    let generator = engine.generator()?;
    let answer = generator
        .generate(&context, &query)
        .context("Failed to generate an answer")?;

    println!("{answer}");

    if !matches.is_empty() {
        println!();
        println!("Sources:");
        for m in &matches {
            let label = match store.get_document(m.document_id).await {
                Ok(document) => document.name,
                Err(_) => format!("document {}", m.document_id),
            };
            println!("  {} (similarity: {:.2})", label, m.similarity);
        }
    }

    Ok(())
}

/// Apply command-line overrides on top of the configured search
/// defaults, holding them to the same validation as the config file.
fn resolve_search_options(
    config: &Config,
    threshold: Option<f32>,
    limit: Option<usize>,
) -> Result<SearchOptions> {
    let mut search = config.search;
    if let Some(threshold) = threshold {
        search.match_threshold = threshold;
    }
    if let Some(limit) = limit {
        search.match_count = limit;
    }
    search.validate().context("Invalid search options")?;

    Ok(SearchOptions {
        threshold: search.match_threshold,
        limit: search.match_count,
    })
}

/// List all indexed documents
#[inline]
pub async fn list_documents() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let engine = RagEngine::new(config);
    let store = engine.store().await.context("Failed to open the store")?;

    let documents = store
        .list_documents()
        .await
        .context("Failed to list documents")?;

    if documents.is_empty() {
        println!("No documents have been added yet.");
        println!("Use 'ragdocs add <file>' to add one.");
        return Ok(());
    }

    println!("Documents ({} total):", documents.len());
    println!();

    for document in &documents {
        println!("📄 {} (ID: {})", document.name, document.id);

        match store.section_count_for_document(document.id).await {
            Ok(0) => println!("   Sections: none (not searchable)"),
            Ok(count) => println!("   Sections: {count}"),
            Err(e) => println!("   Sections: Error - {e}"),
        }

        println!(
            "   Added: {}",
            document.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    Ok(())
}

/// Delete a document and its indexed sections
#[inline]
pub async fn delete_document(identifier: String) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let engine = RagEngine::new(config);
    let store = engine.store().await.context("Failed to open the store")?;

    let id = store.find_by_name_or_id(&identifier).await?;
    let document = store.get_document(id).await?;

    store
        .delete_document(id)
        .await
        .with_context(|| format!("Failed to delete document {id}"))?;

    println!("Deleted document: {} (ID: {})", document.name, id);
    println!("✓ Document metadata deleted");
    println!("✓ Indexed sections deleted");

    Ok(())
}

/// Show connectivity and index health
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("📊 Ragdocs Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Store Status:");
    let engine = RagEngine::new(config.clone());
    match engine.store().await {
        Ok(store) => {
            println!("   ✅ Store: Connected");
            match store.document_count().await {
                Ok(count) => println!("   📄 Documents: {count}"),
                Err(e) => println!("   ❌ Documents: Error - {e}"),
            }
            match store.section_count().await {
                Ok(count) => println!("   📑 Indexed sections: {count}"),
                Err(e) => println!("   ❌ Indexed sections: Error - {e}"),
            }
        }
        Err(e) => {
            println!("   ❌ Store: Failed to connect - {e}");
        }
    }

    println!();
    println!("🤖 Ollama Status:");
    match crate::embeddings::OllamaEmbedder::new(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Embedding model: {}", config.ollama.embedding_model);
                println!("   📋 Generation model: {}", config.ollama.generation_model);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Connected but unhealthy - {e}");
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {e}");
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'ragdocs add <file>' to index a document");
    println!("   • Use 'ragdocs ask <question>' to query the index");
    println!("   • Use 'ragdocs config' to change connection settings");

    Ok(())
}
