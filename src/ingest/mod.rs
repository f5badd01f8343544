#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::{debug, info};

use crate::embeddings::EmbeddingProvider;
use crate::splitter::split_sections;
use crate::store::{NewSection, VectorStore};
use crate::{RagError, Result};

/// Result of a completed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionOutcome {
    pub document_id: i64,
    pub sections_stored: usize,
}

/// Write path: metadata insert, split, sequential embed, bulk insert.
///
/// Strictly sequential with no retries; failures propagate to the
/// caller. A failure after the metadata insert leaves the document row
/// behind with no sections. That orphan is accepted: the recovery path
/// is the listing/deletion surface, not an automatic rollback.
pub struct IngestionPipeline {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IngestionPipeline {
    #[inline]
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    #[inline]
    pub async fn ingest(&self, name: &str, content: &str) -> Result<IngestionOutcome> {
        info!("Ingesting document '{}'", name);

        // Missing setup is a configuration error, not a failed write
        self.store.ensure_provisioned().await?;

        let document_id = self.store.insert_document(name, content).await?;

        let chunks = split_sections(content);
        if chunks.is_empty() {
            // Valid terminal outcome: metadata persisted, nothing to embed
            debug!(
                "Document '{}' produced no sections; metadata stored as id {}",
                name, document_id
            );
            return Ok(IngestionOutcome {
                document_id,
                sections_stored: 0,
            });
        }

        debug!("Split '{}' into {} sections", name, chunks.len());

        // One embedding call per chunk, in order. The first failure
        // aborts the rest so no partially-embedded document is stored.
        let mut sections = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.into_iter().enumerate() {
            let embedding = self
                .embedder
                .embed(&chunk)
                .map_err(|e| attribute_chunk(e, index))?;

            sections.push(NewSection {
                document_id,
                content: chunk,
                embedding,
            });
        }

        self.store.insert_sections(&sections).await?;

        info!(
            "Ingested document '{}' as id {} with {} sections",
            name,
            document_id,
            sections.len()
        );
        Ok(IngestionOutcome {
            document_id,
            sections_stored: sections.len(),
        })
    }
}

fn attribute_chunk(error: RagError, index: usize) -> RagError {
    match error {
        RagError::Embedding { reason, .. } => RagError::Embedding {
            index: Some(index),
            reason,
        },
        other => other,
    }
}
