// Vector store gateway
// Persists documents and sections and executes similarity search

#[cfg(test)]
mod tests;

pub mod documents;
pub mod sections;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::{RagError, Result};

pub use documents::{Document, DocumentDatabase, DocumentSummary};
pub use sections::{NewSection, QueryMatch, SectionIndex};

/// Caller-overridable similarity search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Minimum similarity a match must reach to be returned.
    pub threshold: f32,
    /// Maximum number of matches to return.
    pub limit: usize,
}

impl Default for SearchOptions {
    #[inline]
    fn default() -> Self {
        Self {
            threshold: 0.7,
            limit: 5,
        }
    }
}

impl SearchOptions {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.search.match_threshold,
            limit: config.search.match_count,
        }
    }
}

/// Capability interface for resolving a document id to its record.
///
/// The context assembler depends on this seam so tests can substitute
/// fakes for the full store.
#[async_trait]
pub trait DocumentLookup: Send + Sync {
    async fn get_document(&self, id: i64) -> Result<Document>;
}

/// Gateway over document metadata (SQLite) and section vectors
/// (LanceDB).
pub struct VectorStore {
    documents: DocumentDatabase,
    sections: SectionIndex,
}

impl VectorStore {
    /// Connect to both backing stores, creating them if missing.
    /// Safe to call repeatedly against the same directories.
    #[inline]
    pub async fn connect(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(config.get_base_dir()).map_err(|e| {
            RagError::Config(format!(
                "Failed to create data directory {}: {e}",
                config.get_base_dir().display()
            ))
        })?;

        let documents = DocumentDatabase::new(config.database_path()).await?;
        let sections = SectionIndex::connect(
            &config.vector_database_path(),
            config.ollama.embedding_dimension as usize,
        )
        .await?;

        info!("Vector store connected");
        Ok(Self {
            documents,
            sections,
        })
    }

    /// Precondition check, run before ingestion or retrieval: both
    /// backing tables must exist. Distinct from per-operation errors so
    /// a missing setup is reported as configuration, not as a failed
    /// write or search.
    #[inline]
    pub async fn ensure_provisioned(&self) -> Result<()> {
        if !self.documents.is_provisioned().await? {
            return Err(RagError::Config(
                "Documents table is not provisioned; run setup first".to_string(),
            ));
        }
        if !self.sections.is_provisioned().await? {
            return Err(RagError::Config(
                "Sections table is not provisioned; run setup first".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub async fn insert_document(&self, name: &str, content: &str) -> Result<i64> {
        self.documents.insert(name, content).await
    }

    #[inline]
    pub async fn insert_sections(&self, sections: &[NewSection]) -> Result<()> {
        self.sections.insert(sections).await
    }

    #[inline]
    pub async fn search(
        &self,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<QueryMatch>> {
        self.sections
            .search(query_embedding, options.threshold, options.limit)
            .await
    }

    #[inline]
    pub async fn get_document(&self, id: i64) -> Result<Document> {
        self.documents.get(id).await
    }

    #[inline]
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.documents.list().await
    }

    /// Delete a document and cascade to all of its sections.
    ///
    /// Succeeds silently for unknown ids; callers needing a precise
    /// NotFound must resolve the id first (see [`find_by_name_or_id`]).
    ///
    /// [`find_by_name_or_id`]: VectorStore::find_by_name_or_id
    #[inline]
    pub async fn delete_document(&self, id: i64) -> Result<()> {
        self.sections.delete_for_document(id).await?;
        self.documents.delete(id).await?;
        debug!("Deleted document {} and its sections", id);
        Ok(())
    }

    /// Resolve an identifier to a document id.
    ///
    /// An identifier that parses as an integer is treated as an id and
    /// verified to exist; otherwise it is an exact-name lookup. The two
    /// branches never fall back to each other.
    #[inline]
    pub async fn find_by_name_or_id(&self, identifier: &str) -> Result<i64> {
        if let Ok(id) = identifier.parse::<i64>() {
            if self.documents.exists(id).await? {
                return Ok(id);
            }
            return Err(RagError::NotFound(format!("No document with id {id}")));
        }

        let ids = self.documents.ids_by_name(identifier).await?;
        match ids.as_slice() {
            [] => Err(RagError::NotFound(format!(
                "No document named '{identifier}'"
            ))),
            [id] => Ok(*id),
            _ => Err(RagError::AmbiguousName(format!(
                "{} documents share the name '{identifier}'; delete by id instead",
                ids.len()
            ))),
        }
    }

    #[inline]
    pub async fn document_count(&self) -> Result<u64> {
        self.documents.count().await
    }

    #[inline]
    pub async fn section_count(&self) -> Result<u64> {
        self.sections.count().await
    }

    #[inline]
    pub async fn section_count_for_document(&self, id: i64) -> Result<u64> {
        self.sections.count_for_document(id).await
    }
}

#[async_trait]
impl DocumentLookup for VectorStore {
    #[inline]
    async fn get_document(&self, id: i64) -> Result<Document> {
        self.documents.get(id).await
    }
}
