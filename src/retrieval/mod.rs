
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::embeddings::EmbeddingProvider;
use crate::store::{QueryMatch, SearchOptions, VectorStore};

/// Read path: embed the query, search the section index.
///
/// An empty match list is a valid outcome meaning no stored content was
/// sufficiently similar; it is not an error.
pub struct RetrievalPipeline {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RetrievalPipeline {
    #[inline]
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    #[inline]
    pub async fn retrieve(&self, query: &str, options: &SearchOptions) -> Result<Vec<QueryMatch>> {
        debug!("Retrieving sections for query (length: {})", query.len());

        // Missing setup is a configuration error, not a failed search
        self.store.ensure_provisioned().await?;

        let query_embedding = self.embedder.embed(query)?;
        let matches = self.store.search(&query_embedding, options).await?;

        debug!("Retrieved {} matches", matches.len());
        Ok(matches)
    }
}
