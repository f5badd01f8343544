
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::Result;
use crate::config::Config;
use crate::embeddings::{EmbeddingProvider, OllamaEmbedder};
use crate::generation::{OllamaGenerator, ResponseGenerator};
use crate::ingest::IngestionPipeline;
use crate::retrieval::RetrievalPipeline;
use crate::store::VectorStore;

/// Long-lived service object wiring the store, embedder and generator
/// together for one configuration.
///
/// The store connection is established lazily on first use and then
/// shared; concurrent first callers race on a single initialization
/// rather than opening duplicate connections. A failed initialization
/// is not cached, so the next call retries.
pub struct RagEngine {
    config: Config,
    store: OnceCell<Arc<VectorStore>>,
}

impl RagEngine {
    #[inline]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared store handle, connecting on first use.
    #[inline]
    pub async fn store(&self) -> Result<Arc<VectorStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                debug!("Connecting vector store on first use");
                VectorStore::connect(&self.config).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(store))
    }

    #[inline]
    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(OllamaEmbedder::new(&self.config)?))
    }

    #[inline]
    pub fn generator(&self) -> Result<Arc<dyn ResponseGenerator>> {
        Ok(Arc::new(OllamaGenerator::new(&self.config)?))
    }

    #[inline]
    pub async fn ingestion(&self) -> Result<IngestionPipeline> {
        Ok(IngestionPipeline::new(self.store().await?, self.embedder()?))
    }

    #[inline]
    pub async fn retrieval(&self) -> Result<RetrievalPipeline> {
        Ok(RetrievalPipeline::new(self.store().await?, self.embedder()?))
    }
}
