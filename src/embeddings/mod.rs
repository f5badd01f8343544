// Embeddings module
// Turns text into fixed-dimension vectors via a local Ollama instance

pub mod ollama;

pub use ollama::OllamaEmbedder;

use crate::Result;

/// Capability interface for turning text into a fixed-dimension vector.
///
/// One call per section during ingestion, one call per query during
/// retrieval. Implementations report failures as
/// [`RagError::Embedding`](crate::RagError::Embedding); attribution to a
/// specific chunk index is the ingestion pipeline's job.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Fixed dimensionality of every vector this provider produces.
    fn dimension(&self) -> usize;
}
