use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

/// Closed error taxonomy for the ingestion and retrieval pipelines.
///
/// Every boundary call returns exactly one of these variants; callers
/// branch on the variant, never on message text.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error{}: {reason}", fmt_chunk_index(.index))]
    Embedding {
        /// Index of the section chunk that failed, when the failure
        /// happened while embedding one chunk of a larger document.
        index: Option<usize>,
        reason: String,
    },

    #[error("Store write error: {0}")]
    StoreWrite(String),

    #[error("Store read error: {0}")]
    StoreRead(String),

    #[error("Store search error: {0}")]
    StoreSearch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous name: {0}")]
    AmbiguousName(String),

    #[error("Generation error: {0}")]
    Generation(String),
}

impl RagError {
    /// Embedding failure not tied to a specific chunk (e.g. a query).
    pub fn embedding(reason: impl Into<String>) -> Self {
        RagError::Embedding {
            index: None,
            reason: reason.into(),
        }
    }
}

fn fmt_chunk_index(index: &Option<usize>) -> String {
    index.map_or_else(String::new, |i| format!(" (chunk {i})"))
}

pub mod commands;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod engine;
pub mod generation;
pub mod ingest;
pub mod retrieval;
pub mod splitter;
pub mod store;
