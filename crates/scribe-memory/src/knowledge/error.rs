use scribe_llm::LlmError;

use crate::vector_store::VectorStoreError;

/// Failures inside a [`KnowledgeIndex`](super::KnowledgeIndex) backend.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] LlmError),

    #[error("filter on `{key}` must be a string, integer or boolean")]
    UnsupportedFilter { key: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store-level failures. Unlike per-file decode errors these reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("no knowledge index is configured")]
    StoreNotConfigured,

    #[error("failed to write to knowledge index: {0}")]
    StoreWrite(#[source] IndexError),

    #[error("failed to search knowledge index: {0}")]
    StoreSearch(#[source] IndexError),
}
