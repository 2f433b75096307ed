//! File ingestion and vector-backed knowledge bases.

pub mod document;
pub mod in_memory_store;
pub mod knowledge;
pub mod qdrant_ops;
pub mod vector_store;

pub use in_memory_store::InMemoryVectorStore;
pub use knowledge::{
    Filters, IndexError, KnowledgeBase, KnowledgeError, KnowledgeIndex, ScoredRecord, SearchOptions,
    VectorKnowledgeIndex,
};
pub use qdrant_ops::QdrantOps;
pub use vector_store::{
    FieldCondition, FieldValue, Payload, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
