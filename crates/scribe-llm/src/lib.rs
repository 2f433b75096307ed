//! Embedding provider abstraction and backend implementations.

pub mod embedder;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;

pub use embedder::{BoxFuture, EmbedFuture, EmbedTask, Embedder, embed_each};
pub use error::LlmError;
pub use ollama::OllamaEmbedder;
