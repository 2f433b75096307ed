use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed future returned by [`Embedder::embed`].
pub type EmbedFuture<'a> = BoxFuture<'a, Result<Vec<f32>, LlmError>>;

/// Hint telling the provider what the embedded text will be used for.
///
/// Retrieval-tuned models embed stored passages and search queries differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedTask {
    Document,
    Query,
}

impl EmbedTask {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Query => "query",
        }
    }

    /// Instruction prefix used by models trained with task prefixes (nomic-embed and friends).
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Document => "search_document: ",
            Self::Query => "search_query: ",
        }
    }
}

impl std::fmt::Display for EmbedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails or yields no vector.
    fn embed<'a>(&'a self, text: &'a str, task: EmbedTask) -> EmbedFuture<'a>;

    /// Dimensionality of the vectors this provider returns.
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;

    /// Embed a batch of texts, one vector per input in order.
    ///
    /// Never fails as a whole: an input whose embedding fails is replaced by a
    /// zero vector of [`Embedder::dimensions`] length.
    fn embed_many<'a>(
        &'a self,
        texts: &'a [String],
        task: EmbedTask,
    ) -> BoxFuture<'a, Vec<Vec<f32>>> {
        Box::pin(embed_each(self, texts, task))
    }
}

/// Embed `texts` one at a time, substituting a zero vector for every failed item.
pub async fn embed_each<E: Embedder + ?Sized>(
    embedder: &E,
    texts: &[String],
    task: EmbedTask,
) -> Vec<Vec<f32>> {
    let dimensions = embedder.dimensions();
    let mut vectors = Vec::with_capacity(texts.len());

    for (index, text) in texts.iter().enumerate() {
        let result = embedder.embed(text, task).await.and_then(|vector| {
            if vector.len() == dimensions {
                Ok(vector)
            } else {
                Err(LlmError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                })
            }
        });

        match result {
            Ok(vector) => vectors.push(vector),
            Err(e) => {
                tracing::warn!(
                    provider = embedder.name(),
                    index,
                    %task,
                    error = %e,
                    "embedding failed, substituting zero vector"
                );
                vectors.push(vec![0.0; dimensions]);
            }
        }
    }

    vectors
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        dimensions: usize,
    }

    impl Embedder for FixedEmbedder {
        fn embed<'a>(&'a self, text: &'a str, _task: EmbedTask) -> EmbedFuture<'a> {
            Box::pin(async move {
                match text {
                    "fail" => Err(LlmError::Other("boom".into())),
                    "short" => Ok(vec![1.0]),
                    _ => Ok(vec![1.0; self.dimensions]),
                }
            })
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn embed_many_preserves_order_and_length() {
        let embedder = FixedEmbedder { dimensions: 3 };
        let texts = vec!["a".to_owned(), "b".to_owned()];
        let vectors = embedder.embed_many(&texts, EmbedTask::Document).await;
        assert_eq!(vectors, vec![vec![1.0; 3], vec![1.0; 3]]);
    }

    #[tokio::test]
    async fn failed_item_becomes_zero_vector() {
        let embedder = FixedEmbedder { dimensions: 3 };
        let texts = vec!["a".to_owned(), "fail".to_owned(), "c".to_owned()];
        let vectors = embedder.embed_many(&texts, EmbedTask::Document).await;
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[1], vec![0.0; 3]);
        assert_eq!(vectors[2], vec![1.0; 3]);
    }

    #[tokio::test]
    async fn wrong_dimension_becomes_zero_vector() {
        let embedder = FixedEmbedder { dimensions: 4 };
        let texts = vec!["short".to_owned()];
        let vectors = embedder.embed_many(&texts, EmbedTask::Query).await;
        assert_eq!(vectors, vec![vec![0.0; 4]]);
    }

    #[tokio::test]
    async fn empty_batch() {
        let embedder = FixedEmbedder { dimensions: 2 };
        let vectors = embedder.embed_many(&[], EmbedTask::Document).await;
        assert!(vectors.is_empty());
    }

    #[test]
    fn task_prefixes_differ() {
        assert_ne!(EmbedTask::Document.prefix(), EmbedTask::Query.prefix());
        assert_eq!(EmbedTask::Query.to_string(), "query");
    }
}
