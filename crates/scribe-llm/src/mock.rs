//! Test-only mock embedding provider.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::embedder::{EmbedFuture, EmbedTask, Embedder};
use crate::error::LlmError;

/// Deterministic bag-of-words embedder.
///
/// Every lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets, so texts sharing words land close together under cosine
/// similarity.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
    failing: HashSet<String>,
    calls: Arc<Mutex<Vec<(String, EmbedTask)>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `embed` fail for this exact input text.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Every `(text, task)` pair passed to `embed` so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, EmbedTask)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for MockEmbedder {
    fn embed<'a>(&'a self, text: &'a str, task: EmbedTask) -> EmbedFuture<'a> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((text.to_owned(), task));
            }
            if self.failing.contains(text) {
                return Err(LlmError::Other("mock embedding error".into()));
            }
            Ok(self.vector_for(text))
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_vector() {
        let embedder = MockEmbedder::new(16);
        assert_eq!(embedder.vector_for("Hello world"), embedder.vector_for("hello WORLD"));
    }

    #[tokio::test]
    async fn records_calls_with_task() {
        let embedder = MockEmbedder::new(8);
        embedder.embed("q", EmbedTask::Query).await.unwrap();
        assert_eq!(embedder.calls(), vec![("q".to_owned(), EmbedTask::Query)]);
    }

    #[tokio::test]
    async fn failing_input_errors() {
        let embedder = MockEmbedder::new(8).failing_on("bad");
        assert!(embedder.embed("bad", EmbedTask::Document).await.is_err());
        assert!(embedder.embed("good", EmbedTask::Document).await.is_ok());
    }
}
