use std::sync::Arc;

use scribe_llm::{EmbedTask, Embedder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{CONTENT_KEY, Filters, IndexError};
use crate::document::ChunkRecord;
use crate::vector_store::{
    BoxFuture, FieldCondition, FieldValue, Payload, ScoredVectorPoint, VectorFilter, VectorPoint,
    VectorStore,
};

/// A stored record returned by a search, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: ChunkRecord,
    pub score: f32,
}

/// The external index a knowledge base persists into.
pub trait KnowledgeIndex: Send + Sync {
    /// Store `records`, returning how many were written.
    fn insert<'a>(&'a self, records: &'a [ChunkRecord]) -> BoxFuture<'a, Result<usize, IndexError>>;

    /// Remove every stored record.
    fn clear(&self) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Records most similar to `query`. `filters` are equality matches on metadata keys.
    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
        filters: Option<Filters>,
    ) -> BoxFuture<'a, Result<Vec<ScoredRecord>, IndexError>>;
}

/// [`KnowledgeIndex`] over an [`Embedder`] and a [`VectorStore`] collection.
pub struct VectorKnowledgeIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl VectorKnowledgeIndex {
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of stored points.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store cannot be queried.
    pub async fn count(&self) -> Result<u64, IndexError> {
        Ok(self.store.count(&self.collection).await?)
    }

    async fn ensure_collection(&self) -> Result<(), IndexError> {
        self.store
            .ensure_collection(&self.collection, self.embedder.dimensions() as u64)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for VectorKnowledgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorKnowledgeIndex")
            .field("embedder", &self.embedder.name())
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl KnowledgeIndex for VectorKnowledgeIndex {
    fn insert<'a>(&'a self, records: &'a [ChunkRecord]) -> BoxFuture<'a, Result<usize, IndexError>> {
        Box::pin(async move {
            if records.is_empty() {
                return Ok(0);
            }
            self.ensure_collection().await?;

            let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
            let vectors = self.embedder.embed_many(&texts, EmbedTask::Document).await;

            let points = records
                .iter()
                .zip(vectors)
                .map(|(record, vector)| -> Result<VectorPoint, IndexError> {
                    let mut payload = record.metadata.clone();
                    payload
                        .entry(CONTENT_KEY.to_owned())
                        .or_insert_with(|| Value::String(record.content.clone()));
                    Ok(VectorPoint {
                        id: point_id(record)?,
                        vector,
                        payload,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let count = points.len();
            self.store.upsert(&self.collection, points).await?;
            tracing::debug!(collection = %self.collection, count, "records indexed");
            Ok(count)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            if self.store.collection_exists(&self.collection).await? {
                self.store.delete_collection(&self.collection).await?;
            }
            self.ensure_collection().await
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
        filters: Option<Filters>,
    ) -> BoxFuture<'a, Result<Vec<ScoredRecord>, IndexError>> {
        Box::pin(async move {
            let filter = filters.as_ref().map(to_vector_filter).transpose()?;

            if !self.store.collection_exists(&self.collection).await? {
                return Ok(Vec::new());
            }

            let vector = self.embedder.embed(query, EmbedTask::Query).await?;
            let points = self
                .store
                .search(&self.collection, vector, limit as u64, filter)
                .await?;
            Ok(points.into_iter().map(to_scored_record).collect())
        })
    }
}

/// Deterministic id: identical records map to the same point.
fn point_id(record: &ChunkRecord) -> Result<String, IndexError> {
    let bytes = serde_json::to_vec(record)?;
    let hash = blake3::hash(&bytes);
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, hash.as_bytes()).to_string())
}

fn to_vector_filter(filters: &Filters) -> Result<VectorFilter, IndexError> {
    let must = filters
        .iter()
        .map(|(key, value)| -> Result<FieldCondition, IndexError> {
            let value = match value {
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Bool(b) => FieldValue::Bool(*b),
                Value::Number(n) => n
                    .as_i64()
                    .map(FieldValue::Integer)
                    .ok_or_else(|| IndexError::UnsupportedFilter { key: key.clone() })?,
                _ => return Err(IndexError::UnsupportedFilter { key: key.clone() }),
            };
            Ok(FieldCondition {
                field: key.clone(),
                value,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VectorFilter {
        must,
        must_not: Vec::new(),
    })
}

fn to_scored_record(point: ScoredVectorPoint) -> ScoredRecord {
    let mut metadata: Payload = point.payload;
    let content = match metadata.remove(CONTENT_KEY) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    };
    ScoredRecord {
        record: ChunkRecord { content, metadata },
        score: point.score,
    }
}
