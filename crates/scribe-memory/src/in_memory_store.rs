use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::vector_store::{
    BoxFuture, FieldCondition, FieldValue, Payload, ScoredVectorPoint, VectorFilter, VectorPoint,
    VectorStore, VectorStoreError,
};

type Collections = HashMap<String, InMemoryCollection>;

struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

struct InMemoryCollection {
    vector_size: usize,
    points: HashMap<String, StoredPoint>,
}

impl InMemoryCollection {
    fn new(vector_size: usize) -> Self {
        Self {
            vector_size,
            points: HashMap::new(),
        }
    }

    fn insert(&mut self, points: Vec<VectorPoint>) -> Result<(), String> {
        if let Some(bad) = points.iter().find(|p| p.vector.len() != self.vector_size) {
            return Err(format!(
                "point {} has {} dimensions, expected {}",
                bad.id,
                bad.vector.len(),
                self.vector_size
            ));
        }
        for VectorPoint {
            id,
            vector,
            payload,
        } in points
        {
            self.points.insert(id, StoredPoint { vector, payload });
        }
        Ok(())
    }

    /// Brute-force cosine ranking; equal scores are ordered by id.
    fn rank(
        &self,
        query: &[f32],
        filter: Option<&VectorFilter>,
        limit: usize,
    ) -> Vec<ScoredVectorPoint> {
        let mut scored: Vec<ScoredVectorPoint> = self
            .points
            .iter()
            .filter(|(_, stored)| filter.is_none_or(|f| f.accepts(&stored.payload)))
            .map(|(id, stored)| ScoredVectorPoint {
                id: id.clone(),
                score: cosine(query, &stored.vector),
                payload: stored.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        scored.truncate(limit);
        scored
    }
}

/// Process-local [`VectorStore`] with brute-force cosine search.
pub struct InMemoryVectorStore {
    collections: RwLock<Collections>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections::new()),
        }
    }

    fn read(
        &self,
        err: fn(String) -> VectorStoreError,
    ) -> Result<RwLockReadGuard<'_, Collections>, VectorStoreError> {
        self.collections.read().map_err(|e| err(e.to_string()))
    }

    fn write(
        &self,
        err: fn(String) -> VectorStoreError,
    ) -> Result<RwLockWriteGuard<'_, Collections>, VectorStoreError> {
        self.collections.write().map_err(|e| err(e.to_string()))
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.collections.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("InMemoryVectorStore")
            .field("collections", &collections)
            .finish_non_exhaustive()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

impl VectorFilter {
    fn accepts(&self, payload: &Payload) -> bool {
        let holds = |cond: &FieldCondition| {
            payload
                .get(&cond.field)
                .is_some_and(|value| cond.value.matches(value))
        };
        self.must.iter().all(holds) && !self.must_not.iter().any(holds)
    }
}

impl FieldValue {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Integer(expected) => value.as_i64() == Some(*expected),
            Self::Text(expected) => value.as_str() == Some(expected.as_str()),
            Self::Bool(expected) => value.as_bool() == Some(*expected),
        }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let vector_size = usize::try_from(vector_size)
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            self.write(VectorStoreError::Collection)?
                .entry(name)
                .or_insert_with(|| InMemoryCollection::new(vector_size));
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move { Ok(self.read(VectorStoreError::Collection)?.contains_key(&name)) })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            self.write(VectorStoreError::Collection)?.remove(&name);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let mut collections = self.write(VectorStoreError::Upsert)?;
            let target = collections
                .get_mut(&name)
                .ok_or_else(|| VectorStoreError::Upsert(format!("no collection named {name}")))?;
            target
                .insert(points)
                .map_err(|e| VectorStoreError::Upsert(format!("{name}: {e}")))
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let collections = self.read(VectorStoreError::Search)?;
            let target = collections
                .get(&name)
                .ok_or_else(|| VectorStoreError::Search(format!("no collection named {name}")))?;
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            Ok(target.rank(&vector, filter.as_ref(), limit))
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let collections = self.read(VectorStoreError::Count)?;
            Ok(collections
                .get(&name)
                .map_or(0, |target| target.points.len() as u64))
        })
    }
}
