//! Knowledge store adapter: persists chunk records into an external index and
//! searches them back.

mod error;
mod index;

pub use error::{IndexError, KnowledgeError};
pub use index::{KnowledgeIndex, ScoredRecord, VectorKnowledgeIndex};

use std::sync::Arc;

use serde_json::Value;

use crate::document::{ChunkRecord, Metadata};

/// Equality filters over stored metadata keys.
pub type Filters = Metadata;

/// Metadata key duplicating the record text in stored payloads.
pub const CONTENT_KEY: &str = "content";

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Joins flattened key segments. Vector stores such as Qdrant read `.` in a
/// filter key as a nested path, so it must not appear here.
const KEY_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub limit: usize,
    /// Takes precedence over `limit` when set.
    pub override_limit: Option<usize>,
    /// Merged over the knowledge base's default filters; these win on key collision.
    pub filters: Option<Filters>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            override_limit: None,
            filters: None,
        }
    }
}

impl SearchOptions {
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_override_limit(mut self, limit: usize) -> Self {
        self.override_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.override_limit.unwrap_or(self.limit)
    }
}

/// A batch of chunk records bound to an optional external index.
///
/// Default filters apply to every search, which makes a per-user knowledge base
/// a single `with_filters` call.
pub struct KnowledgeBase {
    index: Option<Arc<dyn KnowledgeIndex>>,
    filters: Filters,
    pending: Vec<ChunkRecord>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(index: Arc<dyn KnowledgeIndex>) -> Self {
        Self {
            index: Some(index),
            filters: Filters::new(),
            pending: Vec::new(),
        }
    }

    /// A knowledge base with no index; `load` and `search` fail until one is bound.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            index: None,
            filters: Filters::new(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    pub fn bind(&mut self, index: Arc<dyn KnowledgeIndex>) {
        self.index = Some(index);
    }

    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.index.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> &[ChunkRecord] {
        &self.pending
    }

    /// Queue records for the next [`load_pending`](Self::load_pending).
    pub fn stage(&mut self, records: impl IntoIterator<Item = ChunkRecord>) {
        self.pending.extend(records);
    }

    /// Load and clear the pending batch. On failure the batch is kept.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_pending(&mut self, recreate: bool) -> Result<usize, KnowledgeError> {
        let batch = std::mem::take(&mut self.pending);
        match self.load(&batch, recreate).await {
            Ok(count) => Ok(count),
            Err(e) => {
                self.pending = batch;
                Err(e)
            }
        }
    }

    /// Persist `records` into the bound index, optionally clearing it first.
    ///
    /// Records are not modified; the index receives flattened copies carrying a
    /// duplicate `content` key.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::StoreNotConfigured`] without an index, or
    /// [`KnowledgeError::StoreWrite`] if the index rejects the batch.
    pub async fn load(
        &self,
        records: &[ChunkRecord],
        recreate: bool,
    ) -> Result<usize, KnowledgeError> {
        if records.is_empty() {
            tracing::warn!("no records to load into knowledge base");
            return Ok(0);
        }
        let index = self.index.as_ref().ok_or(KnowledgeError::StoreNotConfigured)?;

        let derived: Vec<ChunkRecord> = records.iter().map(derive_record).collect();

        if recreate {
            tracing::info!("clearing knowledge index before load");
            index.clear().await.map_err(|e| {
                tracing::error!(error = %e, "failed to clear knowledge index");
                KnowledgeError::StoreWrite(e)
            })?;
        }

        let count = index.insert(&derived).await.map_err(|e| {
            tracing::error!(records = derived.len(), error = %e, "failed to load records");
            KnowledgeError::StoreWrite(e)
        })?;
        tracing::info!(count, "records loaded into knowledge base");
        Ok(count)
    }

    /// Ranked records for `query`, exactly as the index returns them.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::StoreNotConfigured`] without an index, or
    /// [`KnowledgeError::StoreSearch`] if the index query fails.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<ScoredRecord>, KnowledgeError> {
        let index = self.index.as_ref().ok_or(KnowledgeError::StoreNotConfigured)?;
        let limit = options.effective_limit();
        let filters = merge_filters(&self.filters, options.filters);

        tracing::debug!(limit, filtered = filters.is_some(), "searching knowledge base");
        index
            .search(query, limit, filters)
            .await
            .map_err(KnowledgeError::StoreSearch)
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("bound", &self.index.is_some())
            .field("filters", &self.filters)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Defaults overlaid with per-call filters. An empty result means "no filter".
#[must_use]
pub fn merge_filters(defaults: &Filters, call: Option<Filters>) -> Option<Filters> {
    let mut merged = defaults.clone();
    merged.extend(call.unwrap_or_default());
    (!merged.is_empty()).then_some(merged)
}

/// Hoist nested objects to top-level `parent_child` keys; other values are copied as is.
#[must_use]
pub fn flatten_metadata(metadata: &Metadata) -> Metadata {
    let mut flat = Metadata::new();
    for (key, value) in metadata {
        flatten_into(&mut flat, key.clone(), value);
    }
    flat
}

fn flatten_into(flat: &mut Metadata, key: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (child, v) in map {
                flatten_into(flat, format!("{key}{KEY_SEPARATOR}{child}"), v);
            }
        }
        _ => {
            flat.insert(key, value.clone());
        }
    }
}

fn derive_record(record: &ChunkRecord) -> ChunkRecord {
    let mut metadata = flatten_metadata(&record.metadata);
    metadata.insert(CONTENT_KEY.to_owned(), Value::String(record.content.clone()));
    ChunkRecord {
        content: record.content.clone(),
        metadata,
    }
}
