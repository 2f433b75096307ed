use serde::{Deserialize, Serialize};
use scribe_memory::document::{DEFAULT_CHUNK_CHARS, DEFAULT_MAX_FILE_SIZE};
use scribe_memory::knowledge::{DEFAULT_SEARCH_LIMIT, Filters};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Ollama,
    /// Deterministic offline embedder; requires the `mock` feature.
    Mock,
}

pub(crate) fn default_base_url() -> String {
    "http://localhost:11434".into()
}

pub(crate) fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

fn default_dimensions() -> usize {
    768
}

fn default_task_prefixes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Prefix inputs with `search_document: ` / `search_query: `.
    #[serde(default = "default_task_prefixes")]
    pub task_prefixes: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            dimensions: default_dimensions(),
            task_prefixes: default_task_prefixes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeBackend {
    #[default]
    Qdrant,
    /// Process-local store; contents are lost on exit.
    Memory,
}

pub(crate) fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "scribe_knowledge".into()
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_CHUNK_CHARS
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub backend: KnowledgeBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Applied to every search unless overridden per call.
    #[serde(default, skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: KnowledgeBackend::default(),
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            search_limit: default_search_limit(),
            max_chunk_chars: default_max_chunk_chars(),
            max_file_size: default_max_file_size(),
            filters: Filters::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `tracing` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
