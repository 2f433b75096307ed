//! Application bootstrap: config resolution, embedder/store/pipeline construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use scribe_llm::{Embedder, OllamaEmbedder};
use scribe_memory::document::{
    IngestionPipeline, LoaderRegistry, ParagraphSplitter, SplitterConfig,
};
use scribe_memory::{
    InMemoryVectorStore, KnowledgeBase, QdrantOps, VectorKnowledgeIndex, VectorStore,
};

use crate::config::{Config, EmbeddingProvider, KnowledgeBackend, resolve_config_path};

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Resolve the config path, load and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed or fails validation.
    pub fn from_path(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(explicit);
        let config = Config::load(&config_path)?;
        Self::new(config, config_path)
    }

    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: Config, config_path: PathBuf) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            config_path,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    ///
    /// Returns an error if the configured provider is not compiled in.
    pub fn build_embedder(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        create_embedder(&self.config)
    }

    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn build_vector_store(&self) -> anyhow::Result<Arc<dyn VectorStore>> {
        create_vector_store(&self.config)
    }

    /// Wire embedder and store into a knowledge base carrying the configured default filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedder or vector store cannot be built.
    pub fn build_knowledge_base(&self) -> anyhow::Result<KnowledgeBase> {
        let embedder = self.build_embedder()?;
        let store = self.build_vector_store()?;
        let knowledge = &self.config.knowledge;

        tracing::info!(
            provider = embedder.name(),
            backend = ?knowledge.backend,
            collection = %knowledge.collection,
            "knowledge base ready"
        );

        let index = VectorKnowledgeIndex::new(embedder, store, knowledge.collection.clone());
        Ok(KnowledgeBase::new(Arc::new(index)).with_filters(knowledge.filters.clone()))
    }

    #[must_use]
    pub fn build_pipeline(&self) -> IngestionPipeline {
        create_pipeline(&self.config)
    }
}

fn create_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let llm = &config.llm;
    match llm.provider {
        EmbeddingProvider::Ollama => Ok(Arc::new(
            OllamaEmbedder::new(&llm.base_url, llm.embedding_model.clone(), llm.dimensions)
                .with_task_prefixes(llm.task_prefixes),
        )),
        #[cfg(feature = "mock")]
        EmbeddingProvider::Mock => Ok(Arc::new(scribe_llm::mock::MockEmbedder::new(
            llm.dimensions,
        ))),
        #[cfg(not(feature = "mock"))]
        EmbeddingProvider::Mock => {
            anyhow::bail!("mock embedding provider requires the `mock` feature")
        }
    }
}

fn create_vector_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    let knowledge = &config.knowledge;
    match knowledge.backend {
        KnowledgeBackend::Qdrant => {
            let ops = QdrantOps::new(&knowledge.qdrant_url)
                .with_context(|| format!("failed to create Qdrant client for {}", knowledge.qdrant_url))?;
            Ok(Arc::new(ops))
        }
        KnowledgeBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
    }
}

fn create_pipeline(config: &Config) -> IngestionPipeline {
    let splitter = ParagraphSplitter::new(SplitterConfig {
        max_chunk_chars: config.knowledge.max_chunk_chars,
    });
    IngestionPipeline::new(Arc::new(LoaderRegistry::with_splitter(splitter)))
        .with_max_file_size(config.knowledge.max_file_size)
}

#[cfg(test)]
mod tests {
    use scribe_memory::document::{ProcessingMethod, UploadedFile};
    use serde_json::json;
    use serial_test::serial;

    use super::*;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.knowledge.backend = KnowledgeBackend::Memory;
        config
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = memory_config();
        config.knowledge.max_chunk_chars = 0;
        assert!(AppBuilder::new(config, PathBuf::from("x.toml")).is_err());
    }

    #[test]
    #[serial]
    fn from_path_missing_file_uses_defaults() {
        unsafe { std::env::remove_var("SCRIBE_KNOWLEDGE_COLLECTION") };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let builder = AppBuilder::from_path(Some(&path)).unwrap();
        assert_eq!(builder.config_path(), path);
        assert_eq!(builder.config().knowledge.collection, "scribe_knowledge");
    }

    #[test]
    fn memory_backend_builds_bound_knowledge_base() {
        let mut config = memory_config();
        config
            .knowledge
            .filters
            .insert("user_id".into(), json!("alice"));
        let builder = AppBuilder::new(config, PathBuf::from("x.toml")).unwrap();

        let kb = builder.build_knowledge_base().unwrap();
        assert!(kb.is_bound());
        assert_eq!(kb.filters()["user_id"], json!("alice"));
    }

    #[test]
    fn ollama_embedder_reports_configured_dimensions() {
        let mut config = memory_config();
        config.llm.dimensions = 384;
        let builder = AppBuilder::new(config, PathBuf::from("x.toml")).unwrap();
        let embedder = builder.build_embedder().unwrap();
        assert_eq!(embedder.name(), "ollama");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[cfg(not(feature = "mock"))]
    #[test]
    fn mock_provider_requires_feature() {
        let mut config = memory_config();
        config.llm.provider = EmbeddingProvider::Mock;
        let builder = AppBuilder::new(config, PathBuf::from("x.toml")).unwrap();
        assert!(builder.build_embedder().is_err());
    }

    #[test]
    fn pipeline_uses_configured_limits() {
        let mut config = memory_config();
        config.knowledge.max_chunk_chars = 5;
        config.knowledge.max_file_size = 64;
        let builder = AppBuilder::new(config, PathBuf::from("x.toml")).unwrap();
        let pipeline = builder.build_pipeline();

        let report = pipeline.process(&UploadedFile::new(
            "notes.txt",
            Some("text/plain"),
            b"alpha\n\nbeta\n\ngamma".to_vec(),
        ));
        assert_eq!(report.records.len(), 3);
        assert!(
            report
                .records
                .iter()
                .all(|r| r.processing_method() == Some(ProcessingMethod::TextChunking))
        );

        let oversized = pipeline.process(&UploadedFile::new("big.txt", None, vec![b'a'; 65]));
        assert!(oversized.is_error());
    }
}
