use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SCRIBE_LLM_PROVIDER") {
            if let Ok(provider) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = provider;
            } else {
                tracing::warn!("ignoring invalid SCRIBE_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCRIBE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_LLM_DIMENSIONS") {
            if let Ok(dimensions) = v.parse::<usize>() {
                self.llm.dimensions = dimensions;
            } else {
                tracing::warn!("ignoring invalid SCRIBE_LLM_DIMENSIONS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCRIBE_LLM_TASK_PREFIXES")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.llm.task_prefixes = enabled;
        }
        if let Ok(v) = std::env::var("SCRIBE_QDRANT_URL") {
            self.knowledge.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_KNOWLEDGE_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.knowledge.backend = backend;
            } else {
                tracing::warn!("ignoring invalid SCRIBE_KNOWLEDGE_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCRIBE_KNOWLEDGE_COLLECTION") {
            self.knowledge.collection = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_KNOWLEDGE_SEARCH_LIMIT") {
            if let Ok(limit) = v.parse::<usize>() {
                self.knowledge.search_limit = limit;
            } else {
                tracing::warn!("ignoring invalid SCRIBE_KNOWLEDGE_SEARCH_LIMIT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCRIBE_KNOWLEDGE_MAX_CHUNK_CHARS") {
            if let Ok(chars) = v.parse::<usize>() {
                self.knowledge.max_chunk_chars = chars;
            } else {
                tracing::warn!("ignoring invalid SCRIBE_KNOWLEDGE_MAX_CHUNK_CHARS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCRIBE_KNOWLEDGE_MAX_FILE_SIZE")
            && let Ok(bytes) = v.parse::<u64>()
        {
            self.knowledge.max_file_size = bytes;
        }
        if let Ok(v) = std::env::var("SCRIBE_LOG_LEVEL") {
            self.logging.level = v;
        }
    }
}
