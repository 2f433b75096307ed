use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::embedder::{EmbedFuture, EmbedTask, Embedder};
use crate::error::LlmError;

const DEFAULT_PORT: u16 = 11434;

/// Embedding provider backed by a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
    dimensions: usize,
    task_prefixes: bool,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(base_url: &str, model: impl Into<String>, dimensions: usize) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model: model.into(),
            dimensions,
            task_prefixes: false,
        }
    }

    /// Prepend `search_document: ` / `search_query: ` to every input.
    #[must_use]
    pub fn with_task_prefixes(mut self, enabled: bool) -> Self {
        self.task_prefixes = enabled;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn prepare_input(&self, text: &str, task: EmbedTask) -> String {
        if self.task_prefixes {
            format!("{}{text}", task.prefix())
        } else {
            text.to_owned()
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(&'a self, text: &'a str, task: EmbedTask) -> EmbedFuture<'a> {
        Box::pin(async move {
            let input = self.prepare_input(text, task);
            let request = GenerateEmbeddingsRequest::new(
                self.model.clone(),
                EmbeddingsInput::from(input.as_str()),
            );

            let response =
                self.client
                    .generate_embeddings(request)
                    .await
                    .map_err(|e| LlmError::Request {
                        provider: "ollama",
                        message: e.to_string(),
                    })?;

            response
                .embeddings
                .into_iter()
                .next()
                .ok_or(LlmError::EmptyResponse { provider: "ollama" })
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), DEFAULT_PORT)
}
