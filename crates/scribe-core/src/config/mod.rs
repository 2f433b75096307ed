mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};

/// Used when neither `--config` nor `SCRIBE_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values that would make ingestion or search meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.llm.dimensions > 0, "llm.dimensions must be greater than zero");
        ensure!(
            !self.llm.embedding_model.trim().is_empty(),
            "llm.embedding_model must not be empty"
        );
        ensure!(
            !self.knowledge.collection.trim().is_empty(),
            "knowledge.collection must not be empty"
        );
        ensure!(
            self.knowledge.search_limit > 0,
            "knowledge.search_limit must be greater than zero"
        );
        ensure!(
            self.knowledge.max_chunk_chars > 0,
            "knowledge.max_chunk_chars must be greater than zero"
        );
        ensure!(
            self.knowledge.max_file_size > 0,
            "knowledge.max_file_size must be greater than zero"
        );
        Ok(())
    }
}

/// Priority: explicit path > `SCRIBE_CONFIG` env > [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SCRIBE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
