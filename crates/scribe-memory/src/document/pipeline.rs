use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::{
    ChunkRecord, DEFAULT_MAX_FILE_SIZE, DocumentError, LoaderRegistry, Metadata, UploadedFile,
};
use crate::knowledge::{KnowledgeBase, KnowledgeError};

/// Records produced for one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub records: Vec<ChunkRecord>,
}

impl FileReport {
    fn failed(filename: &str, error: &DocumentError) -> Self {
        tracing::warn!(filename, error = %error, "failed to read file");
        Self {
            filename: filename.to_owned(),
            records: vec![ChunkRecord::error(filename, error)],
        }
    }

    /// Whether the file failed to decode as a whole.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.records.iter().any(ChunkRecord::is_error)
    }
}

/// Result of [`IngestionPipeline::ingest`].
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reports: Vec<FileReport>,
    /// Records handed to the knowledge base.
    pub loaded: usize,
}

impl IngestOutcome {
    #[must_use]
    pub fn failed_files(&self) -> usize {
        self.reports.iter().filter(|r| r.is_error()).count()
    }
}

/// Batch front end over a [`LoaderRegistry`]: size cap, metadata tags and
/// blocking-pool offload.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    registry: Arc<LoaderRegistry>,
    max_file_size: u64,
    tags: Metadata,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(Arc::new(LoaderRegistry::default()))
    }
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(registry: Arc<LoaderRegistry>) -> Self {
        Self {
            registry,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            tags: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Attach `key = value` to the metadata of every record this pipeline emits.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Decode one file synchronously.
    #[must_use]
    pub fn process(&self, file: &UploadedFile) -> FileReport {
        let size = file.bytes.len() as u64;
        if size > self.max_file_size {
            return FileReport::failed(&file.filename, &DocumentError::FileTooLarge(size));
        }

        let mut records = self.registry.process_uploaded_file(
            &file.bytes,
            &file.filename,
            file.content_type.as_deref(),
        );
        if !self.tags.is_empty() {
            records = records.into_iter().map(|r| self.tag(r)).collect();
        }

        FileReport {
            filename: file.filename.clone(),
            records,
        }
    }

    /// Decode files one at a time on the blocking pool. Always yields one report per file.
    pub async fn process_batch(&self, files: Vec<UploadedFile>) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            let filename = file.filename.clone();
            let pipeline = self.clone();
            let report = tokio::task::spawn_blocking(move || pipeline.process(&file))
                .await
                .unwrap_or_else(|e| {
                    FileReport::failed(&filename, &DocumentError::Io(std::io::Error::other(e)))
                });
            reports.push(report);
        }
        reports
    }

    /// Read a file from disk, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FileTooLarge`] over the size cap, or an IO error.
    pub async fn read_path(&self, path: &Path) -> Result<UploadedFile, DocumentError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > self.max_file_size {
            return Err(DocumentError::FileTooLarge(meta.len()));
        }

        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path).first();
        Ok(UploadedFile::new(
            display_name(path),
            content_type.as_ref().map(mime_guess::Mime::essence_str),
            bytes,
        ))
    }

    /// Read and decode files from disk. Unreadable files yield an error report.
    pub async fn process_paths(&self, paths: &[impl AsRef<Path>]) -> Vec<FileReport> {
        let mut files = Vec::with_capacity(paths.len());
        let mut unreadable = Vec::new();

        for (position, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            match self.read_path(path).await {
                Ok(file) => files.push((position, file)),
                Err(e) => unreadable.push((position, FileReport::failed(&display_name(path), &e))),
            }
        }

        let (positions, files): (Vec<usize>, Vec<UploadedFile>) = files.into_iter().unzip();
        let mut reports: Vec<(usize, FileReport)> = positions
            .into_iter()
            .zip(self.process_batch(files).await)
            .chain(unreadable)
            .collect();
        reports.sort_by_key(|(position, _)| *position);
        reports.into_iter().map(|(_, report)| report).collect()
    }

    /// Decode `files` and load every successfully decoded record into `kb`.
    ///
    /// # Errors
    ///
    /// Returns the knowledge base's store error. Per-file failures are reported
    /// in [`IngestOutcome::reports`] instead.
    pub async fn ingest(
        &self,
        kb: &KnowledgeBase,
        files: Vec<UploadedFile>,
        recreate: bool,
    ) -> Result<IngestOutcome, KnowledgeError> {
        let reports = self.process_batch(files).await;
        load_reports(kb, reports, recreate).await
    }

    /// Like [`IngestionPipeline::ingest`], reading the files from disk first.
    ///
    /// # Errors
    ///
    /// Returns the knowledge base's store error.
    pub async fn ingest_paths(
        &self,
        kb: &KnowledgeBase,
        paths: &[impl AsRef<Path>],
        recreate: bool,
    ) -> Result<IngestOutcome, KnowledgeError> {
        let reports = self.process_paths(paths).await;
        load_reports(kb, reports, recreate).await
    }

    fn tag(&self, mut record: ChunkRecord) -> ChunkRecord {
        for (key, value) in &self.tags {
            record.metadata.insert(key.clone(), value.clone());
        }
        record
    }
}

async fn load_reports(
    kb: &KnowledgeBase,
    reports: Vec<FileReport>,
    recreate: bool,
) -> Result<IngestOutcome, KnowledgeError> {
    let records: Vec<ChunkRecord> = reports
        .iter()
        .flat_map(|r| r.records.iter())
        .filter(|r| !r.is_error())
        .cloned()
        .collect();

    let loaded = kb.load(&records, recreate).await?;
    Ok(IngestOutcome { reports, loaded })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
