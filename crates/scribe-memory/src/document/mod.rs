pub mod error;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::{CsvLoader, DocxLoader, JsonLoader, PdfLoader, TextLoader};
pub use pipeline::{FileReport, IngestOutcome, IngestionPipeline};
pub use registry::{LoaderRegistry, process_uploaded_file};
pub use splitter::{DEFAULT_CHUNK_CHARS, ParagraphSplitter, SplitterConfig};
pub use types::{ChunkRecord, Metadata, ProcessingMethod, UploadedFile};

/// Default maximum upload size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Converts the raw bytes of one file format into chunk records.
pub trait DocumentLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns a format-specific [`DocumentError`] when the bytes cannot be decoded.
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError>;

    /// Declared content types routed to this loader.
    fn mime_types(&self) -> &[&str];

    /// Lowercase filename suffixes (without the dot) routed to this loader.
    fn supported_extensions(&self) -> &[&str];
}
