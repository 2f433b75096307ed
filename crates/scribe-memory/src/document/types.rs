use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DocumentError;

pub type Metadata = BTreeMap<String, Value>;

pub const FILENAME_KEY: &str = "filename";
pub const PROCESSING_METHOD_KEY: &str = "processing_method";
pub const PROCESSING_ERROR_KEY: &str = "processing_error";

/// Which loader or dispatch path produced a chunk record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    PdfExtraction,
    TextChunking,
    DocxExtraction,
    JsonExtraction,
    JsonItemExtraction,
    CsvRowExtraction,
    FallbackText,
    Error,
}

impl ProcessingMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PdfExtraction => "pdf_extraction",
            Self::TextChunking => "text_chunking",
            Self::DocxExtraction => "docx_extraction",
            Self::JsonExtraction => "json_extraction",
            Self::JsonItemExtraction => "json_item_extraction",
            Self::CsvRowExtraction => "csv_row_extraction",
            Self::FallbackText => "fallback_text",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::PdfExtraction,
            Self::TextChunking,
            Self::DocxExtraction,
            Self::JsonExtraction,
            Self::JsonItemExtraction,
            Self::CsvRowExtraction,
            Self::FallbackText,
            Self::Error,
        ]
        .into_iter()
        .find(|m| m.as_str() == s)
    }
}

impl std::fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of ingested knowledge: extracted text plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    pub metadata: Metadata,
}

impl ChunkRecord {
    #[must_use]
    pub fn new(content: impl Into<String>, filename: &str, method: ProcessingMethod) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(FILENAME_KEY.to_owned(), Value::from(filename));
        metadata.insert(PROCESSING_METHOD_KEY.to_owned(), Value::from(method.as_str()));
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The single record standing in for a file that could not be decoded.
    #[must_use]
    pub fn error(filename: &str, error: &DocumentError) -> Self {
        Self::new(
            format!("Error processing file {filename}: {error}"),
            filename,
            ProcessingMethod::Error,
        )
        .with(PROCESSING_ERROR_KEY, error.to_string())
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.metadata.get(FILENAME_KEY).and_then(Value::as_str)
    }

    #[must_use]
    pub fn processing_method(&self) -> Option<ProcessingMethod> {
        self.metadata
            .get(PROCESSING_METHOD_KEY)
            .and_then(Value::as_str)
            .and_then(ProcessingMethod::parse)
    }

    #[must_use]
    pub fn processing_error(&self) -> Option<&str> {
        self.metadata.get(PROCESSING_ERROR_KEY).and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.processing_method() == Some(ProcessingMethod::Error)
    }
}

/// A file as received from an upload: raw bytes plus the client's declarations.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_owned),
            bytes,
        }
    }
}
