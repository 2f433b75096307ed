#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("content is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("PDF processing failed: {0}")]
    Pdf(String),

    #[error("DOCX processing failed: {0}")]
    Docx(String),

    #[error("CSV processing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),
}
