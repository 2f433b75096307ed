//! Loader selection and failure containment.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::{
    ChunkRecord, CsvLoader, DocumentError, DocumentLoader, DocxLoader, JsonLoader,
    ParagraphSplitter, PdfLoader, ProcessingMethod, TextLoader,
};

static DEFAULT_REGISTRY: LazyLock<LoaderRegistry> = LazyLock::new(LoaderRegistry::default);

/// How a loader was picked for a file, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    DeclaredType,
    Extension,
}

const RESOLUTION_ORDER: [Resolution; 2] = [Resolution::DeclaredType, Resolution::Extension];

/// Table of loaders keyed by MIME type and by filename extension.
pub struct LoaderRegistry {
    loaders: Vec<Arc<dyn DocumentLoader>>,
    by_mime: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl LoaderRegistry {
    /// A registry with no loaders; every file takes the UTF-8 fallback path.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
            by_mime: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    /// The built-in loaders, with the text loader using `splitter`.
    #[must_use]
    pub fn with_splitter(splitter: ParagraphSplitter) -> Self {
        let mut registry = Self::empty();
        registry.register(PdfLoader);
        registry.register(TextLoader::new(splitter));
        registry.register(DocxLoader);
        registry.register(JsonLoader);
        registry.register(CsvLoader);
        registry
    }

    /// Add a loader under every MIME type and extension it declares.
    ///
    /// Later registrations win for keys that are already taken.
    pub fn register<L: DocumentLoader + 'static>(&mut self, loader: L) {
        let index = self.loaders.len();
        for mime in loader.mime_types() {
            self.by_mime.insert((*mime).to_owned(), index);
        }
        for ext in loader.supported_extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), index);
        }
        self.loaders.push(Arc::new(loader));
    }

    #[must_use]
    pub fn get_for_mime(&self, mime_type: &str) -> Option<Arc<dyn DocumentLoader>> {
        self.by_mime
            .get(mime_type)
            .map(|&i| Arc::clone(&self.loaders[i]))
    }

    #[must_use]
    pub fn get_for_extension(&self, filename: &str) -> Option<Arc<dyn DocumentLoader>> {
        let ext = extension(filename)?;
        self.by_extension
            .get(&ext)
            .map(|&i| Arc::clone(&self.loaders[i]))
    }

    /// Pick a loader: declared content type first, then filename extension.
    #[must_use]
    pub fn resolve(
        &self,
        filename: &str,
        content_type: Option<&str>,
    ) -> Option<Arc<dyn DocumentLoader>> {
        RESOLUTION_ORDER.iter().find_map(|step| match step {
            Resolution::DeclaredType => content_type.and_then(|ct| self.get_for_mime(ct)),
            Resolution::Extension => self.get_for_extension(filename),
        })
    }

    /// Decode one file, falling back to raw UTF-8 when no loader matches.
    ///
    /// # Errors
    ///
    /// Returns the selected loader's error, or [`DocumentError::UnsupportedFileType`]
    /// when no loader matches and the bytes are not UTF-8.
    pub fn decode(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<Vec<ChunkRecord>, DocumentError> {
        match self.resolve(filename, content_type) {
            Some(loader) => loader.load(bytes, filename),
            None => fallback_text(bytes, filename, content_type),
        }
    }

    /// Decode one file, never failing: any error becomes a single error record.
    #[must_use]
    pub fn process_uploaded_file(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: Option<&str>,
    ) -> Vec<ChunkRecord> {
        match self.decode(bytes, filename, content_type) {
            Ok(records) => {
                tracing::debug!(filename, records = records.len(), "file decoded");
                records
            }
            Err(e) => {
                tracing::warn!(
                    filename,
                    content_type = content_type.unwrap_or(""),
                    error = %e,
                    "failed to process file"
                );
                vec![ChunkRecord::error(filename, &e)]
            }
        }
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_splitter(ParagraphSplitter::default())
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut mimes: Vec<&str> = self.by_mime.keys().map(String::as_str).collect();
        mimes.sort_unstable();
        let mut extensions: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.loaders.len())
            .field("mime_types", &mimes)
            .field("extensions", &extensions)
            .finish()
    }
}

/// [`LoaderRegistry::process_uploaded_file`] over the built-in loaders.
#[must_use]
pub fn process_uploaded_file(
    bytes: &[u8],
    filename: &str,
    content_type: Option<&str>,
) -> Vec<ChunkRecord> {
    DEFAULT_REGISTRY.process_uploaded_file(bytes, filename, content_type)
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn fallback_text(
    bytes: &[u8],
    filename: &str,
    content_type: Option<&str>,
) -> Result<Vec<ChunkRecord>, DocumentError> {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return Err(DocumentError::UnsupportedFileType(
            content_type.map_or_else(|| filename.to_owned(), str::to_owned),
        ));
    };
    Ok(vec![ChunkRecord::new(
        text,
        filename,
        ProcessingMethod::FallbackText,
    )])
}
