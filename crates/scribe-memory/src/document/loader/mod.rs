mod csv;
mod docx;
mod json;
mod pdf;
mod text;

pub use self::csv::CsvLoader;
pub use docx::DocxLoader;
pub use json::JsonLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;

#[cfg(test)]
pub(crate) use pdf::one_page_pdf;

use super::DocumentError;

const UTF8_BOM: &str = "\u{feff}";

/// Strict UTF-8 decode with a leading byte-order mark removed.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str, DocumentError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}
