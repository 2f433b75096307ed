use std::panic::{self, AssertUnwindSafe};

use super::super::{ChunkRecord, DocumentError, DocumentLoader, ProcessingMethod};

/// One record per non-blank page, extracted with `pdf-extract`.
///
/// Extraction is all-or-nothing: a failure anywhere in the file yields
/// [`DocumentError::Pdf`] and no records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError> {
        // pdf-extract panics on some malformed inputs instead of returning an error
        let pages = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }))
        .map_err(|_| DocumentError::Pdf("extractor panicked on malformed input".into()))?
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;

        Ok(page_records(&pages, filename))
    }

    fn mime_types(&self) -> &[&str] {
        &["application/pdf"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

fn page_records(pages: &[String], filename: &str) -> Vec<ChunkRecord> {
    let total_pages = pages.len();
    pages
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| {
            ChunkRecord::new(text.as_str(), filename, ProcessingMethod::PdfExtraction)
                .with("page_number", i + 1)
                .with("total_pages", total_pages)
        })
        .collect()
}

/// A minimal single-page PDF showing `text` in Helvetica.
#[cfg(test)]
pub(crate) fn one_page_pdf(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_owned(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_owned(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}
