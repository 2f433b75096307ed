use std::panic::{self, AssertUnwindSafe};

use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use super::super::{ChunkRecord, DocumentError, DocumentLoader, ProcessingMethod};

const PARAGRAPH_JOIN: &str = "\n\n";

/// Word documents: body paragraphs joined into a single record.
///
/// A document without any text still yields one (empty) record with
/// `paragraph_count = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxLoader;

impl DocumentLoader for DocxLoader {
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError> {
        let docx = panic::catch_unwind(AssertUnwindSafe(|| docx_rs::read_docx(bytes)))
            .map_err(|_| DocumentError::Docx("reader panicked on malformed input".into()))?
            .map_err(|e| DocumentError::Docx(e.to_string()))?;

        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
                _ => None,
            })
            .filter(|text| !text.trim().is_empty())
            .collect();

        let count = paragraphs.len();
        Ok(vec![
            ChunkRecord::new(
                paragraphs.join(PARAGRAPH_JOIN),
                filename,
                ProcessingMethod::DocxExtraction,
            )
            .with("paragraph_count", count),
        ])
    }

    fn mime_types(&self) -> &[&str] {
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    push_paragraph_text(&mut text, children);
    text
}

fn push_paragraph_text(text: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(text, &run.children),
            ParagraphChild::Hyperlink(link) => push_paragraph_text(text, &link.children),
            _ => {}
        }
    }
}

fn push_run_text(text: &mut String, children: &[RunChild]) {
    for child in children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{BreakType, Docx, Hyperlink, HyperlinkType, Paragraph, Run};

    use super::*;

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            let paragraph = if text.is_empty() {
                Paragraph::new()
            } else {
                Paragraph::new().add_run(Run::new().add_text(*text))
            };
            docx = docx.add_paragraph(paragraph);
        }
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn joins_non_empty_paragraphs() {
        let bytes = build_docx(&["First paragraph", "", "Second paragraph"]);
        let records = DocxLoader.load(&bytes, "memo.docx").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "First paragraph\n\nSecond paragraph");
        assert_eq!(records[0].metadata["paragraph_count"], 2);
        assert_eq!(records[0].filename(), Some("memo.docx"));
        assert_eq!(
            records[0].processing_method(),
            Some(ProcessingMethod::DocxExtraction)
        );
    }

    #[test]
    fn document_without_text_is_single_empty_record() {
        let bytes = build_docx(&[""]);
        let records = DocxLoader.load(&bytes, "blank.docx").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "");
        assert_eq!(records[0].metadata["paragraph_count"], 0);
    }

    #[test]
    fn hyperlinks_tabs_and_breaks_keep_their_text() {
        let paragraph = Paragraph::new()
            .add_run(Run::new().add_text("See").add_tab().add_text("the"))
            .add_hyperlink(
                Hyperlink::new("https://example.com/handbook", HyperlinkType::External)
                    .add_run(Run::new().add_text(" handbook")),
            )
            .add_run(
                Run::new()
                    .add_break(BreakType::TextWrapping)
                    .add_text("for details"),
            );
        let mut buf = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(paragraph)
            .build()
            .pack(&mut buf)
            .unwrap();

        let records = DocxLoader.load(&buf.into_inner(), "links.docx").unwrap();
        assert_eq!(records[0].content, "See\tthe handbook\nfor details");
        assert_eq!(records[0].metadata["paragraph_count"], 1);
    }

    #[test]
    fn garbage_is_docx_error() {
        let result = DocxLoader.load(b"PK\x03\x04 not a zip", "broken.docx");
        assert!(matches!(result, Err(DocumentError::Docx(_))));
    }
}
