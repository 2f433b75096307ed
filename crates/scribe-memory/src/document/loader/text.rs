use super::super::{ChunkRecord, DocumentError, DocumentLoader, ParagraphSplitter, ProcessingMethod};
use super::decode_utf8;

/// Plain-text and Markdown loader.
///
/// Short documents become a single record; longer ones are paragraph-packed by
/// the splitter.
#[derive(Debug, Clone, Default)]
pub struct TextLoader {
    pub splitter: ParagraphSplitter,
}

impl TextLoader {
    #[must_use]
    pub fn new(splitter: ParagraphSplitter) -> Self {
        Self { splitter }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError> {
        let text = decode_utf8(bytes)?;

        let mut chunks = if text.chars().count() <= self.splitter.max_chunk_chars() {
            Vec::new()
        } else {
            self.splitter.split(text)
        };
        // short or paragraph-free text is kept whole
        if chunks.is_empty() {
            chunks.push(text.to_owned());
        }

        let total = chunks.len();
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                ChunkRecord::new(chunk, filename, ProcessingMethod::TextChunking)
                    .with("chunk_number", i + 1)
                    .with("total_chunks", total)
            })
            .collect())
    }

    fn mime_types(&self) -> &[&str] {
        &["text/plain", "text/markdown"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::splitter::paragraphs;

    #[test]
    fn short_text_is_single_record() {
        let records = TextLoader::default().load(b"hello world", "a.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "hello world");
        assert_eq!(records[0].filename(), Some("a.txt"));
        assert_eq!(
            records[0].processing_method(),
            Some(ProcessingMethod::TextChunking)
        );
        assert_eq!(records[0].metadata["chunk_number"], 1);
        assert_eq!(records[0].metadata["total_chunks"], 1);
    }

    #[test]
    fn exactly_limit_without_blank_lines_is_one_record() {
        let text = "a".repeat(4000);
        let records = TextLoader::default().load(text.as_bytes(), "a.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content.chars().count(), 4000);
    }

    #[test]
    fn one_over_limit_without_breaks_is_not_split() {
        let text = "a".repeat(4001);
        let records = TextLoader::default().load(text.as_bytes(), "a.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, text);
    }

    #[test]
    fn many_paragraphs_are_packed() {
        let paras: Vec<String> = (0..100)
            .map(|i| format!("{i:03}{}", "x".repeat(95)))
            .collect();
        let text = paras.join("\n\n");

        let records = TextLoader::default().load(text.as_bytes(), "long.txt").unwrap();
        assert_eq!(records.len(), 3);

        for (i, record) in records.iter().enumerate() {
            assert!(record.content.chars().count() <= 4000);
            assert_eq!(record.metadata["chunk_number"], i + 1);
            assert_eq!(record.metadata["total_chunks"], 3);
        }

        let rejoined: Vec<&str> = records.iter().flat_map(|r| paragraphs(&r.content)).collect();
        assert_eq!(rejoined, paras.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn blank_text_is_single_record() {
        let records = TextLoader::default().load(b"   \n", "blank.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "   \n");
        assert_eq!(records[0].metadata["total_chunks"], 1);
    }

    #[test]
    fn empty_file_is_single_empty_record() {
        let records = TextLoader::default().load(b"", "empty.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "");
    }

    #[test]
    fn long_whitespace_without_paragraphs_is_kept_whole() {
        let text = " ".repeat(4500);
        let records = TextLoader::default().load(text.as_bytes(), "pad.txt").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, text);
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let result = TextLoader::default().load(&[0x66, 0xff, 0x6f], "bad.txt");
        assert!(matches!(result, Err(DocumentError::Encoding(_))));
    }

    #[test]
    fn supported_extensions_list() {
        let loader = TextLoader::default();
        let exts = loader.supported_extensions();
        assert!(exts.contains(&"txt"));
        assert!(exts.contains(&"md"));
        assert!(exts.contains(&"markdown"));
    }
}
