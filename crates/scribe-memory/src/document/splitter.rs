/// Default chunk size limit, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 4000;

/// Inserted between paragraphs packed into the same chunk.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

const SEPARATOR_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub max_chunk_chars: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// Greedy paragraph packer.
///
/// Paragraphs are never split: a single paragraph longer than the limit becomes
/// a chunk of its own.
#[derive(Debug, Clone, Default)]
pub struct ParagraphSplitter {
    config: SplitterConfig,
}

impl ParagraphSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn max_chunk_chars(&self) -> usize {
        self.config.max_chunk_chars
    }

    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let limit = self.config.max_chunk_chars;
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for paragraph in paragraphs(text) {
            let len = paragraph.chars().count();

            if current.is_empty() {
                current.push_str(paragraph);
                current_chars = len;
                continue;
            }

            if current_chars + SEPARATOR_CHARS + len <= limit {
                current.push_str(PARAGRAPH_SEPARATOR);
                current.push_str(paragraph);
                current_chars += SEPARATOR_CHARS + len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(paragraph);
                current_chars = len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Split `text` on blank lines, returning each paragraph as a slice of the input.
///
/// A line holding only whitespace counts as blank. Line endings inside a
/// paragraph are preserved; the terminator of its last line is not.
#[must_use]
pub fn paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                paragraphs.push(&text[s..end]);
            }
        } else {
            start.get_or_insert(line_start);
            end = line_start + line.trim_end_matches(['\r', '\n']).len();
        }
    }

    if let Some(s) = start {
        paragraphs.push(&text[s..end]);
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(max_chunk_chars: usize) -> ParagraphSplitter {
        ParagraphSplitter::new(SplitterConfig { max_chunk_chars })
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(splitter(10).split("").is_empty());
        assert!(splitter(10).split("\n\n   \n").is_empty());
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let text = "first line\nstill first\n\nsecond\n \t\nthird\n";
        assert_eq!(
            paragraphs(text),
            vec!["first line\nstill first", "second", "third"]
        );
    }

    #[test]
    fn paragraphs_handle_crlf() {
        assert_eq!(paragraphs("a\r\n\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn packs_while_under_limit() {
        let chunks = splitter(9).split("aaa\n\nbbb\n\nccc");
        assert_eq!(chunks, vec!["aaa\n\nbbb", "ccc"]);
    }

    #[test]
    fn exact_limit_stays_in_same_chunk() {
        // "aaa" + "\n\n" + "bbbb" == 9 chars
        let chunks = splitter(9).split("aaa\n\nbbbb");
        assert_eq!(chunks, vec!["aaa\n\nbbbb"]);
    }

    #[test]
    fn oversized_paragraph_is_not_split() {
        let long = "x".repeat(25);
        let text = format!("aa\n\n{long}\n\nbb");
        let chunks = splitter(10).split(&text);
        assert_eq!(chunks, vec!["aa".to_owned(), long, "bb".to_owned()]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // four 2-byte chars per paragraph
        let chunks = splitter(10).split("éééé\n\néééé");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn ten_thousand_chars_of_short_paragraphs() {
        let paragraph = "p".repeat(98);
        let paras: Vec<String> = (0..100).map(|_| paragraph.clone()).collect();
        let text = paras.join("\n\n");
        assert_eq!(text.chars().count(), 100 * 98 + 99 * 2);

        let chunks = splitter(DEFAULT_CHUNK_CHARS).split(&text);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= DEFAULT_CHUNK_CHARS);
        }

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| paragraphs(c)).collect();
        assert_eq!(rejoined, paras.iter().map(String::as_str).collect::<Vec<_>>());
    }

    mod proptest_splitter {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn split_never_panics(
                content in "\\PC{0,3000}",
                max_chunk_chars in 1usize..2000,
            ) {
                let _ = splitter(max_chunk_chars).split(&content);
            }

            #[test]
            fn no_empty_chunks(
                content in "[a-z \n]{0,800}",
                max_chunk_chars in 1usize..200,
            ) {
                for chunk in splitter(max_chunk_chars).split(&content) {
                    prop_assert!(!chunk.trim().is_empty());
                }
            }

            #[test]
            fn chunks_preserve_paragraph_order(
                content in "[a-z]{1,30}(\n\n[a-z]{1,30}){0,40}",
                max_chunk_chars in 1usize..150,
            ) {
                let chunks = splitter(max_chunk_chars).split(&content);
                let rejoined: Vec<&str> = chunks.iter().flat_map(|c| paragraphs(c)).collect();
                prop_assert_eq!(rejoined, paragraphs(&content));
            }

            #[test]
            fn multi_paragraph_chunks_respect_limit(
                content in "[a-z]{1,30}(\n\n[a-z]{1,30}){0,40}",
                max_chunk_chars in 1usize..150,
            ) {
                for chunk in splitter(max_chunk_chars).split(&content) {
                    if paragraphs(&chunk).len() > 1 {
                        prop_assert!(chunk.chars().count() <= max_chunk_chars);
                    }
                }
            }
        }
    }
}
