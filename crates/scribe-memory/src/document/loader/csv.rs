use csv::ReaderBuilder;

use super::super::{ChunkRecord, DocumentError, DocumentLoader, ProcessingMethod};
use super::decode_utf8;

/// Header-based CSV: one record per data row, rendered as `header: value` lines.
///
/// Rows may be ragged. Missing cells render empty; cells beyond the header row
/// are kept under positional `column_N` labels (1-based).
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLoader;

impl DocumentLoader for CsvLoader {
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError> {
        let text = decode_utf8(bytes)?;
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let width = headers.len().max(row.len());
            let content = (0..width)
                .map(|col| {
                    let value = row.get(col).unwrap_or("");
                    match headers.get(col) {
                        Some(header) => format!("{header}: {value}"),
                        None => format!("column_{}: {value}", col + 1),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            records.push(
                ChunkRecord::new(content, filename, ProcessingMethod::CsvRowExtraction)
                    .with("row_number", index + 1)
                    .with("csv_headers", headers.clone()),
            );
        }

        Ok(records)
    }

    fn mime_types(&self) -> &[&str] {
        &["text/csv"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }
}
