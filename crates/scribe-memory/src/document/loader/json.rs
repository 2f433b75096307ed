use serde_json::Value;

use super::super::{ChunkRecord, DocumentError, DocumentLoader, ProcessingMethod};
use super::decode_utf8;

/// JSON documents. A top-level array yields one record per item.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl DocumentLoader for JsonLoader {
    fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<ChunkRecord>, DocumentError> {
        let text = decode_utf8(bytes)?;
        let root: Value = serde_json::from_str(text)?;

        match root {
            Value::Array(items) => {
                let total = items.len();
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| -> Result<ChunkRecord, DocumentError> {
                        Ok(ChunkRecord::new(
                            serde_json::to_string_pretty(item)?,
                            filename,
                            ProcessingMethod::JsonItemExtraction,
                        )
                        .with("item_index", index)
                        .with("total_items", total))
                    })
                    .collect()
            }
            Value::Object(map) => Ok(vec![ChunkRecord::new(
                serde_json::to_string_pretty(&map)?,
                filename,
                ProcessingMethod::JsonExtraction,
            )]),
            Value::String(s) => Ok(vec![ChunkRecord::new(
                s,
                filename,
                ProcessingMethod::JsonExtraction,
            )]),
            scalar => Ok(vec![ChunkRecord::new(
                scalar.to_string(),
                filename,
                ProcessingMethod::JsonExtraction,
            )]),
        }
    }

    fn mime_types(&self) -> &[&str] {
        &["application/json"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}
