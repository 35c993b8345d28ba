//! Line-delimited JSON records for the outline stream

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ContentItem, ItemKind};

/// One line of the outline stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamRecord {
    Goal { id: String, text: String },
    Task { id: String, text: String },
    /// Terminal record: the text source failed and nothing follows.
    Error { message: String },
}

impl StreamRecord {
    /// Serialize as a single NDJSON line, newline included.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn kind(&self) -> Option<ItemKind> {
        match self {
            StreamRecord::Goal { .. } => Some(ItemKind::Goal),
            StreamRecord::Task { .. } => Some(ItemKind::Task),
            StreamRecord::Error { .. } => None,
        }
    }

    pub fn into_item(self) -> Option<ContentItem> {
        match self {
            StreamRecord::Goal { id, text } => Some(ContentItem {
                kind: ItemKind::Goal,
                id,
                text,
            }),
            StreamRecord::Task { id, text } => Some(ContentItem {
                kind: ItemKind::Task,
                id,
                text,
            }),
            StreamRecord::Error { .. } => None,
        }
    }
}

impl From<ContentItem> for StreamRecord {
    fn from(item: ContentItem) -> Self {
        match item.kind {
            ItemKind::Goal => StreamRecord::Goal {
                id: item.id,
                text: item.text,
            },
            ItemKind::Task => StreamRecord::Task {
                id: item.id,
                text: item.text,
            },
        }
    }
}

/// Incremental NDJSON reader. Chunks may split records anywhere.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: String,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_chunk(&mut self, chunk: &str) -> Vec<StreamRecord> {
        self.buffer.push_str(chunk);
        let mut records = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer.drain(..=pos).collect::<String>();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<StreamRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::debug!("Skipping unparsable stream line: {}", e);
                }
            }
        }

        records
    }

    /// Bytes received after the last newline.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_keeps_unicode_raw() {
        let record = StreamRecord::Goal {
            id: "g_00aa11bb".into(),
            text: "тема «кавычки \"внутри\"»".into(),
        };
        let line = record.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("тема «кавычки"));
        assert!(line.starts_with(r#"{"type":"goal","id":"g_00aa11bb""#));
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = RecordDecoder::new();
        let first = r#"{"type":"goal","id":"g_1","text":"Пер"#;
        let second = "вая\"}\n{\"type\":\"task\",\"id\":\"t_2\",\"text\":\"B\"}\n{\"type\"";

        assert!(decoder.parse_chunk(first).is_empty());
        let records = decoder.parse_chunk(second);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            StreamRecord::Goal {
                id: "g_1".into(),
                text: "Первая".into()
            }
        );
        assert_eq!(records[1].kind(), Some(ItemKind::Task));
        assert_eq!(decoder.pending(), "{\"type\"");
    }

    #[test]
    fn test_decoder_skips_blank_and_malformed_lines() {
        let mut decoder = RecordDecoder::new();
        let records = decoder.parse_chunk("\n\nnot json\n{\"type\":\"error\",\"message\":\"x\"}\n");
        assert_eq!(
            records,
            vec![StreamRecord::Error {
                message: "x".into()
            }]
        );
    }

    #[test]
    fn test_item_round_trips_through_record() {
        let item = ContentItem::new(ItemKind::Task, "Сформулировать рекомендации");
        let record = StreamRecord::from(item.clone());
        assert_eq!(record.into_item(), Some(item));
    }
}
