use serde::{Deserialize, Serialize};

use crate::utils::sparse::SparseVector;

/// A document as handed over by the pipeline.
///
/// Only the parts the encoder touches are modelled: the optional text, the
/// embedding slot it fills, and the nested chunks / matches that traversal
/// paths can reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<SparseVector>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<Document>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Document>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn push_chunk(&mut self, chunk: Document) -> &mut Self {
        self.chunks.push(chunk);
        self
    }

    pub fn push_match(&mut self, m: Document) -> &mut Self {
        self.matches.push(m);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_skips_empty_fields() {
        let doc = Document::with_text("d1", "hello");
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"id":"d1","text":"hello"}"#);
    }

    #[test]
    fn json_missing_fields_default() {
        let doc: Document = serde_json::from_str(r#"{"id":"x","chunks":[{"text":"c"}]}"#).unwrap();
        assert_eq!(doc.text, None);
        assert_eq!(doc.chunks[0].text.as_deref(), Some("c"));
        assert!(doc.chunks[0].id.is_empty());
    }
}
