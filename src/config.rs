use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EncoderError, Result};

/// Constructor-time settings of [`TfidfTextEncoder`](crate::TfidfTextEncoder).
///
/// Loadable from TOML; missing keys take the defaults below.
///
/// ```toml
/// path_vectorizer = "model/tfidf_vectorizer.cbor"
/// default_batch_size = 2048
/// default_traversal_path = "r"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// fitted vectorizer artifact
    pub path_vectorizer: PathBuf,
    /// batch size when the request does not set one
    pub default_batch_size: usize,
    /// traversal path when the request does not set one
    pub default_traversal_path: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            path_vectorizer: PathBuf::from("model/tfidf_vectorizer.cbor"),
            default_batch_size: 2048,
            default_traversal_path: "r".to_string(),
        }
    }
}

impl EncoderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EncoderError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EncoderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Per-request overrides.
///
/// Deserialized from the free-form parameters object sent with a request;
/// keys other than these two are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestParameters {
    pub traversal_path: Option<String>,
    pub batch_size: Option<usize>,
}

impl RequestParameters {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| EncoderError::InvalidParameter {
            name: "parameters",
            reason: e.to_string(),
        })
    }
}
