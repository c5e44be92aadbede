use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EncoderError, Result};
use crate::utils::normalizer::Norm;
use crate::vectorizer::{analyzer::Analyzer, tfidf::TFIDFEngine, TFIDFVectorizer};

/// current artifact layout version
pub const FORMAT_VERSION: u32 = 1;

/// On-disk form of a fitted [`TFIDFVectorizer`].
///
/// `vocabulary[i]` owns column `i` and has weight `idf[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TFIDFData {
    pub format_version: u32,
    pub analyzer: Analyzer,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
    pub norm: Norm,
    pub smooth_idf: bool,
    pub sublinear_tf: bool,
    pub doc_num: u64,
}

impl<E> From<&TFIDFVectorizer<E>> for TFIDFData
where
    E: TFIDFEngine,
{
    fn from(v: &TFIDFVectorizer<E>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            analyzer: v.analyzer.clone(),
            vocabulary: v.vocabulary.iter().map(|t| t.to_string()).collect(),
            idf: v.idf.clone(),
            norm: v.norm,
            smooth_idf: v.smooth_idf,
            sublinear_tf: v.sublinear_tf,
            doc_num: v.doc_num,
        }
    }
}

impl TFIDFData {
    /// Convert into a usable vectorizer, checking internal consistency.
    pub fn into_tf_idf_vectorizer<E>(self) -> std::result::Result<TFIDFVectorizer<E>, String>
    where
        E: TFIDFEngine,
    {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }
        if self.vocabulary.len() > u32::MAX as usize {
            return Err("vocabulary too large".to_string());
        }
        self.analyzer.validate()?;

        let mut vocabulary = IndexSet::with_capacity(self.vocabulary.len());
        for term in self.vocabulary {
            if !vocabulary.insert(term.into_boxed_str()) {
                return Err("vocabulary contains duplicate terms".to_string());
            }
        }
        Ok(TFIDFVectorizer {
            analyzer: self.analyzer,
            vocabulary,
            idf: self.idf,
            norm: self.norm,
            smooth_idf: self.smooth_idf,
            sublinear_tf: self.sublinear_tf,
            doc_num: self.doc_num,
            _marker: PhantomData,
        })
    }
}

/// Encoding of a model file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Cbor,
    Json,
}

impl ArtifactFormat {
    /// `.json` selects JSON, anything else CBOR
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Cbor,
        }
    }
}

impl<E> TFIDFVectorizer<E>
where
    E: TFIDFEngine,
{
    /// Write the model to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| EncoderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let data = TFIDFData::from(self);
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        match ArtifactFormat::from_path(path) {
            ArtifactFormat::Cbor => serde_cbor::to_writer(&mut writer, &data)
                .map_err(|e| EncoderError::Serialization(e.to_string()))?,
            ArtifactFormat::Json => serde_json::to_writer(&mut writer, &data)
                .map_err(|e| EncoderError::Serialization(e.to_string()))?,
        }
        writer.flush().map_err(io_err)?;
        info!(path = %path.display(), vocabulary = data.vocabulary.len(), "saved tf-idf model");
        Ok(())
    }

    /// Read a model written by [`TFIDFVectorizer::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format_err = |reason: String| EncoderError::ModelFormat {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|source| EncoderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let data: TFIDFData = match ArtifactFormat::from_path(path) {
            ArtifactFormat::Cbor => {
                serde_cbor::from_reader(reader).map_err(|e| format_err(e.to_string()))?
            }
            ArtifactFormat::Json => {
                serde_json::from_reader(reader).map_err(|e| format_err(e.to_string()))?
            }
        };
        let vectorizer = data.into_tf_idf_vectorizer().map_err(format_err)?;
        info!(
            path = %path.display(),
            vocabulary = vectorizer.vocabulary_size(),
            documents = vectorizer.doc_num(),
            "loaded tf-idf model"
        );
        Ok(vectorizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{FitOptions, TextVectorizer};

    fn fitted() -> TFIDFVectorizer {
        TFIDFVectorizer::fit(&["alpha beta", "beta gamma", "gamma delta"], &FitOptions::default()).unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("m.json")), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path(Path::new("m.JSON")), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path(Path::new("m.cbor")), ArtifactFormat::Cbor);
        assert_eq!(ArtifactFormat::from_path(Path::new("model")), ArtifactFormat::Cbor);
    }

    #[test]
    fn saved_model_transforms_identically() {
        let dir = tempfile::tempdir().unwrap();
        let v = fitted();
        for name in ["model.cbor", "model.json"] {
            let path = dir.path().join(name);
            v.save(&path).unwrap();
            let loaded: TFIDFVectorizer = TFIDFVectorizer::load(&path).unwrap();
            assert_eq!(loaded.dim(), v.dim());
            assert_eq!(
                loaded.transform(&["beta gamma gamma"]),
                v.transform(&["beta gamma gamma"])
            );
        }
    }

    #[test]
    fn rejects_inconsistent_data() {
        let mut data = TFIDFData::from(&fitted());
        data.idf.pop();
        assert!(data.into_tf_idf_vectorizer::<crate::DefaultTFIDFEngine>().is_err());

        let mut data = TFIDFData::from(&fitted());
        data.format_version = 99;
        assert!(data.into_tf_idf_vectorizer::<crate::DefaultTFIDFEngine>().is_err());

        let mut data = TFIDFData::from(&fitted());
        data.vocabulary[1] = data.vocabulary[0].clone();
        assert!(data.into_tf_idf_vectorizer::<crate::DefaultTFIDFEngine>().is_err());
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cbor");
        std::fs::write(&path, b"not a model").unwrap();
        let err = TFIDFVectorizer::<crate::DefaultTFIDFEngine>::load(&path).unwrap_err();
        assert!(matches!(err, EncoderError::ModelFormat { .. }));
    }
}
