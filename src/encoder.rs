use tracing::{debug, info, instrument};

use crate::config::{EncoderConfig, RequestParameters};
use crate::document::Document;
use crate::error::{EncoderError, Result};
use crate::traversal::{DocAddress, TraversalPath};
use crate::vectorizer::{TFIDFVectorizer, TextVectorizer};

/// Split `data` into consecutive batches of at most `batch_size` items.
/// `batch_size` must be non-zero.
pub fn batch_generator<T>(data: &[T], batch_size: usize) -> std::slice::Chunks<'_, T> {
    data.chunks(batch_size)
}

/// Encodes document text into sparse TF-IDF embeddings.
///
/// Wraps a fitted vectorizer loaded at construction. Each [`encode`] call
/// selects documents along a traversal path, skips those without text, and
/// stores one [`SparseVector`](crate::SparseVector) per document in
/// [`Document::embedding`], working through the selection in batches.
///
/// [`encode`]: TfidfTextEncoder::encode
#[derive(Debug)]
pub struct TfidfTextEncoder<V = TFIDFVectorizer>
where
    V: TextVectorizer,
{
    config: EncoderConfig,
    vectorizer: V,
}

impl TfidfTextEncoder {
    /// Load the vectorizer named by `config.path_vectorizer`.
    ///
    /// Fails with [`EncoderError::PretrainedModelFileDoesNotExist`] when the
    /// file is missing.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        if !config.path_vectorizer.exists() {
            return Err(EncoderError::PretrainedModelFileDoesNotExist(
                config.path_vectorizer.clone(),
            ));
        }
        let vectorizer = TFIDFVectorizer::load(&config.path_vectorizer)?;
        Self::with_vectorizer(config, vectorizer)
    }
}

impl<V> TfidfTextEncoder<V>
where
    V: TextVectorizer,
{
    /// Wrap an already loaded vectorizer.
    pub fn with_vectorizer(config: EncoderConfig, vectorizer: V) -> Result<Self> {
        if config.default_batch_size == 0 {
            return Err(EncoderError::InvalidParameter {
                name: "default_batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        // fail at startup rather than on the first request
        config.default_traversal_path.parse::<TraversalPath>()?;
        Ok(Self { config, vectorizer })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn vectorizer(&self) -> &V {
        &self.vectorizer
    }

    /// Generate the TF-IDF vector of every selected document with text and
    /// store it in `doc.embedding`.
    ///
    /// Absent or empty `docs` is a no-op. Returns the number of documents
    /// that received an embedding.
    #[instrument(skip_all, fields(docs = docs.as_ref().map_or(0, |d| d.len())))]
    pub fn encode(&self, docs: Option<&mut [Document]>, parameters: &RequestParameters) -> Result<usize> {
        let docs = match docs {
            Some(docs) if !docs.is_empty() => docs,
            _ => return Ok(0),
        };
        let (addresses, batch_size) = self.get_input_data(docs, parameters)?;
        let encoded = self.create_embeddings(docs, &addresses, batch_size)?;
        info!(encoded, batch_size, "encoded documents");
        Ok(encoded)
    }

    /// Resolve request overrides, then pick the documents to encode.
    fn get_input_data(
        &self,
        docs: &[Document],
        parameters: &RequestParameters,
    ) -> Result<(Vec<DocAddress>, usize)> {
        let traversal_path: TraversalPath = parameters
            .traversal_path
            .as_deref()
            .unwrap_or(&self.config.default_traversal_path)
            .parse()?;
        let batch_size = parameters.batch_size.unwrap_or(self.config.default_batch_size);
        if batch_size == 0 {
            return Err(EncoderError::InvalidParameter {
                name: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }

        let selected = traversal_path.addresses(docs);
        let total = selected.len();
        // documents without text are skipped
        let filtered: Vec<DocAddress> = selected
            .into_iter()
            .filter(|addr| addr.resolve(docs).is_some_and(|doc| doc.text.is_some()))
            .collect();
        debug!(
            traversal_path = %traversal_path,
            selected = total,
            with_text = filtered.len(),
            "selected documents"
        );
        Ok((filtered, batch_size))
    }

    /// Transform every batch first, then write all rows back.
    /// A failing batch leaves every document untouched.
    fn create_embeddings(
        &self,
        docs: &mut [Document],
        addresses: &[DocAddress],
        batch_size: usize,
    ) -> Result<usize> {
        let mut rows = Vec::with_capacity(addresses.len());
        for (batch_idx, batch) in batch_generator(addresses, batch_size).enumerate() {
            let texts: Vec<&str> = batch
                .iter()
                .filter_map(|addr| addr.resolve(docs))
                .filter_map(|doc| doc.text.as_deref())
                .collect();
            let embeddings = self.vectorizer.transform(&texts);
            if embeddings.len() != texts.len() || texts.len() != batch.len() {
                return Err(EncoderError::TransformMismatch {
                    expected: batch.len(),
                    got: embeddings.len(),
                });
            }
            debug!(batch = batch_idx, size = batch.len(), "transformed batch");
            rows.extend(embeddings);
        }

        let mut encoded = 0;
        for (addr, embedding) in addresses.iter().zip(rows) {
            if let Some(doc) = addr.resolve_mut(docs) {
                doc.embedding = Some(embedding);
                encoded += 1;
            }
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sparse::SparseVector;
    use crate::vectorizer::FitOptions;

    /// Returns one fewer row than asked for.
    #[derive(Debug)]
    struct ShortVectorizer;

    impl TextVectorizer for ShortVectorizer {
        fn transform(&self, texts: &[&str]) -> Vec<SparseVector> {
            texts.iter().skip(1).map(|_| SparseVector::zeros(1)).collect()
        }

        fn dim(&self) -> usize {
            1
        }
    }

    /// Answers the first call, then returns no rows.
    #[derive(Debug, Default)]
    struct FailsAfterFirstCall {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl TextVectorizer for FailsAfterFirstCall {
        fn transform(&self, texts: &[&str]) -> Vec<SparseVector> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                texts.iter().map(|_| SparseVector::zeros(1)).collect()
            } else {
                Vec::new()
            }
        }

        fn dim(&self) -> usize {
            1
        }
    }

    fn encoder() -> TfidfTextEncoder {
        let v = TFIDFVectorizer::fit(
            &["rust is fast", "rust is safe", "python is dynamic"],
            &FitOptions::default(),
        )
        .unwrap();
        TfidfTextEncoder::with_vectorizer(EncoderConfig::default(), v).unwrap()
    }

    #[test]
    fn batches_cover_everything() {
        let data: Vec<u32> = (0..7).collect();
        let batches: Vec<&[u32]> = batch_generator(&data, 3).collect();
        assert_eq!(batches, vec![&[0, 1, 2][..], &[3, 4, 5][..], &[6][..]]);
    }

    #[test]
    fn none_and_empty_are_noops() {
        let enc = encoder();
        assert_eq!(enc.encode(None, &RequestParameters::default()).unwrap(), 0);
        let mut docs: Vec<Document> = Vec::new();
        assert_eq!(enc.encode(Some(docs.as_mut_slice()), &RequestParameters::default()).unwrap(), 0);
    }

    #[test]
    fn skips_documents_without_text() {
        let enc = encoder();
        let mut docs = vec![
            Document::with_text("a", "rust is fast"),
            Document::new("b"),
            Document::with_text("c", ""),
        ];
        let n = enc.encode(Some(docs.as_mut_slice()), &RequestParameters::default()).unwrap();
        assert_eq!(n, 2);
        assert!(docs[0].embedding.as_ref().unwrap().nnz() > 0);
        assert!(docs[1].embedding.is_none());
        // empty text is still text
        assert_eq!(docs[2].embedding.as_ref().unwrap().nnz(), 0);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let enc = encoder();
        let mut docs = vec![Document::with_text("a", "rust")];
        let params = RequestParameters {
            batch_size: Some(0),
            ..RequestParameters::default()
        };
        let err = enc.encode(Some(docs.as_mut_slice()), &params).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidParameter { name: "batch_size", .. }));
        assert!(docs[0].embedding.is_none());

        let config = EncoderConfig {
            default_batch_size: 0,
            ..EncoderConfig::default()
        };
        assert!(TfidfTextEncoder::with_vectorizer(config, ShortVectorizer).is_err());
    }

    #[test]
    fn bad_default_traversal_path_fails_at_construction() {
        let config = EncoderConfig {
            default_traversal_path: "q".to_string(),
            ..EncoderConfig::default()
        };
        let err = TfidfTextEncoder::with_vectorizer(config, ShortVectorizer).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidTraversalPath { .. }));
    }

    #[test]
    fn short_transform_output_is_an_error() {
        let enc = TfidfTextEncoder::with_vectorizer(EncoderConfig::default(), ShortVectorizer).unwrap();
        let mut docs = vec![Document::with_text("a", "x"), Document::with_text("b", "y")];
        let err = enc.encode(Some(docs.as_mut_slice()), &RequestParameters::default()).unwrap_err();
        assert!(matches!(err, EncoderError::TransformMismatch { expected: 2, got: 1 }));
        assert!(docs.iter().all(|d| d.embedding.is_none()));
    }

    #[test]
    fn missing_model_file() {
        let config = EncoderConfig {
            path_vectorizer: "/definitely/not/here.cbor".into(),
            ..EncoderConfig::default()
        };
        let err = TfidfTextEncoder::new(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "/definitely/not/here.cbor not found, cannot find a fitted tfidf_vectorizer"
        );
    }

    #[test]
    fn failing_later_batch_leaves_all_documents_untouched() {
        let enc = TfidfTextEncoder::with_vectorizer(EncoderConfig::default(), FailsAfterFirstCall::default()).unwrap();
        let mut docs = vec![Document::with_text("a", "first"), Document::with_text("b", "second")];
        let params = RequestParameters {
            batch_size: Some(1),
            ..RequestParameters::default()
        };
        let err = enc.encode(Some(docs.as_mut_slice()), &params).unwrap_err();
        assert!(matches!(err, EncoderError::TransformMismatch { expected: 1, got: 0 }));
        assert!(docs[0].embedding.is_none());
        assert!(docs[1].embedding.is_none());
    }
}
