//! This crate is a pipeline plugin that encodes document text into sparse
//! TF-IDF embeddings using a vectorizer fitted ahead of time.
pub mod config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod traversal;
pub mod utils;
pub mod vectorizer;

/// TF-IDF Text Encoder
/// The top-level struct of this crate.
/// It loads a fitted vectorizer from disk once, then for every request:
/// - selects documents along a traversal path (`r`, `c`, `m`, ...)
/// - skips documents without text
/// - transforms the remaining texts batch by batch
/// - stores the resulting sparse vector in each document's `embedding`
///
/// `TfidfTextEncoder<V>` is generic over the vectorizer; `V` defaults to
/// `TFIDFVectorizer`, any `TextVectorizer` can be plugged in.
pub use encoder::TfidfTextEncoder;

/// Encoder settings
/// - `EncoderConfig`: constructor-time settings, loadable from TOML
/// - `RequestParameters`: per-request overrides of batch size and traversal path
pub use config::{EncoderConfig, RequestParameters};

/// Document model handed to the encoder.
pub use document::Document;

/// Traversal Path
/// Selects which levels of the document tree are encoded.
pub use traversal::TraversalPath;

pub use error::EncoderError;

/// Fitted TF-IDF vectorizer
/// Holds the analyzer settings, the sorted vocabulary and the idf weights.
/// Fitted with `TFIDFVectorizer::fit`, stored with `save` / `load`.
///
/// # Serialization
/// Supported through `TFIDFData`, encoded as CBOR or JSON depending on the
/// file extension.
pub use vectorizer::{FitOptions, TFIDFVectorizer, TextVectorizer};

/// Serializable form of a fitted vectorizer.
pub use vectorizer::serde::TFIDFData;

/// Document frequency statistics collected while fitting.
/// Thread-safe, implemented with DashMap and atomics.
pub use vectorizer::corpus::Corpus;

/// Token Frequency structure
/// Counts token occurrences within one document.
pub use vectorizer::token::TokenFrequency;

/// Text analyzer: tokenization, lowercasing, stop words and n-grams.
pub use vectorizer::analyzer::Analyzer;

/// TF IDF Calculation Engine Trait
/// Defines the tf and idf weighting used by `TFIDFVectorizer<E>`.
/// `DefaultTFIDFEngine` implements smoothed idf and optional sublinear tf.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Sparse embedding row and its normalization.
pub use utils::{normalizer::Norm, sparse::SparseVector};
