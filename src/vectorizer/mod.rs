pub mod analyzer;
pub mod corpus;
pub mod serde;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use ::serde::{Deserialize, Serialize};
use indexmap::IndexSet;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{EncoderError, Result};
use crate::utils::{normalizer::Norm, sparse::SparseVector};
use crate::vectorizer::{
    analyzer::Analyzer,
    corpus::Corpus,
    tfidf::{DefaultTFIDFEngine, TFIDFEngine},
};

/// Anything that turns a batch of texts into one sparse row per text.
///
/// Row `i` of the output must belong to `texts[i]`.
pub trait TextVectorizer: Send + Sync {
    fn transform(&self, texts: &[&str]) -> Vec<SparseVector>;

    /// number of columns of every produced row
    fn dim(&self) -> usize;
}

/// Settings used when fitting a [`TFIDFVectorizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub analyzer: Analyzer,
    /// drop terms found in fewer documents
    pub min_df: u64,
    /// drop terms found in more than this share of documents, in (0, 1]
    pub max_df: f64,
    /// keep only the terms with the highest document frequency
    pub max_features: Option<usize>,
    pub smooth_idf: bool,
    pub sublinear_tf: bool,
    pub norm: Norm,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            analyzer: Analyzer::default(),
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            smooth_idf: true,
            sublinear_tf: false,
            norm: Norm::L2,
        }
    }
}

/// A fitted TF-IDF model.
///
/// Holds the analyzer, the sorted vocabulary (term -> column) and one idf
/// weight per column. Fitting happens once, offline; afterwards the model is
/// read-only and [`TextVectorizer::transform`] may run from many threads.
///
/// `E` is the weighting engine, [`DefaultTFIDFEngine`] unless replaced.
#[derive(Debug, Clone)]
pub struct TFIDFVectorizer<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    pub(crate) analyzer: Analyzer,
    /// column order == insertion order
    pub(crate) vocabulary: IndexSet<Box<str>>,
    pub(crate) idf: Vec<f32>,
    pub(crate) norm: Norm,
    pub(crate) smooth_idf: bool,
    pub(crate) sublinear_tf: bool,
    pub(crate) doc_num: u64,
    pub(crate) _marker: PhantomData<E>,
}

impl<E> TFIDFVectorizer<E>
where
    E: TFIDFEngine,
{
    /// Learn vocabulary and idf weights from `texts`.
    pub fn fit<T>(texts: &[T], options: &FitOptions) -> Result<Self>
    where
        T: AsRef<str> + Sync,
    {
        options
            .analyzer
            .validate()
            .map_err(|reason| EncoderError::InvalidParameter { name: "ngram_range", reason })?;
        if !(options.max_df > 0.0 && options.max_df <= 1.0) {
            return Err(EncoderError::InvalidParameter {
                name: "max_df",
                reason: format!("{} is not in (0, 1]", options.max_df),
            });
        }

        let corpus = Corpus::new();
        texts.par_iter().for_each(|text| {
            let freq = options.analyzer.analyze(text.as_ref());
            corpus.add_set(&freq.token_set_ref_str());
        });

        let doc_num = corpus.get_doc_num();
        let max_doc_count = (options.max_df * doc_num as f64).floor() as u64;
        let mut terms: Vec<(Box<str>, u64)> = corpus
            .sorted_terms()
            .into_iter()
            .filter(|(_, df)| *df >= options.min_df && *df <= max_doc_count)
            .collect();

        if let Some(limit) = options.max_features {
            if terms.len() > limit {
                // stable sort keeps alphabetical order among equal frequencies
                terms.sort_by(|a, b| b.1.cmp(&a.1));
                terms.truncate(limit);
                terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            }
        }

        let idf = terms
            .iter()
            .map(|(_, df)| E::idf(doc_num, *df, options.smooth_idf))
            .collect();
        let vocabulary: IndexSet<Box<str>> = terms.into_iter().map(|(term, _)| term).collect();

        info!(
            documents = doc_num,
            corpus_terms = corpus.vocab_size(),
            vocabulary = vocabulary.len(),
            "fitted tf-idf vectorizer"
        );

        Ok(Self {
            analyzer: options.analyzer.clone(),
            vocabulary,
            idf,
            norm: options.norm,
            smooth_idf: options.smooth_idf,
            sublinear_tf: options.sublinear_tf,
            doc_num,
            _marker: PhantomData,
        })
    }

    /// Vectorize a single text.
    /// Terms outside the vocabulary are ignored.
    pub fn transform_one(&self, text: &str) -> SparseVector {
        let freq = self.analyzer.analyze(text);
        let mut indices = Vec::with_capacity(freq.token_num());
        let mut values = Vec::with_capacity(freq.token_num());
        for (term, count) in freq.iter() {
            if let Some(col) = self.vocabulary.get_index_of(term) {
                indices.push(col as u32);
                values.push(E::tf(count, self.sublinear_tf) * self.idf[col]);
            }
        }
        self.norm.apply(&mut values);
        SparseVector::from_unique_parts(self.vocabulary.len() as u32, indices, values)
    }

    /// number of documents the model was fitted on
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// column of `term`
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get_index_of(term)
    }

    /// term stored in column `index`
    pub fn term(&self, index: usize) -> Option<&str> {
        self.vocabulary.get_index(index).map(|t| &**t)
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_index(term).map(|col| self.idf[col])
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    pub fn smooth_idf(&self) -> bool {
        self.smooth_idf
    }
}

impl<E> TextVectorizer for TFIDFVectorizer<E>
where
    E: TFIDFEngine + Send + Sync,
{
    fn transform(&self, texts: &[&str]) -> Vec<SparseVector> {
        debug!(texts = texts.len(), "tf-idf transform");
        texts.par_iter().map(|text| self.transform_one(text)).collect()
    }

    fn dim(&self) -> usize {
        self.vocabulary.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "the cat sat on the mat",
            "the dog sat on the log",
            "cats and dogs",
        ]
    }

    fn fit(options: &FitOptions) -> TFIDFVectorizer {
        TFIDFVectorizer::fit(&corpus(), options).unwrap()
    }

    #[test]
    fn vocabulary_is_sorted() {
        let v = fit(&FitOptions::default());
        let terms: Vec<&str> = (0..v.vocabulary_size()).filter_map(|i| v.term(i)).collect();
        let mut sorted = terms.clone();
        sorted.sort_unstable();
        assert_eq!(terms, sorted);
        assert_eq!(v.doc_num(), 3);
        assert!(v.term_index("sat").is_some());
        // single-char tokens never enter the vocabulary
        assert!(v.term_index("a").is_none());
    }

    #[test]
    fn smoothed_idf_values() {
        let v = fit(&FitOptions::default());
        // "sat" in 2 of 3 documents: ln(4 / 3) + 1
        let expected = (4.0f32 / 3.0).ln() + 1.0;
        assert!((v.idf("sat").unwrap() - expected).abs() < 1e-6);
        // "cats" in 1 of 3 documents: ln(4 / 2) + 1
        let expected = 2.0f32.ln() + 1.0;
        assert!((v.idf("cats").unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn transform_matches_hand_computation() {
        let v = fit(&FitOptions {
            norm: Norm::None,
            ..FitOptions::default()
        });
        let row = v.transform_one("the the cat");
        let the = v.term_index("the").unwrap() as u32;
        let cat = v.term_index("cat").unwrap() as u32;
        assert_eq!(row.nnz(), 2);
        assert!((row.get(the) - 2.0 * v.idf("the").unwrap()).abs() < 1e-6);
        assert!((row.get(cat) - v.idf("cat").unwrap()).abs() < 1e-6);
    }

    #[test]
    fn l2_rows_have_unit_length() {
        let v = fit(&FitOptions::default());
        for text in corpus() {
            let row = v.transform_one(text);
            assert!((row.norm_l2() - 1.0).abs() < 1e-5);
            assert_eq!(row.dim() as usize, v.dim());
        }
    }

    #[test]
    fn unknown_text_gives_zero_row() {
        let v = fit(&FitOptions::default());
        let row = v.transform_one("zebra xylophone");
        assert_eq!(row.nnz(), 0);
        assert_eq!(row.dim() as usize, v.vocabulary_size());
        assert_eq!(v.transform_one("").nnz(), 0);
    }

    #[test]
    fn transform_preserves_order() {
        let v = fit(&FitOptions::default());
        let texts = corpus();
        let rows = v.transform(&texts);
        assert_eq!(rows.len(), texts.len());
        for (row, text) in rows.iter().zip(&texts) {
            assert_eq!(*row, v.transform_one(text));
        }
    }

    #[test]
    fn df_limits_and_max_features() {
        let v = fit(&FitOptions {
            min_df: 2,
            ..FitOptions::default()
        });
        let terms: Vec<&str> = (0..v.vocabulary_size()).filter_map(|i| v.term(i)).collect();
        assert_eq!(terms, vec!["on", "sat", "the"]);

        let v = fit(&FitOptions {
            max_df: 0.5,
            ..FitOptions::default()
        });
        assert!(v.term_index("the").is_none());
        assert!(v.term_index("cat").is_some());

        let v = fit(&FitOptions {
            max_features: Some(2),
            ..FitOptions::default()
        });
        // df 2 for on, sat, the; alphabetical tie break keeps on and sat
        let terms: Vec<&str> = (0..v.vocabulary_size()).filter_map(|i| v.term(i)).collect();
        assert_eq!(terms, vec!["on", "sat"]);
    }

    #[test]
    fn sublinear_and_bigrams() {
        let v = fit(&FitOptions {
            sublinear_tf: true,
            norm: Norm::None,
            analyzer: Analyzer {
                ngram_range: (1, 2),
                ..Analyzer::default()
            },
            ..FitOptions::default()
        });
        assert!(v.term_index("sat on").is_some());
        let row = v.transform_one("mat mat mat");
        let mat = v.term_index("mat").unwrap() as u32;
        let expected = (1.0 + 3.0f32.ln()) * v.idf("mat").unwrap();
        assert!((row.get(mat) - expected).abs() < 1e-5);
    }

    #[test]
    fn rejects_bad_options() {
        let err = TFIDFVectorizer::<DefaultTFIDFEngine>::fit(
            &corpus(),
            &FitOptions {
                max_df: 0.0,
                ..FitOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, EncoderError::InvalidParameter { name: "max_df", .. }));
    }
}
