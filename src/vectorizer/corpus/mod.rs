use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use dashmap::DashMap;

/// Document frequency statistics collected while fitting.
///
/// Keeps the number of documents seen and, for every term, the number of
/// documents containing it. Documents can be added from several threads.
#[derive(Debug, Default)]
pub struct Corpus {
    /// documents added so far
    pub doc_num: AtomicU64,
    /// term -> number of documents containing it
    pub term_counts: DashMap<Box<str>, u64, RandomState>,
}

impl Clone for Corpus {
    fn clone(&self) -> Self {
        Self {
            doc_num: AtomicU64::new(self.doc_num.load(Ordering::Acquire)),
            term_counts: self.term_counts.clone(),
        }
    }
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            doc_num: AtomicU64::new(0),
            term_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add one document given its distinct terms.
    /// Callers must pass each term at most once per document.
    pub fn add_set<T>(&self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num.fetch_add(1, Ordering::Relaxed);
        for term in terms {
            self.term_counts
                .entry(term.as_ref().into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num.load(Ordering::Relaxed)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// Snapshot of (term, document frequency), sorted by term.
    pub fn sorted_terms(&self) -> Vec<(Box<str>, u64)> {
        let mut terms: Vec<(Box<str>, u64)> = self
            .term_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        terms
    }
}
