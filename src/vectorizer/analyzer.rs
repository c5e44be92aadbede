use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TokenFrequency;

/// Text analysis settings stored alongside the fitted vocabulary.
///
/// The same settings must be used at fit and transform time, so they travel
/// inside the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analyzer {
    /// lowercase text before tokenizing
    pub lowercase: bool,
    /// inclusive (min, max) word n-gram sizes
    pub ngram_range: (usize, usize),
    /// tokens shorter than this (in chars) are dropped
    pub min_token_len: usize,
    /// tokens removed before n-grams are built
    pub stop_words: Vec<String>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            lowercase: true,
            ngram_range: (1, 1),
            min_token_len: 2,
            stop_words: Vec::new(),
        }
    }
}

impl Analyzer {
    /// Split `text` into word tokens.
    ///
    /// A token is a maximal run of alphanumeric characters or `_`.
    /// Lowercasing runs over the whole text, so a word-final `Σ` becomes `ς`.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };
        let mut tokens = Vec::new();
        let mut buf = String::new();
        let mut buf_chars = 0usize;
        for c in text.chars() {
            if c.is_alphanumeric() || c == '_' {
                buf.push(c);
                buf_chars += 1;
            } else if !buf.is_empty() {
                self.flush(&mut buf, buf_chars, &mut tokens);
                buf_chars = 0;
            }
        }
        if !buf.is_empty() {
            self.flush(&mut buf, buf_chars, &mut tokens);
        }
        tokens
    }

    #[inline]
    fn flush(&self, buf: &mut String, chars: usize, tokens: &mut Vec<String>) {
        let token = std::mem::take(buf);
        if chars >= self.min_token_len && !self.stop_words.iter().any(|s| *s == token) {
            tokens.push(token);
        }
    }

    /// Tokenize then expand into the configured word n-grams.
    /// n-gram parts are joined with a single space.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens;
        }
        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Count the terms of `text`.
    pub fn analyze(&self, text: &str) -> TokenFrequency {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&self.terms(text));
        freq
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({min_n}, {max_n})"));
        }
        Ok(())
    }
}
