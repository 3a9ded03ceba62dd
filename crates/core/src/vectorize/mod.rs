//! Vectorization pipeline: [`CountStage`] followed by [`TfidfStage`].
//!
//! An unfitted [`Vectorizer`] only carries configuration. [`Vectorizer::fit`]
//! consumes it and returns a [`FittedVectorizer`], which can transform but
//! never refit, so the vocabulary and IDF weights are frozen for the lifetime
//! of the artifact.

/// N-gram counting stage and vocabulary.
pub mod count;
/// Sparse feature vectors.
pub mod sparse;
/// TF-IDF reweighting stage.
pub mod tfidf;

pub use count::{CountStage, Vocabulary};
pub use sparse::SparseVector;
pub use tfidf::TfidfStage;

use crate::config;
use crate::error::{Result, SpamError};
use crate::text::StopWords;
use serde::{Deserialize, Serialize};

/// Hyper-parameters of the counting stage.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerConfig {
    /// Stop words removed before n-grams are formed.
    pub stop_words: StopWords,
    /// Inclusive `(min_n, max_n)` n-gram lengths.
    pub ngram_range: (usize, usize),
    /// Minimum document count for a term to be kept.
    pub min_df: usize,
    /// Maximum document share for a term to be kept.
    pub max_df: f64,
    /// Maximum vocabulary size.
    pub max_features: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            stop_words: StopWords::french(),
            ngram_range: (config::NGRAM_MIN, config::NGRAM_MAX),
            min_df: config::MIN_DF,
            max_df: config::MAX_DF,
            max_features: config::MAX_FEATURES,
        }
    }
}

impl VectorizerConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamError::vectorizer(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(SpamError::vectorizer(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(SpamError::vectorizer("max_features must be > 0"));
        }
        Ok(())
    }
}

/// An unfitted vectorizer.
#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    config: VectorizerConfig,
}

impl Vectorizer {
    /// Creates a vectorizer with the default French configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vectorizer from an explicit configuration.
    pub fn with_config(config: VectorizerConfig) -> Self {
        Self { config }
    }

    /// The configuration this vectorizer will fit with.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Fits both stages on the training documents.
    pub fn fit<S: AsRef<str>>(self, docs: &[S]) -> Result<FittedVectorizer> {
        self.fit_transform(docs).map(|(fitted, _)| fitted)
    }

    /// Fits both stages and returns the transformed training documents.
    pub fn fit_transform<S: AsRef<str>>(
        self,
        docs: &[S],
    ) -> Result<(FittedVectorizer, Vec<SparseVector>)> {
        let count = CountStage::fit(&self.config, docs)?;
        let counts: Vec<SparseVector> = docs.iter().map(|d| count.transform(d.as_ref())).collect();
        let tfidf = TfidfStage::fit(&counts, count.vocabulary().len())?;
        let features = counts
            .into_iter()
            .map(|row| tfidf.transform(row))
            .collect::<Result<Vec<_>>>()?;
        Ok((FittedVectorizer { count, tfidf }, features))
    }
}

/// A fitted two-stage vectorizer. Transform-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    count: CountStage,
    tfidf: TfidfStage,
}

impl FittedVectorizer {
    /// Transforms documents into TF-IDF feature vectors; row `i` is document `i`.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<Vec<SparseVector>> {
        docs.iter()
            .map(|d| self.transform_one(d.as_ref()))
            .collect()
    }

    /// Transforms a single document.
    pub fn transform_one(&self, text: &str) -> Result<SparseVector> {
        self.tfidf.transform(self.count.transform(text))
    }

    /// The counting stage.
    pub fn count_stage(&self) -> &CountStage {
        &self.count
    }

    /// The TF-IDF stage.
    pub fn tfidf_stage(&self) -> &TfidfStage {
        &self.tfidf
    }

    /// The fitted vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        self.count.vocabulary()
    }

    /// Feature vector dimension.
    pub fn n_features(&self) -> usize {
        self.count.vocabulary().len()
    }

    /// Validate internal invariants after deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.count.vocabulary().is_empty() {
            return Err(SpamError::vectorizer("vocabulary is empty"));
        }
        if self.tfidf.len() != self.count.vocabulary().len() {
            return Err(SpamError::vectorizer(format!(
                "IDF length {} != vocabulary size {}",
                self.tfidf.len(),
                self.count.vocabulary().len()
            )));
        }
        self.tfidf.validate()
    }
}
