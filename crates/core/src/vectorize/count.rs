//! Counting stage: n-gram bag-of-words over a pruned, fixed vocabulary.
//!
//! Stop words are dropped from the token stream before n-grams are formed, so
//! no feature contains a stop word and bigrams join across removed words.
//! Document-frequency pruning and the feature cap are applied once, at fit time.

use crate::error::{Result, SpamError};
use crate::text::{tokenize, StopWords};
use crate::vectorize::sparse::SparseVector;
use crate::vectorize::VectorizerConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// The ordered set of n-gram terms defining feature indices.
///
/// Serialized as its term list; the term → index lookup is rebuilt (and
/// duplicates rejected) on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Builds a vocabulary whose feature indices follow `terms` order.
    pub fn from_terms(terms: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if index.insert(term.clone(), i as u32).is_some() {
                return Err(SpamError::vectorizer(format!(
                    "duplicate vocabulary term '{}'",
                    term
                )));
            }
        }
        Ok(Self { terms, index })
    }

    /// Feature index of `term`.
    pub fn get(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    /// Returns `true` if `term` is a feature.
    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Term at feature index `index`.
    pub fn term(&self, index: u32) -> Option<&str> {
        self.terms.get(index as usize).map(String::as_str)
    }

    /// Terms in feature-index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if there are no features.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// CRC32 over the length-prefixed terms in index order.
    ///
    /// Stored in both artifacts to check that a model and a vectorizer were fitted together.
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for term in &self.terms {
            hasher.update(&(term.len() as u32).to_be_bytes());
            hasher.update(term.as_bytes());
        }
        hasher.finalize()
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = SpamError;

    fn try_from(terms: Vec<String>) -> Result<Self> {
        Self::from_terms(terms)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

/// Corpus statistics for one candidate term.
#[derive(Debug, Default, Clone, Copy)]
struct TermStats {
    /// Number of documents containing the term.
    df: usize,
    /// Total occurrences across the corpus.
    tf: u64,
}

/// Fitted counting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountStage {
    vocabulary: Vocabulary,
    stop_words: StopWords,
    ngram_range: (usize, usize),
}

impl CountStage {
    /// Learns the vocabulary from `docs`.
    pub(crate) fn fit<S: AsRef<str>>(config: &VectorizerConfig, docs: &[S]) -> Result<Self> {
        config.validate()?;
        if docs.is_empty() {
            return Err(SpamError::vectorizer("cannot fit on an empty corpus"));
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        let mut doc_counts: HashMap<String, u32> = HashMap::new();
        for doc in docs {
            doc_counts.clear();
            for_each_ngram(doc.as_ref(), &config.stop_words, config.ngram_range, |gram| {
                match doc_counts.get_mut(gram) {
                    Some(count) => *count += 1,
                    None => {
                        doc_counts.insert(gram.to_owned(), 1);
                    }
                }
            });
            for (gram, count) in doc_counts.drain() {
                let entry = stats.entry(gram).or_default();
                entry.df += 1;
                entry.tf += count as u64;
            }
        }

        if stats.is_empty() {
            return Err(SpamError::vectorizer(
                "empty vocabulary; documents contain only stop words or no tokens",
            ));
        }

        let n_docs = docs.len();
        let max_doc_count = config.max_df * n_docs as f64;
        if max_doc_count < config.min_df as f64 {
            return Err(SpamError::vectorizer(format!(
                "max_df={} over {} documents allows fewer documents than min_df={}",
                config.max_df, n_docs, config.min_df
            )));
        }

        let mut survivors: Vec<(String, TermStats)> = stats
            .into_iter()
            .filter(|(_, s)| s.df >= config.min_df && s.df as f64 <= max_doc_count)
            .collect();
        if survivors.is_empty() {
            return Err(SpamError::vectorizer(
                "after pruning, no terms remain; try a lower min_df or a higher max_df",
            ));
        }

        // Most frequent first; lexicographic among equal frequencies.
        survivors.sort_unstable_by(|(a, sa), (b, sb)| {
            Reverse(sa.tf).cmp(&Reverse(sb.tf)).then_with(|| a.cmp(b))
        });
        survivors.truncate(config.max_features);

        let mut terms: Vec<String> = survivors.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        tracing::debug!(
            documents = n_docs,
            features = terms.len(),
            "Vocabulary fitted"
        );

        Ok(Self {
            vocabulary: Vocabulary::from_terms(terms)?,
            stop_words: config.stop_words.clone(),
            ngram_range: config.ngram_range,
        })
    }

    /// Counts vocabulary n-grams in `text`. Out-of-vocabulary n-grams are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<u32, f64> = HashMap::new();
        for_each_ngram(text, &self.stop_words, self.ngram_range, |gram| {
            if let Some(idx) = self.vocabulary.get(gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        });
        SparseVector::from_entries(self.vocabulary.len(), counts.into_iter().collect())
            .unwrap_or_else(|| SparseVector::zeros(self.vocabulary.len()))
    }

    /// The fitted vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Stop words removed before n-grams are formed.
    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Inclusive `(min_n, max_n)` n-gram lengths.
    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }
}

/// Calls `visit` for every n-gram of `text`, unigrams first, then each longer
/// length in text order. Stop words are removed first; n-gram tokens are
/// joined with a single space.
fn for_each_ngram(
    text: &str,
    stop_words: &StopWords,
    (min_n, max_n): (usize, usize),
    mut visit: impl FnMut(&str),
) {
    let tokens = tokenize(text);
    let words: Vec<&str> = tokens.iter().filter(|w| !stop_words.contains(w)).collect();
    let mut gram = String::new();
    for n in min_n.max(1)..=max_n {
        if words.len() < n {
            break;
        }
        for window in words.windows(n) {
            gram.clear();
            for (k, word) in window.iter().enumerate() {
                if k > 0 {
                    gram.push(' ');
                }
                gram.push_str(word);
            }
            visit(&gram);
        }
    }
}
