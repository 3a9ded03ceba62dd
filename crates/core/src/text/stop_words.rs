//! French stop words.
//!
//! [`StopWords`] is an immutable set handed to the vectorizer when it is built
//! and persisted with it, so prediction applies exactly the set used in training.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// French function words carrying no spam signal on their own.
pub const FRENCH_STOP_WORDS: &[&str] = &[
    "alors", "au", "aucuns", "aussi", "autre", "avant", "avec", "avoir", "bon", "car", "ce",
    "cela", "ces", "ceux", "chaque", "ci", "comme", "comment", "dans", "des", "du", "dedans",
    "dehors", "depuis", "devrait", "doit", "donc", "dos", "début", "elle", "elles", "en",
    "encore", "essai", "est", "et", "eu", "fait", "faites", "fois", "font", "hors", "hélas",
    "ici", "il", "ils", "je", "juste", "la", "le", "les", "leur", "là", "ma", "maintenant",
    "mais", "mes", "mine", "moins", "mon", "mot", "même", "ni", "nommés", "notre", "nous",
    "nouveaux", "ou", "où", "par", "parce", "parole", "pas", "personnes", "peut", "peu",
    "plupart", "pour", "pourquoi", "quand", "que", "quel", "quelle", "quelles", "quels", "qui",
    "sa", "sans", "ses", "seulement", "si", "sien", "son", "sont", "sous", "sur", "ta",
    "tandis", "tellement", "tels", "tes", "ton", "tous", "tout", "trop", "très", "tu",
    "voient", "vont", "votre", "vous", "vu", "ça", "étaient", "état", "étions", "été", "être",
];

/// An immutable set of stop words.
///
/// Backed by a `BTreeSet` so the serialized artifact is byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// The French stop-word set.
    pub fn french() -> Self {
        Self::from_words(FRENCH_STOP_WORDS.iter().copied())
    }

    /// An empty set: no token is suppressed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a set from arbitrary words. Words are lowercased to match tokenizer output.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Returns `true` if `token` is a stop word.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of words in the set.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
