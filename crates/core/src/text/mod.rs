//! Text normalisation: word tokenizer and the French stop-word set.
//!
//! Both are pure values. The vectorizer receives its stop words at
//! construction time and calls [`tokenize`] directly.

/// French function words removed before n-gram extraction.
pub mod stop_words;
/// Lowercasing regex word tokenizer.
pub mod tokenizer;

pub use stop_words::{StopWords, FRENCH_STOP_WORDS};
pub use tokenizer::{tokenize, Tokens};
