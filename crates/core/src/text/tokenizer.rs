//! Word tokenizer.
//!
//! Lowercases the whole input, then extracts every maximal run of two or more
//! Unicode word characters bounded by word boundaries (`\b\w\w+\b`).
//! Single-character words are dropped. Total over all inputs: a missing or
//! blank text yields no tokens. Uses a zero-per-token allocation design via
//! byte spans.

use regex::Regex;
use std::sync::LazyLock;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid word pattern literal"));

/// Tokenized text: owns the lowercased buffer, provides &str slices via byte spans.
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    buffer: String,
    spans: Vec<(u32, u32)>, // (start, end) byte offsets into buffer
}

impl Tokens {
    /// Returns an iterator over the token `&str` slices, in text order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .map(|&(s, e)| &self.buffer[s as usize..e as usize])
    }

    /// Returns the token at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.spans
            .get(index)
            .map(|&(s, e)| &self.buffer[s as usize..e as usize])
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns `true` if there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Copies the tokens into owned strings.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

/// Tokenize text: lowercase, then match `\b\w\w+\b`.
///
/// Accepts `&str` or `Option<&str>`; `None` is treated as the empty string.
pub fn tokenize<'a>(text: impl Into<Option<&'a str>>) -> Tokens {
    let buffer = text.into().unwrap_or_default().to_lowercase();
    let spans = WORD_PATTERN
        .find_iter(&buffer)
        .map(|m| (m.start() as u32, m.end() as u32))
        .collect();
    Tokens { buffer, spans }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        tokenize(text).to_vec()
    }

    #[test]
    fn test_tokenize_lowercases_and_drops_short_words() {
        assert_eq!(words("Bonjour, le MONDE!!"), vec!["bonjour", "le", "monde"]);
        assert_eq!(words("a b cd e"), vec!["cd"]);
    }

    #[test]
    fn test_tokenize_empty_inputs() {
        assert!(tokenize(None).is_empty());
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("!!! ... ???").is_empty());
    }

    #[test]
    fn test_tokenize_unicode_words() {
        assert_eq!(
            words("Été À Noël: très GÉNÉREUX"),
            vec!["été", "noël", "très", "généreux"]
        );
    }

    #[test]
    fn test_tokenize_apostrophes_split_elisions() {
        // "l'" and "d'" are single letters once split on the apostrophe.
        assert_eq!(
            words("Gagnez de l'argent d'avance"),
            vec!["gagnez", "de", "argent", "avance"]
        );
    }

    #[test]
    fn test_tokenize_digits_and_underscores_are_word_chars() {
        assert_eq!(
            words("Appelez le 0612 34 code_promo 5"),
            vec!["appelez", "le", "0612", "34", "code_promo"]
        );
    }

    #[test]
    fn test_tokens_accessors() {
        let tokens = tokenize("Salut Marie");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get(1), Some("marie"));
        assert_eq!(tokens.get(2), None);
    }
}
