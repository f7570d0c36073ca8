//! Tokenization of a sentence into word and non-word tokens.
//!
//! ## Two Modes
//!
//! Space-delimited languages take maximal runs of word characters as words;
//! whatever lies between two runs is one non-word token:
//!
//! ```text
//! "Hi, you!" -> ["Hi"] [", "] ["you"] ["!"]
//! ```
//!
//! Languages written without spaces set `split_each_character`, and every
//! grapheme cluster becomes its own token:
//!
//! ```text
//! "猫が好き。" -> ["猫"] ["が"] ["好"] ["き"] ["。"]
//! ```
//!
//! Either way the tokens are in logical (storage) order, also for
//! right-to-left scripts, and their surfaces concatenate to the sentence.

use unicode_segmentation::UnicodeSegmentation;

use crate::{LanguageRuleSet, SequenceIndex};

/// The smallest annotated unit of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the text's token order.
    pub seq: SequenceIndex,
    /// The text exactly as it appears.
    pub surface: String,
    /// Lowercased surface; the join key against known vocabulary.
    pub key: String,
    /// Whether this is a word (as opposed to whitespace or punctuation).
    pub is_word: bool,
    /// The learner's translation, words only.
    pub translation: Option<String>,
    /// A free-form tag, words only.
    pub tag: Option<String>,
    /// Pronunciation from an external parser (furigana, pinyin). Not part
    /// of the annotation line format.
    pub reading: Option<String>,
}

impl Token {
    /// A token with no annotation.
    pub fn new(seq: SequenceIndex, surface: impl Into<String>, is_word: bool) -> Self {
        let surface = surface.into();
        Self {
            seq,
            key: surface.to_lowercase(),
            surface,
            is_word,
            translation: None,
            tag: None,
            reading: None,
        }
    }

    /// Whether a translation or tag is attached.
    #[must_use]
    pub const fn is_annotated(&self) -> bool {
        self.translation.is_some() || self.tag.is_some()
    }
}

/// Split a sentence into tokens numbered from 1.
///
/// ## Example
///
/// ```rust
/// use glosa::{tokenize, LanguageConfig, LanguageRuleSet};
///
/// let rules = LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-Z", "[.!?]")).unwrap();
/// let tokens = tokenize("Hi, you!", &rules);
///
/// let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
/// assert_eq!(surfaces, vec!["Hi", ", ", "you", "!"]);
/// assert!(tokens[0].is_word && !tokens[1].is_word);
/// assert_eq!(tokens[0].key, "hi");
/// ```
pub fn tokenize(sentence: &str, rules: &LanguageRuleSet) -> Vec<Token> {
    let mut tokens = Vec::new();
    tokenize_into(sentence, rules, &mut tokens);
    tokens
}

/// Append a sentence's tokens, numbering them after what is already there.
pub(crate) fn tokenize_into(sentence: &str, rules: &LanguageRuleSet, tokens: &mut Vec<Token>) {
    for (surface, is_word) in pieces(sentence, rules) {
        let seq = SequenceIndex::from_position(tokens.len() + 1);
        tokens.push(Token::new(seq, surface, is_word));
    }
}

/// Surface slices with their word flag, in order.
fn pieces<'a>(sentence: &'a str, rules: &LanguageRuleSet) -> Vec<(&'a str, bool)> {
    if rules.split_each_character() {
        return sentence
            .graphemes(true)
            .map(|g| (g, rules.is_word(g)))
            .collect();
    }

    let mut out = Vec::new();
    let mut last = 0;
    for m in rules.word_run().find_iter(sentence) {
        if m.start() > last {
            out.push((&sentence[last..m.start()], false));
        }
        out.push((m.as_str(), true));
        last = m.end();
    }
    if last < sentence.len() {
        out.push((&sentence[last..], false));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LanguageConfig;

    fn english() -> LanguageRuleSet {
        LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-ZÀ-ÿ'", "[.!?]")).unwrap()
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    #[test]
    fn test_word_runs() {
        let tokens = tokenize(" Don't stop, café!", &english());
        assert_eq!(
            surfaces(&tokens),
            vec![" ", "Don't", " ", "stop", ", ", "café", "!"]
        );
        let words: Vec<bool> = tokens.iter().map(|t| t.is_word).collect();
        assert_eq!(words, vec![false, true, false, true, false, true, false]);
    }

    #[test]
    fn test_numbering() {
        let tokens = tokenize("a b", &english());
        let seqs: Vec<String> = tokens.iter().map(|t| t.seq.to_string()).collect();
        assert_eq!(seqs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_keys_are_lowercase() {
        let tokens = tokenize("ÉCOLE", &english());
        assert_eq!(tokens[0].key, "école");
    }

    #[test]
    fn test_no_annotation() {
        let tokens = tokenize("word", &english());
        assert!(!tokens[0].is_annotated());
    }

    #[test]
    fn test_split_each_character() {
        let rules = LanguageRuleSet::preset("ja").unwrap();
        let tokens = tokenize("猫が好き。", &rules);
        assert_eq!(surfaces(&tokens), vec!["猫", "が", "好", "き", "。"]);
        assert!(tokens[..4].iter().all(|t| t.is_word));
        assert!(!tokens[4].is_word);
    }

    #[test]
    fn test_split_keeps_combining_marks() {
        let rules = LanguageRuleSet::new(
            LanguageConfig::new("xx", "a-z\\x{300}-\\x{36F}", "[.]").with_split_each_character(true),
        )
        .unwrap();
        let tokens = tokenize("e\u{301}a", &rules);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface, "e\u{301}");
    }

    #[test]
    fn test_right_to_left_is_logical_order() {
        let rules = LanguageRuleSet::preset("ar").unwrap();
        let tokens = tokenize("مرحبا بالعالم", &rules);
        assert_eq!(surfaces(&tokens), vec!["مرحبا", " ", "بالعالم"]);
    }

    #[test]
    fn test_concatenation_reproduces_sentence() {
        let sentence = "  ¿Qué? -- ok...  ";
        let joined: String = tokenize(sentence, &english())
            .iter()
            .map(|t| t.surface.as_str())
            .collect();
        assert_eq!(joined, sentence);
    }

    #[test]
    fn test_empty_sentence() {
        assert!(tokenize("", &english()).is_empty());
    }
}
