//! Annotated texts and their persisted line format.
//!
//! ## Format
//!
//! One line per token, fields separated by tabs:
//!
//! ```text
//! sequenceIndex <TAB> surfaceText <TAB> translation <TAB> tagMarker
//! ```
//!
//! Lines are ordered by sequence index. An absent translation or tag is an
//! empty field, never a missing column. Tabs, line breaks and backslashes
//! inside a field are escaped as `\t`, `\n`, `\r` and `\\`, so a whitespace
//! token containing a newline still occupies exactly one line.
//!
//! ```text
//! 1	The
//! 2
//! 3	apple	pomme	fruit
//! 4	.\n
//! ```
//!
//! The format has no column for the word flag. Decoding recomputes it from
//! the surface text with the language's word pattern, which is why
//! [`AnnotationCodec`] borrows a [`LanguageRuleSet`].

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::limits::ensure_text_length;
use crate::reconcile::{reconcile, Reconciliation};
use crate::sentence::segment_normalized;
use crate::tokenizer::tokenize_into;
use crate::{Error, LanguageRuleSet, Result, SequenceIndex, Token};

/// Tokens of a text, with their annotations, plus the raw text they came
/// from.
///
/// The tokens' surfaces concatenate to the raw text after the language's
/// substitutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    raw_text: String,
    tokens: Vec<Token>,
}

impl AnnotatedText {
    /// Segment and tokenize raw text into a fresh, unannotated text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TextTooLong`] if `raw` is over the import ceiling.
    pub fn parse(raw: &str, rules: &LanguageRuleSet) -> Result<Self> {
        ensure_text_length(raw)?;
        Ok(Self::build(raw, rules))
    }

    pub(crate) fn build(raw: &str, rules: &LanguageRuleSet) -> Self {
        let normalized = rules.normalize(raw);
        let mut tokens = Vec::new();
        for sentence in segment_normalized(&normalized, rules) {
            tokenize_into(&sentence.text, rules, &mut tokens);
        }
        Self {
            raw_text: raw.to_string(),
            tokens,
        }
    }

    /// Assemble a text from tokens in any order.
    pub fn from_parts(raw_text: impl Into<String>, mut tokens: Vec<Token>) -> Self {
        tokens.sort_by(|a, b| a.seq.cmp(&b.seq));
        Self {
            raw_text: raw_text.into(),
            tokens,
        }
    }

    /// The raw text as imported.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Tokens in sequence order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    /// The tokens' surfaces joined together.
    #[must_use]
    pub fn surface_text(&self) -> String {
        self.tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    /// Keys of all word tokens, in order. This is what a vocabulary lookup
    /// joins on.
    pub fn word_keys(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.is_word)
            .map(|t| t.key.as_str())
    }

    /// Number of word tokens.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_word).count()
    }

    fn position(&self, seq: &SequenceIndex) -> Option<usize> {
        self.tokens.binary_search_by(|t| t.seq.cmp(seq)).ok()
    }

    /// The token at `seq`.
    #[must_use]
    pub fn get(&self, seq: &SequenceIndex) -> Option<&Token> {
        self.position(seq).map(|i| &self.tokens[i])
    }

    /// Set or clear the translation and tag of a word token.
    ///
    /// Empty strings clear the field. Returns `false` if there is no token
    /// at `seq` or it is not a word.
    pub fn annotate(
        &mut self,
        seq: &SequenceIndex,
        translation: Option<&str>,
        tag: Option<&str>,
    ) -> bool {
        let Some(i) = self.position(seq) else {
            return false;
        };
        let token = &mut self.tokens[i];
        if !token.is_word {
            return false;
        }
        token.translation = translation.filter(|s| !s.is_empty()).map(str::to_string);
        token.tag = tag.filter(|s| !s.is_empty()).map(str::to_string);
        true
    }

    /// Split the token at `seq` after `at` bytes of its surface.
    ///
    /// The second half gets a key between `seq` and the following token, so
    /// no other token is renumbered. Both halves lose the annotation. Returns
    /// the new token's index, or `None` if `seq` is absent or `at` is not an
    /// inner char boundary.
    pub fn split_token(
        &mut self,
        seq: &SequenceIndex,
        at: usize,
        rules: &LanguageRuleSet,
    ) -> Option<SequenceIndex> {
        let i = self.position(seq)?;
        let surface = &self.tokens[i].surface;
        if at == 0 || at >= surface.len() || !surface.is_char_boundary(at) {
            return None;
        }

        let upper = self
            .tokens
            .get(i + 1)
            .map_or_else(|| seq.after(), |next| next.seq.clone());
        let new_seq = SequenceIndex::between(seq, &upper)?;

        let (head, tail) = surface.split_at(at);
        let (head, tail) = (head.to_string(), tail.to_string());
        let first = Token::new(seq.clone(), head.as_str(), rules.is_word(&head));
        let second = Token::new(new_seq.clone(), tail.as_str(), rules.is_word(&tail));

        self.tokens[i] = first;
        self.tokens.insert(i + 1, second);
        Some(new_seq)
    }

    /// Join the token at `seq` with the one after it.
    ///
    /// The merged token keeps `seq` and the first token's annotation when it
    /// is still a word. Returns `false` if either token is missing.
    pub fn merge_with_next(&mut self, seq: &SequenceIndex, rules: &LanguageRuleSet) -> bool {
        let Some(i) = self.position(seq) else {
            return false;
        };
        if i + 1 >= self.tokens.len() {
            return false;
        }

        let next = self.tokens.remove(i + 1);
        let token = &mut self.tokens[i];
        token.surface.push_str(&next.surface);
        token.key = token.surface.to_lowercase();
        token.is_word = rules.is_word(&token.surface);
        if !token.is_word {
            token.translation = None;
            token.tag = None;
        }
        true
    }
}

/// Encoder and decoder for the persisted annotation format.
///
/// ## Example
///
/// ```rust
/// use glosa::{AnnotatedText, AnnotationCodec, LanguageConfig, LanguageRuleSet, SequenceIndex};
///
/// let rules = LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-Z", "[.!?]")).unwrap();
/// let codec = AnnotationCodec::new(&rules);
///
/// let mut text = AnnotatedText::parse("An apple.", &rules).unwrap();
/// text.annotate(&SequenceIndex::from_position(3), Some("pomme"), None);
///
/// let lines = codec.encode(&text);
/// assert_eq!(lines.lines().nth(2), Some("3\tapple\tpomme\t"));
/// assert_eq!(codec.decode("An apple.", &lines).unwrap(), text);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AnnotationCodec<'r> {
    rules: &'r LanguageRuleSet,
}

impl<'r> AnnotationCodec<'r> {
    /// A codec for texts in the given language.
    #[must_use]
    pub const fn new(rules: &'r LanguageRuleSet) -> Self {
        Self { rules }
    }

    /// Write a text as annotation lines.
    #[must_use]
    pub fn encode(&self, text: &AnnotatedText) -> String {
        encode(text)
    }

    /// Read annotation lines back into a text.
    ///
    /// Lines may come in any order; blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedAnnotation`] for a line without exactly four
    /// fields, an unparsable or duplicate sequence index, or an empty
    /// surface.
    pub fn decode(&self, raw_text: &str, lines: &str) -> Result<AnnotatedText> {
        let mut tokens = Vec::new();
        let mut seen = HashSet::new();

        for (n, line) in lines.split('\n').enumerate() {
            let line_no = n + 1;
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            let [seq, surface, translation, tag] = fields.as_slice() else {
                return Err(malformed(
                    line_no,
                    format!("expected 4 fields, found {}", fields.len()),
                ));
            };

            let seq: SequenceIndex = seq.parse().map_err(|e| malformed(line_no, e))?;
            if !seen.insert(seq.clone()) {
                return Err(malformed(line_no, format!("duplicate sequence index {seq}")));
            }

            let surface = unescape(surface);
            if surface.is_empty() {
                return Err(malformed(line_no, "empty surface text"));
            }

            let is_word = self.rules.is_word(&surface);
            let mut token = Token::new(seq, surface, is_word);
            token.translation = non_empty(unescape(translation));
            token.tag = non_empty(unescape(tag));
            tokens.push(token);
        }

        let text = AnnotatedText::from_parts(raw_text, tokens);
        if text.surface_text() != self.rules.normalize(raw_text) {
            warn!(
                language = self.rules.code(),
                "decoded annotation does not reproduce its raw text"
            );
        }
        debug!(tokens = text.tokens.len(), "decoded annotation");
        Ok(text)
    }

    /// Re-tokenize edited raw text, carrying annotations forward.
    ///
    /// See [`reconcile`](crate::reconcile()) for the alignment.
    #[must_use]
    pub fn reconcile(&self, old: &AnnotatedText, new_raw: &str) -> Reconciliation {
        reconcile(old, new_raw, self.rules)
    }
}

/// Write a text as annotation lines. Needs no language rules.
#[must_use]
pub fn encode(text: &AnnotatedText) -> String {
    let mut out = String::new();
    for (i, token) in text.tokens.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&token.seq.to_string());
        out.push('\t');
        escape_into(&token.surface, &mut out);
        out.push('\t');
        escape_into(token.translation.as_deref().unwrap_or(""), &mut out);
        out.push('\t');
        escape_into(token.tag.as_deref().unwrap_or(""), &mut out);
    }
    out
}

fn malformed(line: usize, reason: impl ToString) -> Error {
    Error::MalformedAnnotation {
        line,
        reason: reason.to_string(),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn escape_into(field: &str, out: &mut String) {
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

/// Undo [`escape_into`]. Unknown escapes are kept as written.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
