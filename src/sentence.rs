//! Sentence segmentation.
//!
//! Splits text into sentences using a language's terminator pattern and
//! exception list.
//!
//! ## The Hard Part: False Boundaries
//!
//! ```text
//! "Dr. Smith paid $3.50 at example.com. He left."
//!    ^            ^          ^        ^
//!    |            |          |        boundary
//!    |            |          followed by lowercase: not a boundary
//!    |            between digits: not a boundary
//!    exception "Dr": not a boundary
//! ```
//!
//! A terminator run ends a sentence unless:
//!
//! - the word before it is in the language's exception list
//!   (case-insensitive, e.g. `Mr`, `Dr`, `e.g`)
//! - it is directly followed by a lowercase letter or a digit
//!
//! Runs like `...` or `?!` are one boundary, and closing quotes or brackets
//! after the run stay with the sentence they close. Line breaks always end a
//! sentence.
//!
//! ## Coverage
//!
//! Sentences tile the text: whitespace between two sentences is the start of
//! the second one, trailing whitespace is the end of the last one. Joining
//! every sentence's text gives back the input.

use std::ops::Range;

use tracing::debug;

use crate::LanguageRuleSet;

/// One sentence of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// One-based position within the text.
    pub position: usize,
    /// Byte offset where the sentence starts in the normalized text.
    pub start: usize,
    /// Byte offset where the sentence ends (exclusive).
    pub end: usize,
    /// The sentence text, including leading whitespace.
    pub text: String,
}

impl Sentence {
    /// The byte span of this sentence.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The sentence without surrounding whitespace.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Split raw text into sentences.
///
/// The language's substitutions are applied first; offsets refer to the
/// substituted text. Non-empty input always yields at least one sentence and
/// no sentence is empty.
///
/// ## Example
///
/// ```rust
/// use glosa::{segment, LanguageConfig, LanguageRuleSet};
///
/// let rules = LanguageRuleSet::new(
///     LanguageConfig::new("en", "a-zA-Z", "[.!?]").with_exceptions(["Mr", "Dr"]),
/// )
/// .unwrap();
///
/// let sentences = segment("Dr. Smith arrived. He left.", &rules);
/// assert_eq!(sentences.len(), 2);
/// assert_eq!(sentences[0].text, "Dr. Smith arrived.");
/// assert_eq!(sentences[1].trimmed(), "He left.");
/// ```
pub fn segment(text: &str, rules: &LanguageRuleSet) -> Vec<Sentence> {
    segment_normalized(&rules.normalize(text), rules)
}

/// Split text that has already been through substitutions.
pub(crate) fn segment_normalized(text: &str, rules: &LanguageRuleSet) -> Vec<Sentence> {
    if text.is_empty() {
        return vec![];
    }

    let mut cuts: Vec<usize> = rules
        .terminator_run()
        .find_iter(text)
        .filter(|m| !is_suppressed(text, m.start(), m.end(), rules))
        .map(|m| m.end())
        .collect();
    cuts.extend(text.match_indices('\n').map(|(i, _)| i));
    cuts.sort_unstable();
    cuts.dedup();

    let mut spans = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        if cut > start && cut < text.len() {
            spans.push(start..cut);
            start = cut;
        }
    }
    spans.push(start..text.len());

    let spans = merge_fillers(text, spans, rules);

    let sentences: Vec<Sentence> = spans
        .into_iter()
        .enumerate()
        .map(|(i, span)| Sentence {
            position: i + 1,
            text: text[span.clone()].to_string(),
            start: span.start,
            end: span.end,
        })
        .collect();

    debug!(
        language = rules.code(),
        bytes = text.len(),
        sentences = sentences.len(),
        "segmented text"
    );
    sentences
}

/// Whether the terminator at `start..end` must not end a sentence.
fn is_suppressed(text: &str, start: usize, end: usize, rules: &LanguageRuleSet) -> bool {
    if let Some(next) = text[end..].chars().next() {
        if next.is_lowercase() || next.is_ascii_digit() {
            return true;
        }
    }
    follows_exception(text, start, rules)
}

/// Whether the text just before `start` ends in an exception that starts on
/// a word boundary.
///
/// Looks back at most one character more than the longest exception, so the
/// cost per terminator does not depend on the length of the text.
fn follows_exception(text: &str, start: usize, rules: &LanguageRuleSet) -> bool {
    let longest = rules.longest_exception();
    if longest == 0 {
        return false;
    }

    let mut from = start;
    for (taken, (i, c)) in text[..start].char_indices().rev().enumerate() {
        if c.is_whitespace() || taken > longest {
            break;
        }
        from = i;
    }
    let candidate = &text[from..start];

    // "(Dr", "Smith/Dr": try each suffix that starts a word.
    let mut buf = [0u8; 4];
    let mut after_word = false;
    for (i, c) in candidate.char_indices() {
        let is_word = rules.is_word(c.encode_utf8(&mut buf));
        if is_word && !after_word && rules.is_exception(&candidate[i..]) {
            return true;
        }
        after_word = is_word;
    }
    false
}

/// Fold spans that are not sentences on their own into a neighbour.
///
/// Whitespace-only spans become leading whitespace of the next sentence;
/// spans of stray terminators (". . .") join the previous one.
fn merge_fillers(
    text: &str,
    spans: Vec<Range<usize>>,
    rules: &LanguageRuleSet,
) -> Vec<Range<usize>> {
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    let mut pending: Option<usize> = None;

    for span in spans {
        let start = pending.take().unwrap_or(span.start);
        let piece = &text[span.clone()];

        if piece.trim().is_empty() {
            pending = Some(start);
            continue;
        }
        if is_stray_terminators(piece, rules) {
            if let Some(last) = merged.last_mut() {
                last.end = span.end;
                continue;
            }
        }
        merged.push(start..span.end);
    }

    if let Some(start) = pending {
        match merged.last_mut() {
            Some(last) => last.end = text.len(),
            None => merged.push(start..text.len()),
        }
    }

    merged
}

fn is_stray_terminators(piece: &str, rules: &LanguageRuleSet) -> bool {
    !piece.contains('\n')
        && piece.split_whitespace().all(|w| {
            rules
                .terminator_run()
                .find(w)
                .is_some_and(|m| m.start() == 0 && m.end() == w.len())
        })
}
