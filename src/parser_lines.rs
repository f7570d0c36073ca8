//! Sentences and tokens from an external parser's line output.
//!
//! Grapheme splitting is a poor word boundary for Japanese or Chinese. A
//! morphological parser (MeCab, jieba) does better, and prints its result
//! one token per line:
//!
//! ```text
//! 今日<TAB>きょう
//! は
//! 晴れ<TAB>はれ
//! 。
//! <blank>
//! 明日
//! ```
//!
//! A line is a surface, optionally followed by a tab and a reading (`*` or
//! empty means none). A blank line ends a sentence.
//!
//! ## Alignment
//!
//! Parsers drop whitespace, so the lines are matched against the source
//! text in order. Whitespace the parser skipped becomes a non-word token,
//! leading whitespace of the next sentence when it falls on a boundary.
//! The result tiles the text the same way [`segment`](crate::segment) and
//! [`tokenize`](crate::tokenize) do: sentence texts join to the normalized
//! text and token surfaces join to their sentence.

use tracing::debug;

use crate::{Error, LanguageRuleSet, Result, Sentence, SequenceIndex, Token};

/// A sentence with its tokens, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSentence {
    /// The sentence, with offsets into the normalized text.
    pub sentence: Sentence,
    /// Its tokens in order.
    pub tokens: Vec<Token>,
}

/// Build sentences and tokens for `text` from a parser's line `output`.
///
/// The language's substitutions are applied to `text` first; run the
/// parser on [`LanguageRuleSet::normalize`]d text when they change
/// anything. Word flags come from the rule set, not from the parser.
///
/// ## Example
///
/// ```rust
/// use glosa::{segment_parser_lines, LanguageRuleSet};
///
/// let rules = LanguageRuleSet::preset("ja").unwrap();
/// let output = "猫\tねこ\nが\n好き\tすき\n。\n\n";
/// let parsed = segment_parser_lines("猫が好き。", output, &rules).unwrap();
///
/// let surfaces: Vec<&str> = parsed[0].tokens.iter().map(|t| t.surface.as_str()).collect();
/// assert_eq!(surfaces, vec!["猫", "が", "好き", "。"]);
/// assert_eq!(parsed[0].tokens[0].reading.as_deref(), Some("ねこ"));
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedParserOutput`] if a line's surface is not the
/// next non-whitespace text, or if the output stops before the text does.
pub fn segment_parser_lines(
    text: &str,
    output: &str,
    rules: &LanguageRuleSet,
) -> Result<Vec<ParsedSentence>> {
    let text = rules.normalize(text);
    let mut assembler = Assembler::new(&text, rules);
    let mut lines = 0;

    for (i, line) in output.lines().enumerate() {
        lines = i + 1;
        if line.trim().is_empty() {
            assembler.close();
            continue;
        }

        let (surface, reading) = match line.split_once('\t') {
            Some((surface, reading)) => (surface, Some(reading.trim())),
            None => (line, None),
        };
        let reading = reading.filter(|r| !r.is_empty() && *r != "*");
        if surface.is_empty() {
            return Err(malformed(lines, "empty surface".to_string()));
        }

        let rest = &text[assembler.cursor..];
        let at = assembler.cursor + (rest.len() - rest.trim_start().len());
        if !text[at..].starts_with(surface) {
            return Err(malformed(
                lines,
                format!("{surface:?} does not match the text at byte {at}"),
            ));
        }
        if at > assembler.cursor {
            assembler.push(at, None);
        }
        assembler.push(at + surface.len(), reading);
    }

    let rest = &text[assembler.cursor..];
    if !rest.trim().is_empty() {
        return Err(malformed(
            lines + 1,
            format!("output ends with {} bytes of text left", rest.len()),
        ));
    }
    let sentences = assembler.finish();

    debug!(
        language = rules.code(),
        bytes = text.len(),
        sentences = sentences.len(),
        "segmented parser output"
    );
    Ok(sentences)
}

fn malformed(line: usize, reason: String) -> Error {
    Error::MalformedParserOutput { line, reason }
}

struct Assembler<'a> {
    text: &'a str,
    rules: &'a LanguageRuleSet,
    sentences: Vec<ParsedSentence>,
    tokens: Vec<Token>,
    start: usize,
    cursor: usize,
}

impl<'a> Assembler<'a> {
    const fn new(text: &'a str, rules: &'a LanguageRuleSet) -> Self {
        Self {
            text,
            rules,
            sentences: Vec::new(),
            tokens: Vec::new(),
            start: 0,
            cursor: 0,
        }
    }

    /// Take `cursor..end` as the next token of the open sentence.
    fn push(&mut self, end: usize, reading: Option<&str>) {
        let surface = &self.text[self.cursor..end];
        let seq = SequenceIndex::from_position(self.tokens.len() + 1);
        let mut token = Token::new(seq, surface, self.rules.is_word(surface));
        token.reading = reading.map(str::to_string);
        self.tokens.push(token);
        self.cursor = end;
    }

    fn close(&mut self) {
        if self.tokens.is_empty() {
            return;
        }
        self.sentences.push(ParsedSentence {
            sentence: Sentence {
                position: self.sentences.len() + 1,
                start: self.start,
                end: self.cursor,
                text: self.text[self.start..self.cursor].to_string(),
            },
            tokens: std::mem::take(&mut self.tokens),
        });
        self.start = self.cursor;
    }

    /// Close the last sentence, giving it any trailing whitespace.
    fn finish(mut self) -> Vec<ParsedSentence> {
        let end = self.text.len();
        if self.cursor < end {
            if self.tokens.is_empty() {
                if let Some(last) = self.sentences.pop() {
                    self.start = last.sentence.start;
                    self.tokens = last.tokens;
                }
            }
            self.push(end, None);
        }
        self.close();
        self.sentences
    }
}
