//! Splitting oversized texts into importable chunks.
//!
//! ## How It Works
//!
//! Sentences are the unit: a chunk boundary never falls inside a sentence
//! (and so never inside a word). Sentences are added to the open chunk until
//! the next one would break the [`ChunkBudget`], then the chunk is closed.
//!
//! ```text
//! budget: 2 sentences
//!
//! "One. Two. Three. Four. Five."
//!  |--------|-----------|------|
//!   chunk 0    chunk 1   chunk 2
//! ```
//!
//! A sentence longer than the character limit is never cut; it becomes a
//! chunk of its own and is the only way a chunk can exceed the limit.
//!
//! ## Paragraph Mode
//!
//! With [`ChunkMode::Paragraphs`] the text is first split on blank lines.
//! Whole paragraphs are packed into a chunk while they fit; a paragraph that
//! does not fit starts a new chunk, and one that is too big on its own is
//! split at sentence boundaries. The blank-line separator between two chunks
//! is kept on [`TextChunk::separator`], so chunk texts do not start or end
//! with blank lines.
//!
//! ## Raw Text
//!
//! Chunking runs on the raw text, before the language's substitutions, so
//! that [`reassemble`](crate::reassemble) gives back the input byte for
//! byte. Substitutions happen when each chunk is imported.

use std::ops::Range;

use tracing::{debug, trace, warn};

use crate::lifecycle::{DraftText, MediaRefs};
use crate::limits::MAX_TEXT_CHARS;
use crate::sentence::segment_normalized;
use crate::{ChunkBudget, LanguageRuleSet, Result, TextChunk};

/// How the input is divided before sentences are grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkMode {
    /// One stream of sentences.
    #[default]
    Stream,
    /// Blank-line separated paragraphs, kept whole when they fit.
    Paragraphs,
}

/// Splits long texts into chunks that can each be imported as a text.
///
/// ## Example
///
/// ```rust
/// use glosa::{reassemble, ChunkBudget, LanguageConfig, LanguageRuleSet, LongTextChunker};
///
/// let rules = LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-Z", "[.!?]")).unwrap();
/// let chunker = LongTextChunker::new(ChunkBudget::new(2, 1_000).unwrap());
///
/// let text = "One. Two. Three. Four. Five.";
/// let chunks = chunker.chunk(text, &rules);
///
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[0].text, "One. Two.");
/// assert_eq!(reassemble(&chunks), text);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LongTextChunker {
    budget: ChunkBudget,
    mode: ChunkMode,
}

impl LongTextChunker {
    /// Create a stream-mode chunker.
    #[must_use]
    pub const fn new(budget: ChunkBudget) -> Self {
        Self {
            budget,
            mode: ChunkMode::Stream,
        }
    }

    /// Use the given mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ChunkMode) -> Self {
        self.mode = mode;
        self
    }

    /// The chunk budget.
    #[must_use]
    pub const fn budget(&self) -> ChunkBudget {
        self.budget
    }

    /// The chunking mode.
    #[must_use]
    pub const fn mode(&self) -> ChunkMode {
        self.mode
    }

    /// Split text into chunks.
    ///
    /// Returns no chunks for empty text; otherwise every chunk is non-empty
    /// and [`reassemble`](crate::reassemble) reproduces `text`.
    pub fn chunk(&self, text: &str, rules: &LanguageRuleSet) -> Vec<TextChunk> {
        if text.is_empty() {
            return vec![];
        }

        let mut packer = Packer::new(text, self.budget);
        match self.mode {
            ChunkMode::Stream => {
                for sentence in sentence_spans(text, 0..text.len(), rules) {
                    packer.push_sentence(sentence);
                }
            }
            ChunkMode::Paragraphs => {
                for paragraph in paragraphs(text) {
                    let sentences = sentence_spans(text, paragraph.clone(), rules);
                    packer.push_paragraph(paragraph, &sentences);
                }
            }
        }

        let chunks = packer.finish();
        debug!(
            language = rules.code(),
            mode = ?self.mode,
            chunks = chunks.len(),
            bytes = text.len(),
            "split long text"
        );
        chunks
    }

    /// Split text into drafts ready for import.
    ///
    /// Titles are numbered `"Title (i/n)"` when there is more than one chunk.
    /// Every draft carries the same media references.
    ///
    /// Sentences are never split, so a single sentence longer than
    /// [`MAX_TEXT_CHARS`] yields a draft that import rejects with
    /// [`Error::TextTooLong`](crate::Error::TextTooLong). Check drafts with
    /// [`validate_text_length`](crate::validate_text_length) before a bulk
    /// import when the input may hold such runs (text without terminators).
    pub fn drafts(
        &self,
        title: &str,
        text: &str,
        rules: &LanguageRuleSet,
        media: &MediaRefs,
    ) -> Vec<DraftText> {
        let chunks = self.chunk(text, rules);
        let total = chunks.len();
        chunks
            .into_iter()
            .map(|chunk| {
                let sequence = chunk.index + 1;
                let title = if total > 1 {
                    format!("{title} ({sequence}/{total})")
                } else {
                    title.to_string()
                };
                DraftText {
                    title,
                    text: chunk.text,
                    sequence,
                    total,
                    media: media.clone(),
                }
            })
            .collect()
    }
}

/// Split `text` with a budget built from the two limits.
///
/// # Errors
///
/// Returns [`Error::InvalidBudget`](crate::Error::InvalidBudget) for
/// out-of-range limits.
pub fn chunk(
    text: &str,
    rules: &LanguageRuleSet,
    max_sentences: usize,
    max_chars: usize,
) -> Result<Vec<TextChunk>> {
    let budget = ChunkBudget::new(max_sentences, max_chars)?;
    Ok(LongTextChunker::new(budget).chunk(text, rules))
}

fn sentence_spans(text: &str, within: Range<usize>, rules: &LanguageRuleSet) -> Vec<Range<usize>> {
    let offset = within.start;
    segment_normalized(&text[within], rules)
        .into_iter()
        .map(|s| s.start + offset..s.end + offset)
        .collect()
}

/// Byte ranges of blank-line separated paragraphs.
///
/// Leading blank lines belong to the first paragraph and trailing ones to the
/// last; everything between two paragraphs is their separator.
fn paragraphs(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut content_end: Option<usize> = None;
    let mut in_gap = false;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if content_end.is_some() && line.ends_with('\n') {
                in_gap = true;
            }
            continue;
        }
        if in_gap {
            if let Some(end) = content_end {
                out.push(start..end);
                start = line_start;
            }
            in_gap = false;
        }
        content_end = Some(line_start + line.trim_end().len());
    }

    out.push(start..text.len());
    out
}

#[derive(Debug, Clone)]
struct Open {
    start: usize,
    end: usize,
    sentences: usize,
    chars: usize,
}

/// Greedy packing of spans into chunks.
struct Packer<'a> {
    text: &'a str,
    budget: ChunkBudget,
    closed: Vec<Open>,
    open: Option<Open>,
}

impl<'a> Packer<'a> {
    const fn new(text: &'a str, budget: ChunkBudget) -> Self {
        Self {
            text,
            budget,
            closed: Vec::new(),
            open: None,
        }
    }

    fn chars(&self, span: Range<usize>) -> usize {
        self.text[span].chars().count()
    }

    /// Grow the open chunk to `span` if the budget allows.
    fn try_extend(&mut self, span: &Range<usize>, sentences: usize) -> bool {
        let Some(open) = &self.open else {
            return false;
        };
        let added = self.chars(open.end..span.end);
        if self
            .budget
            .would_overflow((open.sentences, open.chars), sentences, added)
        {
            return false;
        }
        if let Some(open) = &mut self.open {
            open.end = span.end;
            open.sentences += sentences;
            open.chars += added;
        }
        true
    }

    fn start(&mut self, span: Range<usize>, sentences: usize) {
        self.close();
        let chars = self.chars(span.clone());
        self.open = Some(Open {
            start: span.start,
            end: span.end,
            sentences,
            chars,
        });
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            if open.chars > MAX_TEXT_CHARS {
                warn!(
                    start = open.start,
                    chars = open.chars,
                    max = MAX_TEXT_CHARS,
                    "chunk is one sentence over the import limit"
                );
            }
            trace!(
                start = open.start,
                end = open.end,
                sentences = open.sentences,
                "closed chunk"
            );
            self.closed.push(open);
        }
    }

    fn push_sentence(&mut self, span: Range<usize>) {
        if !self.try_extend(&span, 1) {
            self.start(span, 1);
        }
    }

    fn push_paragraph(&mut self, span: Range<usize>, sentences: &[Range<usize>]) {
        if self.try_extend(&span, sentences.len()) {
            return;
        }
        if self
            .budget
            .admits(sentences.len(), self.chars(span.clone()))
        {
            self.start(span, sentences.len());
            return;
        }
        self.close();
        for sentence in sentences {
            self.push_sentence(sentence.clone());
        }
    }

    fn finish(mut self) -> Vec<TextChunk> {
        self.close();
        let text = self.text;
        let next_starts: Vec<usize> = self
            .closed
            .iter()
            .skip(1)
            .map(|o| o.start)
            .chain(std::iter::once(text.len()))
            .collect();

        self.closed
            .into_iter()
            .zip(next_starts)
            .enumerate()
            .map(|(index, (open, next))| {
                TextChunk::new(
                    &text[open.start..open.end],
                    open.start,
                    open.end,
                    index,
                    &text[open.end..next],
                    open.sentences,
                )
            })
            .collect()
    }
}
