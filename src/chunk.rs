//! The TextChunk type: one importable slice of an oversized text.

use std::ops::Range;

/// A slice of a long text, small enough to import as a text of its own.
///
/// ## Offsets and Separators
///
/// `start` and `end` are byte offsets into the original text. Chunks never
/// overlap. Between two chunks there may be a paragraph separator that
/// belongs to neither; it is kept on the earlier chunk so that the original
/// comes back exactly:
///
/// ```text
/// Original:  "First para.\n\nSecond para."
/// Chunk 0:   "First para."     [0..11]   separator "\n\n"
/// Chunk 1:   "Second para."    [13..25]  separator ""
/// ```
///
/// ```rust
/// use glosa::{reassemble, TextChunk};
///
/// let chunks = vec![
///     TextChunk::new("First para.", 0, 11, 0, "\n\n", 1),
///     TextChunk::new("Second para.", 13, 25, 1, "", 1),
/// ];
/// assert_eq!(reassemble(&chunks), "First para.\n\nSecond para.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The chunk text.
    pub text: String,
    /// Byte offset where this chunk starts in the original text.
    pub start: usize,
    /// Byte offset where this chunk ends (exclusive) in the original text.
    pub end: usize,
    /// Zero-based position of this chunk in the sequence.
    pub index: usize,
    /// Text between this chunk and the next one.
    pub separator: String,
    /// Number of sentences in the chunk.
    pub sentence_count: usize,
}

impl TextChunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        index: usize,
        separator: impl Into<String>,
        sentence_count: usize,
    ) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
            separator: separator.into(),
            sentence_count,
        }
    }

    /// The length of this chunk in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this chunk is empty. Chunkers never produce empty chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte span of this chunk in the original text.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for TextChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TextChunk {{ index: {}, span: {}..{}, sentences: {} }}",
            self.index, self.start, self.end, self.sentence_count
        )
    }
}

/// Put chunks back together, separators included.
#[must_use]
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&chunk.text);
        out.push_str(&chunk.separator);
    }
    out
}
