//! Chunk size limits.
//!
//! A chunk is bounded two ways: by sentence count (how much a learner reads
//! in one sitting) and by characters (what a single text may hold). Whichever
//! limit is hit first closes the chunk.

use crate::limits::MAX_TEXT_CHARS;
use crate::{Error, Result};

/// Sentence and character limits for one chunk.
///
/// # Examples
///
/// ```rust
/// use glosa::ChunkBudget;
///
/// let budget = ChunkBudget::new(10, 5_000).unwrap();
/// assert!(budget.admits(10, 5_000));
/// assert!(!budget.admits(11, 100));
///
/// assert!(ChunkBudget::new(0, 5_000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBudget {
    max_sentences: usize,
    max_chars: usize,
}

impl ChunkBudget {
    /// Create a budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBudget`] if either limit is zero or
    /// `max_chars` is over [`MAX_TEXT_CHARS`], since every chunk must be
    /// importable on its own.
    pub fn new(max_sentences: usize, max_chars: usize) -> Result<Self> {
        if max_sentences == 0 {
            return Err(Error::InvalidBudget("max_sentences must be > 0".into()));
        }
        if max_chars == 0 {
            return Err(Error::InvalidBudget("max_chars must be > 0".into()));
        }
        if max_chars > MAX_TEXT_CHARS {
            return Err(Error::InvalidBudget(format!(
                "max_chars {max_chars} exceeds the text limit {MAX_TEXT_CHARS}"
            )));
        }
        Ok(Self {
            max_sentences,
            max_chars,
        })
    }

    /// Most sentences in one chunk.
    #[must_use]
    pub const fn max_sentences(&self) -> usize {
        self.max_sentences
    }

    /// Most characters in one chunk.
    #[must_use]
    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Whether a chunk of this size is within budget.
    #[must_use]
    pub const fn admits(&self, sentences: usize, chars: usize) -> bool {
        sentences <= self.max_sentences && chars <= self.max_chars
    }

    /// Whether growing a chunk by `sentences` and `chars` would break the
    /// budget.
    #[must_use]
    pub const fn would_overflow(
        &self,
        current: (usize, usize),
        sentences: usize,
        chars: usize,
    ) -> bool {
        !self.admits(
            current.0.saturating_add(sentences),
            current.1.saturating_add(chars),
        )
    }
}

impl Default for ChunkBudget {
    fn default() -> Self {
        Self {
            max_sentences: 20,
            max_chars: 60_000,
        }
    }
}
