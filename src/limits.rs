//! Input size ceiling.
//!
//! Segmentation and tokenization are linear, so bounding the input bounds
//! their running time. Callers check the ceiling before importing; texts
//! over it go through [`LongTextChunker`](crate::LongTextChunker) instead.

use crate::{Error, Result};

/// Longest raw text, in characters, that can be imported as one text.
pub const MAX_TEXT_CHARS: usize = 65_000;

/// Whether `text` is within [`MAX_TEXT_CHARS`].
#[must_use]
pub fn validate_text_length(text: &str) -> bool {
    // Byte length is an upper bound on the character count.
    text.len() <= MAX_TEXT_CHARS || text.chars().count() <= MAX_TEXT_CHARS
}

/// Like [`validate_text_length`], as a `Result`.
///
/// # Errors
///
/// Returns [`Error::TextTooLong`] when the text is over the ceiling.
pub fn ensure_text_length(text: &str) -> Result<()> {
    if validate_text_length(text) {
        Ok(())
    } else {
        Err(Error::TextTooLong {
            len: text.chars().count(),
            max: MAX_TEXT_CHARS,
        })
    }
}
