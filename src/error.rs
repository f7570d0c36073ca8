//! Error types for glosa.

use crate::lifecycle::{TextId, TextState};

/// Errors that can occur while configuring languages, importing text,
/// decoding annotations, or moving texts through their lifecycle.
///
/// Segmentation, tokenization and reconciliation never fail; only
/// configuration and precondition violations end up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A language pattern did not compile.
    #[error("invalid {field} pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Which rule-set field held the pattern.
        field: &'static str,
        /// The offending pattern as written.
        pattern: String,
        /// The regex compiler's complaint.
        #[source]
        source: regex::Error,
    },

    /// A language configuration could not be read.
    #[error("invalid language config: {0}")]
    InvalidConfig(String),

    /// No rule set is registered for a language code.
    #[error("unknown language {0:?}")]
    UnknownLanguage(String),

    /// Raw text is over the import ceiling.
    #[error("text is {len} characters long; the limit is {max}")]
    TextTooLong {
        /// Length of the rejected text, in characters.
        len: usize,
        /// The ceiling it exceeded.
        max: usize,
    },

    /// Chunk parameters are out of range.
    #[error("invalid chunk budget: {0}")]
    InvalidBudget(String),

    /// External parser output does not line up with the text it came from.
    #[error("parser output line {line}: {reason}")]
    MalformedParserOutput {
        /// One-based line number.
        line: usize,
        /// What did not match.
        reason: String,
    },

    /// A persisted annotation is not in the line format.
    #[error("malformed annotation at line {line}: {reason}")]
    MalformedAnnotation {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A text is not in the state a transition requires.
    #[error("text {id} is {found}, expected {expected}")]
    LifecycleConflict {
        /// The text that was asked to move.
        id: TextId,
        /// The state the transition starts from.
        expected: TextState,
        /// The state the text is actually in.
        found: TextState,
    },

    /// A text changed between being read and being written back.
    #[error("text {0} changed since it was read")]
    StaleText(TextId),

    /// No text with this id exists in any state.
    #[error("text {0} not found")]
    NotFound(TextId),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed language rules; fatal for that language until fixed.
    Configuration,
    /// Input rejected before any processing; the caller can adjust it.
    Validation,
    /// Persisted annotation data is damaged.
    CorruptAnnotation,
    /// A lifecycle transition was attempted from the wrong state, or lost a
    /// race with another write to the same text.
    LifecycleConflict,
    /// The text does not exist.
    NotFound,
}

impl Error {
    /// Which part of the error taxonomy this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPattern { .. } | Self::InvalidConfig(_) | Self::UnknownLanguage(_) => {
                ErrorKind::Configuration
            }
            Self::TextTooLong { .. }
            | Self::InvalidBudget(_)
            | Self::MalformedParserOutput { .. } => ErrorKind::Validation,
            Self::MalformedAnnotation { .. } => ErrorKind::CorruptAnnotation,
            Self::LifecycleConflict { .. } | Self::StaleText(_) => ErrorKind::LifecycleConflict,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Result type for glosa operations.
pub type Result<T> = std::result::Result<T, Error>;
