//! # glosa
//!
//! Text processing core for a language-learning reader.
//!
//! ## The Problem
//!
//! A learner pastes a text in a foreign language. The reader shows it one
//! sentence at a time, lets the learner tap any word, and remembers what they
//! wrote next to it. That needs four things to agree with each other:
//!
//! - where sentences start and end,
//! - which pieces of a sentence are words,
//! - how the learner's notes are written down,
//! - what happens to those notes when the text is edited.
//!
//! Every language answers the first two differently. English splits on
//! spaces and has "Dr." that does not end a sentence. Japanese has no spaces
//! at all. Arabic runs right to left. So every rule here is driven by a
//! [`LanguageRuleSet`] built from a small [`LanguageConfig`].
//!
//! ## Pipeline
//!
//! ```text
//! raw text ──normalize──> segment ──> tokenize ──> AnnotatedText ──encode──> lines
//!                           │                          ^      │
//!                           │                          │      └──reconcile(new raw)
//!                           └─> LongTextChunker        decode
//! ```
//!
//! Segmentation and tokenization are lossless: sentence texts concatenate to
//! the normalized input, and token surfaces concatenate to their sentence.
//! For scripts without spaces, [`segment_parser_lines`] does both steps from
//! an external parser's one-token-per-line output instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use glosa::{segment, tokenize, LanguageRuleSet};
//!
//! let rules = LanguageRuleSet::preset("en").unwrap();
//!
//! let sentences = segment("Dr. Smith arrived. He sat down.", &rules);
//! assert_eq!(sentences.len(), 2);
//! assert_eq!(sentences[0].text, "Dr. Smith arrived.");
//!
//! let tokens = tokenize(&sentences[0].text, &rules);
//! let words: Vec<&str> = tokens.iter().filter(|t| t.is_word).map(|t| t.surface.as_str()).collect();
//! assert_eq!(words, vec!["Dr", "Smith", "arrived"]);
//! ```
//!
//! ## Annotations Survive Edits
//!
//! ```rust
//! use glosa::{reconcile, AnnotatedText, LanguageRuleSet, SequenceIndex};
//!
//! let rules = LanguageRuleSet::preset("en").unwrap();
//! let mut old = AnnotatedText::parse("I eat the apple.", &rules).unwrap();
//! old.annotate(&SequenceIndex::from_position(7), Some("pomme"), None);
//!
//! let new = reconcile(&old, "Now I eat the apple.", &rules);
//! let apple = new.text.tokens().iter().find(|t| t.surface == "apple").unwrap();
//! assert_eq!(apple.translation.as_deref(), Some("pomme"));
//! ```
//!
//! ## Long Texts
//!
//! Texts over [`MAX_TEXT_CHARS`] are split into sentence-aligned chunks,
//! each importable on its own:
//!
//! ```rust
//! use glosa::{reassemble, ChunkBudget, LanguageRuleSet, LongTextChunker};
//!
//! let rules = LanguageRuleSet::preset("en").unwrap();
//! let chunker = LongTextChunker::new(ChunkBudget::new(2, 1_000).unwrap());
//!
//! let text = "One. Two. Three. Four. Five.";
//! let chunks = chunker.chunk(text, &rules);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(reassemble(&chunks), text);
//! ```

mod annotation;
mod budget;
mod chunk;
mod chunker;
mod config;
mod error;
mod lifecycle;
mod limits;
mod parser_lines;
mod reconcile;
mod rules;
mod sentence;
mod seq;
mod tokenizer;

pub use annotation::{encode, AnnotatedText, AnnotationCodec};
pub use budget::ChunkBudget;
pub use chunk::{reassemble, TextChunk};
pub use chunker::{chunk, ChunkMode, LongTextChunker};
pub use config::{parse_exception_list, LanguageConfig, Substitution};
pub use error::{Error, ErrorKind, Result};
pub use lifecycle::{
    archive_text, restore_text, ActiveText, ArchiveLifecycle, ArchivedText, BulkReport,
    DraftText, MediaRefs, MemoryStore, Occurrence, StoredText, TextId, TextRecord, TextState,
    TextStore,
};
pub use limits::{ensure_text_length, validate_text_length, MAX_TEXT_CHARS};
pub use parser_lines::{segment_parser_lines, ParsedSentence};
pub use reconcile::{reconcile, ReconcileReport, Reconciliation};
pub use rules::{LanguageRegistry, LanguageRuleSet};
pub use sentence::{segment, Sentence};
pub use seq::{ParseSequenceIndexError, SequenceIndex};
pub use tokenizer::{tokenize, Token};
