//! Compiled per-language rules.
//!
//! Every other component takes a `&LanguageRuleSet` explicitly. A rule set is
//! immutable once built, so one instance can be shared across threads and
//! across any number of concurrent segmentation calls.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use crate::config::{LanguageConfig, Substitution};
use crate::{Error, Result};

/// Closing quotes and brackets that stay with the sentence they follow.
const CLOSERS: &str = r#"["'”’»)\]}」』]*"#;

/// A language's segmentation rules with all patterns compiled.
///
/// ## Example
///
/// ```rust
/// use glosa::{LanguageConfig, LanguageRuleSet};
///
/// let rules = LanguageRuleSet::new(
///     LanguageConfig::new("en", "a-zA-Z", "[.!?]").with_exceptions(["Dr."]),
/// )
/// .unwrap();
///
/// assert!(rules.is_exception("dr"));
/// assert!(rules.is_word("Smith"));
/// ```
#[derive(Debug, Clone)]
pub struct LanguageRuleSet {
    config: LanguageConfig,
    word_run: Regex,
    word_start: Regex,
    terminator_run: Regex,
    exceptions: HashSet<String>,
    longest_exception: usize,
}

impl LanguageRuleSet {
    /// Compile a configuration.
    ///
    /// Exceptions are matched case-insensitively and a trailing terminator
    /// is ignored, so `"Dr."` and `"dr"` are the same exception.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if either pattern fails to compile,
    /// and [`Error::InvalidConfig`] if the terminator pattern can match
    /// empty text.
    pub fn new(config: LanguageConfig) -> Result<Self> {
        let word_run = compile(
            "word_characters",
            &config.word_characters,
            &format!("[{}]+", config.word_characters),
        )?;
        let word_start = compile(
            "word_characters",
            &config.word_characters,
            &format!("^[{}]", config.word_characters),
        )?;
        let terminator_run = compile(
            "sentence_terminators",
            &config.sentence_terminators,
            &format!("(?:{})+{CLOSERS}", config.sentence_terminators),
        )?;
        let trailing_terminators = compile(
            "sentence_terminators",
            &config.sentence_terminators,
            &format!("(?:{})+$", config.sentence_terminators),
        )?;

        if terminator_run.is_match("") {
            return Err(Error::InvalidConfig(format!(
                "sentence_terminators {:?} matches empty text",
                config.sentence_terminators
            )));
        }

        let exceptions: HashSet<String> = config
            .exceptions
            .iter()
            .map(|e| trailing_terminators.replace(e.trim(), "").to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        let longest_exception = exceptions
            .iter()
            .map(|e| e.chars().count())
            .max()
            .unwrap_or(0);

        debug!(
            code = %config.code,
            exceptions = config.exceptions.len(),
            substitutions = config.substitutions.len(),
            split_each_character = config.split_each_character,
            "compiled language rules"
        );

        Ok(Self {
            config,
            word_run,
            word_start,
            terminator_run,
            exceptions,
            longest_exception,
        })
    }

    /// Compile one of the embedded presets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLanguage`] for codes without a preset.
    pub fn preset(code: &str) -> Result<Self> {
        Self::new(LanguageConfig::preset(code)?)
    }

    /// The configuration this rule set was built from.
    #[must_use]
    pub const fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// Language code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.config.code
    }

    /// Whether every character is its own token.
    #[must_use]
    pub const fn split_each_character(&self) -> bool {
        self.config.split_each_character
    }

    /// Whether the script is written right to left.
    #[must_use]
    pub const fn right_to_left(&self) -> bool {
        self.config.right_to_left
    }

    /// The character substitutions, in application order.
    #[must_use]
    pub fn substitutions(&self) -> &[Substitution] {
        &self.config.substitutions
    }

    /// Apply the substitutions to raw text.
    ///
    /// Returns the text unchanged when there is nothing to substitute.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        self.config
            .substitutions
            .iter()
            .filter(|s| !s.from.is_empty())
            .fold(text.to_string(), |acc, s| acc.replace(&s.from, &s.to))
    }

    /// Whether `word` (case-insensitively) suppresses a following split.
    #[must_use]
    pub fn is_exception(&self, word: &str) -> bool {
        !self.exceptions.is_empty() && self.exceptions.contains(&word.to_lowercase())
    }

    /// Whether a token's surface text is a word, judged by its first
    /// character.
    #[must_use]
    pub fn is_word(&self, surface: &str) -> bool {
        self.word_start.is_match(surface)
    }

    pub(crate) const fn word_run(&self) -> &Regex {
        &self.word_run
    }

    pub(crate) const fn terminator_run(&self) -> &Regex {
        &self.terminator_run
    }

    /// Length in characters of the longest exception, 0 if there are none.
    pub(crate) const fn longest_exception(&self) -> usize {
        self.longest_exception
    }
}

fn compile(field: &'static str, pattern: &str, full: &str) -> Result<Regex> {
    Regex::new(full).map_err(|source| Error::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

/// Compiled rule sets keyed by language code.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    rules: HashMap<String, LanguageRuleSet>,
}

impl LanguageRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every embedded preset.
    ///
    /// # Errors
    ///
    /// Fails only if an embedded preset is broken.
    pub fn with_presets() -> Result<Self> {
        let mut registry = Self::new();
        for code in LanguageConfig::preset_codes() {
            registry.insert(LanguageRuleSet::preset(code)?);
        }
        Ok(registry)
    }

    /// Add or replace the rules for `rules.code()`.
    pub fn insert(&mut self, rules: LanguageRuleSet) {
        self.rules.insert(rules.code().to_string(), rules);
    }

    /// Rules for a language.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLanguage`] if nothing is registered for `code`.
    pub fn get(&self, code: &str) -> Result<&LanguageRuleSet> {
        self.rules
            .get(code)
            .ok_or_else(|| Error::UnknownLanguage(code.to_string()))
    }

    /// Number of registered languages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no language is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
