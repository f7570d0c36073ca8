//! Language configuration.
//!
//! A [`LanguageConfig`] is the uncompiled, serializable description of a
//! language. It is what gets stored, edited and shipped as TOML; turning it
//! into a [`LanguageRuleSet`](crate::LanguageRuleSet) compiles its patterns
//! and is the only place a bad pattern is reported.
//!
//! ```toml
//! code = "en"
//! name = "English"
//! word_characters = "a-zA-Z'"
//! sentence_terminators = "[.!?]"
//! exceptions = ["Mr.", "Dr."]
//!
//! [[substitutions]]
//! from = "´"
//! to = "'"
//! ```
//!
//! Three presets are embedded in the crate: English (`en`), Japanese (`ja`,
//! one token per character) and Arabic (`ar`, right-to-left).

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! embed_language_config {
    ($code:expr, $path:expr) => {
        ($code, include_str!($path))
    };
}

const EMBEDDED_CONFIGS: [(&str, &str); 3] = [
    embed_language_config!("en", "../configs/languages/english.toml"),
    embed_language_config!("ja", "../configs/languages/japanese.toml"),
    embed_language_config!("ar", "../configs/languages/arabic.toml"),
];

/// One literal replacement applied to raw text before segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// Text to look for.
    pub from: String,
    /// Text to put in its place.
    pub to: String,
}

impl Substitution {
    /// Create a substitution.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parse the pipe-delimited form `"´='|`='"`.
    ///
    /// Entries without `=` or with an empty left side are skipped.
    ///
    /// ```rust
    /// use glosa::Substitution;
    ///
    /// let subs = Substitution::parse_list("´='|`='");
    /// assert_eq!(subs, vec![Substitution::new("´", "'"), Substitution::new("`", "'")]);
    /// ```
    #[must_use]
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split('|')
            .filter_map(|entry| entry.split_once('='))
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| Self::new(from, to))
            .collect()
    }
}

/// Parse the pipe-delimited exception form `"Mr.|Dr."`.
#[must_use]
pub fn parse_exception_list(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Uncompiled per-language rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language code, e.g. `"en"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Character-class content (no brackets) for word characters.
    pub word_characters: String,
    /// Regex fragment matching one sentence terminator.
    pub sentence_terminators: String,
    /// Words that swallow the terminator after them, e.g. `"Dr."`.
    #[serde(default)]
    pub exceptions: Vec<String>,
    /// Replacements applied in order before segmentation.
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    /// Emit every character as its own token.
    #[serde(default)]
    pub split_each_character: bool,
    /// Script is written right to left. Presentation only.
    #[serde(default)]
    pub right_to_left: bool,
}

impl LanguageConfig {
    /// A config with the required patterns and everything else off.
    pub fn new(
        code: impl Into<String>,
        word_characters: impl Into<String>,
        sentence_terminators: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            word_characters: word_characters.into(),
            sentence_terminators: sentence_terminators.into(),
            exceptions: Vec::new(),
            substitutions: Vec::new(),
            split_each_character: false,
            right_to_left: false,
        }
    }

    /// Set the sentence-split exceptions.
    #[must_use]
    pub fn with_exceptions<I, S>(mut self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions = exceptions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the character substitutions.
    #[must_use]
    pub fn with_substitutions(mut self, substitutions: Vec<Substitution>) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// Toggle one-token-per-character mode.
    #[must_use]
    pub const fn with_split_each_character(mut self, on: bool) -> Self {
        self.split_each_character = on;
        self
    }

    /// Toggle the right-to-left flag.
    #[must_use]
    pub const fn with_right_to_left(mut self, on: bool) -> Self {
        self.right_to_left = on;
        self
    }

    /// Read a config from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the document does not parse or
    /// misses a required field.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load one of the embedded presets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLanguage`] for codes without a preset.
    pub fn preset(code: &str) -> Result<Self> {
        let (_, source) = EMBEDDED_CONFIGS
            .iter()
            .find(|(c, _)| *c == code)
            .ok_or_else(|| Error::UnknownLanguage(code.to_string()))?;

        let config = Self::from_toml(source)?;
        if config.code != code {
            return Err(Error::InvalidConfig(format!(
                "config code mismatch: expected {code}, got {}",
                config.code
            )));
        }
        Ok(config)
    }

    /// Codes of the embedded presets.
    #[must_use]
    pub fn preset_codes() -> Vec<&'static str> {
        EMBEDDED_CONFIGS.iter().map(|(code, _)| *code).collect()
    }
}
