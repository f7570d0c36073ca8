//! Carrying annotations across an edit of the raw text.
//!
//! ## The Problem
//!
//! A learner fixes a typo near the start of a long text. The text is
//! re-tokenized from scratch, so every token gets a new sequence index. If
//! annotations were matched by index, one inserted word would shift every
//! later translation onto the wrong token.
//!
//! ## The Alignment
//!
//! Word tokens are aligned by normalized key, old against new:
//!
//! ```text
//! old:  the  cat  ate  the  apple
//! new:  so   the  cat  ate  the  green  apple
//!            |    |    |    |           |
//!            '----'----'----'-----------'  matched
//! ```
//!
//! 1. Strip the common prefix and suffix. Most edits are local, so this
//!    usually leaves a short middle.
//! 2. Run a longest-common-subsequence alignment on the middle when it fits
//!    in [`LCS_CELL_LIMIT`] table cells.
//! 3. For every word still unmatched, project its position into the old
//!    text from the last matched pair and scan outward up to
//!    [`SCAN_WINDOW`] words each way for an unused old word with the same
//!    key. This catches words that moved.
//!
//! Matched words take the old word's translation and tag; the rest start
//! empty. The counts are reported, never raised.
//!
//! ## Worst Case
//!
//! A rewrite whose middle exceeds the cell limit falls back to prefix,
//! suffix and the windowed scan, which is `O(n * SCAN_WINDOW)`. Words that
//! moved further than the window lose their annotation.

use tracing::debug;

use crate::{AnnotatedText, LanguageRuleSet};

/// Largest LCS table, in cells, built for the middle of an edit.
pub const LCS_CELL_LIMIT: usize = 4_000_000;

/// How far, in word positions, the fallback scan looks each way.
pub const SCAN_WINDOW: usize = 64;

/// How a reconciliation went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// New words matched to an old word.
    pub matched: usize,
    /// New words with no counterpart; they start unannotated.
    pub missed: usize,
    /// Matched words whose old word had a translation or tag.
    pub carried: usize,
}

impl ReconcileReport {
    /// Number of word tokens in the new text.
    #[must_use]
    pub const fn words(&self) -> usize {
        self.matched + self.missed
    }
}

/// The result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The re-tokenized text with annotations carried forward.
    pub text: AnnotatedText,
    /// Match statistics.
    pub report: ReconcileReport,
}

/// Re-tokenize `new_raw` and carry annotations over from `old`.
///
/// Never fails: with nothing in common the result is simply unannotated.
///
/// ## Example
///
/// ```rust
/// use glosa::{reconcile, AnnotatedText, LanguageConfig, LanguageRuleSet, SequenceIndex};
///
/// let rules = LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-Z", "[.!?]")).unwrap();
/// let mut old = AnnotatedText::parse("I eat an apple.", &rules).unwrap();
/// old.annotate(&SequenceIndex::from_position(7), Some("pomme"), None);
///
/// let result = reconcile(&old, "Today I eat an apple.", &rules);
/// let apple = result.text.tokens().iter().find(|t| t.surface == "apple").unwrap();
/// assert_eq!(apple.translation.as_deref(), Some("pomme"));
/// assert_eq!(result.report.missed, 1);
/// ```
pub fn reconcile(old: &AnnotatedText, new_raw: &str, rules: &LanguageRuleSet) -> Reconciliation {
    let mut text = AnnotatedText::build(new_raw, rules);

    let old_words: Vec<usize> = word_positions(old);
    let new_words: Vec<usize> = word_positions(&text);

    let matches = {
        let old_keys: Vec<&str> = old_words
            .iter()
            .map(|&i| old.tokens()[i].key.as_str())
            .collect();
        let new_keys: Vec<&str> = new_words
            .iter()
            .map(|&i| text.tokens()[i].key.as_str())
            .collect();
        align(&old_keys, &new_keys)
    };

    let mut report = ReconcileReport::default();
    let tokens = text.tokens_mut();
    for (n, matched) in matches.into_iter().enumerate() {
        let Some(o) = matched else {
            report.missed += 1;
            continue;
        };
        let source = &old.tokens()[old_words[o]];
        let target = &mut tokens[new_words[n]];
        target.translation.clone_from(&source.translation);
        target.tag.clone_from(&source.tag);
        report.matched += 1;
        if source.is_annotated() {
            report.carried += 1;
        }
    }

    debug!(
        matched = report.matched,
        missed = report.missed,
        carried = report.carried,
        "reconciled edited text"
    );
    Reconciliation { text, report }
}

fn word_positions(text: &AnnotatedText) -> Vec<usize> {
    text.tokens()
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_word)
        .map(|(i, _)| i)
        .collect()
}

/// For each new key, the index of the old key it is aligned with.
fn align(old: &[&str], new: &[&str]) -> Vec<Option<usize>> {
    let mut matched = vec![None; new.len()];
    let mut used = vec![false; old.len()];

    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    for i in 0..prefix {
        matched[i] = Some(i);
        used[i] = true;
    }

    let room = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(room)
        .take_while(|(a, b)| a == b)
        .count();
    for k in 1..=suffix {
        matched[new.len() - k] = Some(old.len() - k);
        used[old.len() - k] = true;
    }

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    if old_mid.len().saturating_mul(new_mid.len()) <= LCS_CELL_LIMIT {
        for (o, n) in lcs(old_mid, new_mid) {
            matched[prefix + n] = Some(prefix + o);
            used[prefix + o] = true;
        }
    }

    let mut anchor: Option<(usize, usize)> = None;
    for n in 0..new.len() {
        if let Some(o) = matched[n] {
            anchor = Some((o, n));
            continue;
        }
        let projected = anchor.map_or(n, |(o, a)| o + (n - a));
        if let Some(o) = scan(old, &used, new[n], projected) {
            matched[n] = Some(o);
            used[o] = true;
            anchor = Some((o, n));
        }
    }

    matched
}

/// Pairs `(i, j)` of a longest common subsequence of `a` and `b`.
fn lcs(a: &[&str], b: &[&str]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return vec![];
    }

    // table[i * (m + 1) + j] = LCS length of a[i..] and b[j..]
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Nearest unused old position around `projected` holding `key`.
fn scan(old: &[&str], used: &[bool], key: &str, projected: usize) -> Option<usize> {
    let hit = |i: usize| i < old.len() && !used[i] && old[i] == key;
    (0..=SCAN_WINDOW).find_map(|d| {
        if hit(projected + d) {
            Some(projected + d)
        } else if d > 0 && d <= projected && hit(projected - d) {
            Some(projected - d)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LanguageConfig, SequenceIndex};

    fn english() -> LanguageRuleSet {
        LanguageRuleSet::new(LanguageConfig::new("en", "a-zA-Z", "[.!?]")).unwrap()
    }

    fn annotate_word(text: &mut AnnotatedText, surface: &str, translation: &str) {
        let seq = text
            .tokens()
            .iter()
            .find(|t| t.surface == surface)
            .map(|t| t.seq.clone())
            .unwrap();
        assert!(text.annotate(&seq, Some(translation), None));
    }

    fn translation_of<'a>(text: &'a AnnotatedText, surface: &str) -> Option<&'a str> {
        text.tokens()
            .iter()
            .find(|t| t.surface == surface)
            .and_then(|t| t.translation.as_deref())
    }

    #[test]
    fn test_align_insertion() {
        let matched = align(&["a", "b", "c"], &["x", "a", "b", "c"]);
        assert_eq!(matched, vec![None, Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_align_deletion() {
        let matched = align(&["a", "b", "c", "d"], &["a", "c", "d"]);
        assert_eq!(matched, vec![Some(0), Some(2), Some(3)]);
    }

    #[test]
    fn test_align_middle_edit() {
        let matched = align(&["a", "b", "c", "d", "e"], &["a", "c", "x", "b", "e"]);
        // LCS picks "c" or "b" in the middle; the scan recovers the other.
        assert_eq!(matched[0], Some(0));
        assert_eq!(matched[2], None);
        assert_eq!(matched[4], Some(4));
        assert!(matched[1].is_some() && matched[3].is_some());
    }

    #[test]
    fn test_align_repeated_words() {
        let matched = align(&["the", "cat", "the", "dog"], &["the", "dog"]);
        // Prefix matching claims the first "the".
        assert_eq!(matched, vec![Some(0), Some(3)]);
    }

    #[test]
    fn test_lcs() {
        let pairs = lcs(&["a", "b", "c", "d"], &["b", "d", "a"]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs, vec![(1, 0), (3, 1)]);
    }

    #[test]
    fn test_insert_before_keeps_annotation() {
        let rules = english();
        let mut old = AnnotatedText::parse("I like the apple.", &rules).unwrap();
        annotate_word(&mut old, "apple", "pomme");

        let result = reconcile(&old, "Yesterday I like the apple.", &rules);
        assert_eq!(translation_of(&result.text, "apple"), Some("pomme"));
        assert_eq!(result.report.matched, 4);
        assert_eq!(result.report.missed, 1);
        assert_eq!(result.report.carried, 1);
    }

    #[test]
    fn test_fresh_sequence_indices() {
        let rules = english();
        let old = AnnotatedText::parse("b c", &rules).unwrap();
        let result = reconcile(&old, "a b c", &rules);
        for (i, token) in result.text.tokens().iter().enumerate() {
            assert_eq!(token.seq, SequenceIndex::from_position(i + 1));
        }
    }

    #[test]
    fn test_case_change_still_matches() {
        let rules = english();
        let mut old = AnnotatedText::parse("apple pie", &rules).unwrap();
        annotate_word(&mut old, "apple", "pomme");

        let result = reconcile(&old, "Apple pie", &rules);
        assert_eq!(translation_of(&result.text, "Apple"), Some("pomme"));
    }

    #[test]
    fn test_moved_word_found_by_scan() {
        let rules = english();
        let mut old = AnnotatedText::parse("alpha beta gamma delta", &rules).unwrap();
        annotate_word(&mut old, "alpha", "A");
        annotate_word(&mut old, "delta", "D");

        let result = reconcile(&old, "delta beta gamma alpha", &rules);
        assert_eq!(translation_of(&result.text, "alpha"), Some("A"));
        assert_eq!(translation_of(&result.text, "delta"), Some("D"));
        assert_eq!(result.report.missed, 0);
    }

    /// A distinct all-letter word for `n`.
    fn word(mut n: usize) -> String {
        let mut out = String::from("w");
        loop {
            out.push(char::from(b'a' + (n % 26) as u8));
            n /= 26;
            if n == 0 {
                return out;
            }
        }
    }

    #[test]
    fn test_large_rewrite_falls_back_to_scan() {
        let rules = english();
        let words: Vec<String> = (0..2_100).map(word).collect();
        let body = words.join(" ");
        let mut old = AnnotatedText::parse(&format!("Start {body} end."), &rules).unwrap();
        annotate_word(&mut old, &words[0], "first");
        annotate_word(&mut old, &words[1_000], "middle");
        annotate_word(&mut old, &words[2_099], "last");

        // New words on both ends leave no common prefix or suffix.
        let lead: Vec<String> = (0..10).map(|n| format!("x{}", word(n))).collect();
        let new_raw = format!("{} Begin {body} finish.", lead.join(" "));
        let result = reconcile(&old, &new_raw, &rules);
        assert!(old.word_count() * result.report.words() > LCS_CELL_LIMIT);

        assert_eq!(result.report.matched, 2_100);
        assert_eq!(result.report.missed, 12);
        assert_eq!(result.report.carried, 3);
        assert_eq!(translation_of(&result.text, &words[0]), Some("first"));
        assert_eq!(translation_of(&result.text, &words[1_000]), Some("middle"));
        assert_eq!(translation_of(&result.text, &words[2_099]), Some("last"));
    }

    #[test]
    fn test_scan_window_bounds_moves() {
        let rules = english();
        let words: Vec<String> = (0..2_100).map(word).collect();
        let mut old =
            AnnotatedText::parse(&format!("Start {} end.", words.join(" ")), &rules).unwrap();
        annotate_word(&mut old, &words[0], "first");
        annotate_word(&mut old, &words[50], "near");

        // The first word moves far beyond the window, the other does not.
        let mut moved = words.clone();
        let first = moved.remove(0);
        moved.push(first);
        let near = moved.remove(49);
        moved.insert(49 + SCAN_WINDOW / 2, near);
        let result = reconcile(&old, &format!("Begin {} finish.", moved.join(" ")), &rules);

        assert_eq!(translation_of(&result.text, &words[0]), None);
        assert_eq!(translation_of(&result.text, &words[50]), Some("near"));
    }

    #[test]
    fn test_total_loss_is_not_an_error() {
        let rules = english();
        let mut old = AnnotatedText::parse("one two", &rules).unwrap();
        annotate_word(&mut old, "one", "un");

        let result = reconcile(&old, "three four", &rules);
        assert_eq!(result.report.matched, 0);
        assert_eq!(result.report.missed, 2);
        assert!(result.text.tokens().iter().all(|t| !t.is_annotated()));
    }

    #[test]
    fn test_empty_inputs() {
        let rules = english();
        let old = AnnotatedText::parse("", &rules).unwrap();
        let result = reconcile(&old, "new words", &rules);
        assert_eq!(result.report.words(), 2);
        assert_eq!(result.report.matched, 0);

        let result = reconcile(&result.text, "", &rules);
        assert!(result.text.tokens().is_empty());
        assert_eq!(result.report, ReconcileReport::default());
    }
}
