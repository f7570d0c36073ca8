//! Text lifecycle: import, edit, archive, restore, delete.
//!
//! ## States
//!
//! ```text
//! Draft ──import──> Active ──archive──> Archived ──delete──> Deleted
//!                   ^    |              |
//!                   |    '─edit─> Active|
//!                   '──────restore──────'
//! ```
//!
//! An active text has derived rows (sentences and token occurrences) next to
//! its record. Archiving keeps only the record: raw text, the annotation
//! string and media references. The annotation alone is enough to rebuild
//! the rows, so restoring re-segments the stored raw text for structure and
//! takes every translation from the stored annotation, which comes back
//! byte for byte.
//!
//! ## Atomicity
//!
//! Storage belongs to a [`TextStore`]. Each transition reads the text, builds
//! the replacement, then commits with [`TextStore::replace`], handing back
//! the exact text it read. The store swaps only if the text is still that
//! one, so a transition that raced with any other write to the same id (an
//! edit, a new annotation, another transition) fails with a conflict and
//! changes nothing. Bulk operations run the single-item transition per id
//! and report how many succeeded.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::annotation::{encode, AnnotationCodec};
use crate::limits::ensure_text_length;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::{
    segment, AnnotatedText, Error, LanguageRegistry, LanguageRuleSet, Result, Sentence,
    SequenceIndex,
};

/// Identifier of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextId(pub u64);

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a text is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextState {
    /// Staged for import, not stored yet.
    Draft,
    /// Stored with its derived rows.
    Active,
    /// Stored as a bare record.
    Archived,
    /// Gone.
    Deleted,
}

impl TextState {
    /// Whether the lifecycle has an edge from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft | Self::Archived, Self::Active)
                | (Self::Active, Self::Active | Self::Archived)
                | (Self::Archived, Self::Deleted)
        )
    }
}

impl fmt::Display for TextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        })
    }
}

/// Audio and source links. Opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRefs {
    /// Recording of the text.
    pub audio_uri: Option<String>,
    /// Where the text came from.
    pub source_uri: Option<String>,
}

/// A text waiting to be imported, usually one chunk of a long text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftText {
    /// Title, numbered when the draft is one of several.
    pub title: String,
    /// Raw text.
    pub text: String,
    /// One-based position among its sibling drafts.
    pub sequence: usize,
    /// Number of sibling drafts.
    pub total: usize,
    /// Media references shared by all siblings.
    pub media: MediaRefs,
}

impl DraftText {
    /// A standalone draft.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            sequence: 1,
            total: 1,
            media: MediaRefs::default(),
        }
    }
}

/// What survives archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    /// Identifier.
    pub id: TextId,
    /// Language code, resolved through a [`LanguageRegistry`].
    pub language: String,
    /// Title.
    pub title: String,
    /// Raw text as imported or last edited.
    pub raw_text: String,
    /// Encoded [`AnnotatedText`].
    pub annotation: String,
    /// Media references.
    pub media: MediaRefs,
}

/// One token's place in an active text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Position of the sentence holding the token.
    pub sentence: usize,
    /// One-based position of the token in the text.
    pub order: usize,
    /// The token's sequence index.
    pub seq: SequenceIndex,
    /// The token's normalized key.
    pub key: String,
    /// Whether the token is a word.
    pub is_word: bool,
}

/// A text in the active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveText {
    /// The durable part.
    pub record: TextRecord,
    /// Derived sentence rows.
    pub sentences: Vec<Sentence>,
    /// Derived token rows.
    pub occurrences: Vec<Occurrence>,
}

/// A text in the archived state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedText {
    /// The record, unchanged since archiving.
    pub record: TextRecord,
}

/// A stored text in either state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredText {
    /// Active text.
    Active(ActiveText),
    /// Archived text.
    Archived(ArchivedText),
}

impl StoredText {
    /// The lifecycle state this row is in.
    #[must_use]
    pub const fn state(&self) -> TextState {
        match self {
            Self::Active(_) => TextState::Active,
            Self::Archived(_) => TextState::Archived,
        }
    }
}

/// Storage for texts, provided by the caller.
pub trait TextStore {
    /// The stored text with this id, if any.
    fn fetch(&self, id: TextId) -> Option<StoredText>;

    /// Atomically replace the text at `id` if it is still `current`.
    ///
    /// `current` is the text as the caller last fetched it, `None` for "not
    /// stored". `next` of `None` removes the text. Stores backed by a
    /// database usually compare a version column bumped on every write
    /// instead of the whole row.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if a stored text was expected but none exists,
    /// [`Error::LifecycleConflict`] if the text is in another state,
    /// [`Error::StaleText`] if it is in the same state but was rewritten.
    /// Nothing changes in any case.
    fn replace(
        &self,
        id: TextId,
        current: Option<&StoredText>,
        next: Option<StoredText>,
    ) -> Result<()>;
}

/// A [`TextStore`] in a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    texts: Mutex<HashMap<TextId, StoredText>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The state of `id`, or `None` if it is not stored.
    #[must_use]
    pub fn state(&self, id: TextId) -> Option<TextState> {
        self.fetch(id).map(|t| t.state())
    }

    /// Number of stored texts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextStore for MemoryStore {
    fn fetch(&self, id: TextId) -> Option<StoredText> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn replace(
        &self,
        id: TextId,
        current: Option<&StoredText>,
        next: Option<StoredText>,
    ) -> Result<()> {
        let mut texts = self.texts.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = texts.get(&id);
        if stored != current {
            return Err(mismatch(id, current, stored));
        }
        match next {
            Some(text) => texts.insert(id, text),
            None => texts.remove(&id),
        };
        Ok(())
    }
}

/// Why a compare-and-swap found `stored` where it expected `current`.
fn mismatch(id: TextId, current: Option<&StoredText>, stored: Option<&StoredText>) -> Error {
    let expected = current.map_or(TextState::Draft, StoredText::state);
    let found = stored.map_or(TextState::Draft, StoredText::state);
    if found == expected {
        Error::StaleText(id)
    } else if found == TextState::Draft {
        Error::NotFound(id)
    } else {
        Error::LifecycleConflict {
            id,
            expected,
            found,
        }
    }
}

/// Outcome of a bulk transition.
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Ids that moved.
    pub succeeded: Vec<TextId>,
    /// Ids that did not, with the reason. They are unchanged.
    pub failed: Vec<(TextId, Error)>,
}

impl BulkReport {
    /// How many ids moved.
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    /// How many ids were asked for.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every id moved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drop an active text's derived rows, keeping its record.
#[must_use]
pub fn archive_text(active: ActiveText) -> ArchivedText {
    debug!(
        id = %active.record.id,
        sentences = active.sentences.len(),
        occurrences = active.occurrences.len(),
        "dropping derived rows"
    );
    ArchivedText {
        record: active.record,
    }
}

/// Rebuild an archived text's rows from its record.
///
/// # Errors
///
/// Returns [`Error::MalformedAnnotation`] if the stored annotation does not
/// decode.
pub fn restore_text(archived: ArchivedText, rules: &LanguageRuleSet) -> Result<ActiveText> {
    activate(archived.record, rules)
}

/// Derive sentence and occurrence rows for a record.
///
/// Sentences come from segmenting the raw text; occurrences come from the
/// decoded annotation, each placed in the sentence covering its offset.
fn activate(record: TextRecord, rules: &LanguageRuleSet) -> Result<ActiveText> {
    let annotated = AnnotationCodec::new(rules).decode(&record.raw_text, &record.annotation)?;
    let sentences = segment(&record.raw_text, rules);

    let mut occurrences = Vec::with_capacity(annotated.tokens().len());
    let mut offset = 0;
    let mut current = 0;
    for (i, token) in annotated.tokens().iter().enumerate() {
        while current + 1 < sentences.len() && offset >= sentences[current].end {
            current += 1;
        }
        occurrences.push(Occurrence {
            sentence: sentences.get(current).map_or(1, |s| s.position),
            order: i + 1,
            seq: token.seq.clone(),
            key: token.key.clone(),
            is_word: token.is_word,
        });
        offset += token.surface.len();
    }

    Ok(ActiveText {
        record,
        sentences,
        occurrences,
    })
}

/// Lifecycle transitions over a [`TextStore`].
///
/// ## Example
///
/// ```rust
/// use glosa::{ArchiveLifecycle, DraftText, LanguageRegistry, MemoryStore, TextId, TextState};
///
/// let lifecycle = ArchiveLifecycle::new(MemoryStore::new(), LanguageRegistry::with_presets().unwrap());
/// let id = TextId(1);
///
/// lifecycle.import(id, "en", DraftText::new("Note", "Hello there. Bye.")).unwrap();
/// lifecycle.archive(id).unwrap();
/// assert_eq!(lifecycle.store().state(id), Some(TextState::Archived));
///
/// lifecycle.restore(id).unwrap();
/// assert_eq!(lifecycle.store().state(id), Some(TextState::Active));
/// ```
#[derive(Debug)]
pub struct ArchiveLifecycle<S> {
    store: S,
    registry: LanguageRegistry,
}

impl<S: TextStore> ArchiveLifecycle<S> {
    /// Wrap a store, resolving languages through `registry`.
    pub const fn new(store: S, registry: LanguageRegistry) -> Self {
        Self { store, registry }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The language registry.
    pub const fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    fn fetch_in(&self, id: TextId, expected: TextState) -> Result<StoredText> {
        let stored = self.store.fetch(id).ok_or(Error::NotFound(id))?;
        let found = stored.state();
        if found == expected {
            Ok(stored)
        } else {
            Err(Error::LifecycleConflict {
                id,
                expected,
                found,
            })
        }
    }

    fn fetch_active(&self, id: TextId) -> Result<ActiveText> {
        match self.fetch_in(id, TextState::Active)? {
            StoredText::Active(active) => Ok(active),
            StoredText::Archived(_) => Err(Error::LifecycleConflict {
                id,
                expected: TextState::Active,
                found: TextState::Archived,
            }),
        }
    }

    fn fetch_archived(&self, id: TextId) -> Result<ArchivedText> {
        match self.fetch_in(id, TextState::Archived)? {
            StoredText::Archived(archived) => Ok(archived),
            StoredText::Active(_) => Err(Error::LifecycleConflict {
                id,
                expected: TextState::Archived,
                found: TextState::Active,
            }),
        }
    }

    /// Store a draft as a new active text (Draft → Active).
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLanguage`], [`Error::TextTooLong`], or
    /// [`Error::LifecycleConflict`] if `id` is already taken.
    pub fn import(&self, id: TextId, language: &str, draft: DraftText) -> Result<()> {
        let rules = self.registry.get(language)?;
        let annotated = AnnotatedText::parse(&draft.text, rules)?;
        let record = TextRecord {
            id,
            language: language.to_string(),
            title: draft.title,
            raw_text: draft.text,
            annotation: encode(&annotated),
            media: draft.media,
        };
        let active = activate(record, rules)?;
        self.store
            .replace(id, None, Some(StoredText::Active(active)))?;
        debug!(%id, language, "imported text");
        Ok(())
    }

    /// Replace an active text's raw text, carrying annotations forward
    /// (Active → Active).
    ///
    /// # Errors
    ///
    /// [`Error::TextTooLong`] for oversized input, [`Error::NotFound`] or
    /// [`Error::LifecycleConflict`] if the text is not active,
    /// [`Error::StaleText`] if it changed while the edit was being built.
    pub fn edit(&self, id: TextId, new_raw: &str) -> Result<ReconcileReport> {
        ensure_text_length(new_raw)?;
        let active = self.fetch_active(id)?;
        let rules = self.registry.get(&active.record.language)?;

        let old = AnnotationCodec::new(rules)
            .decode(&active.record.raw_text, &active.record.annotation)?;
        let reconciled = reconcile(&old, new_raw, rules);

        let record = TextRecord {
            raw_text: new_raw.to_string(),
            annotation: encode(&reconciled.text),
            ..active.record.clone()
        };
        let updated = activate(record, rules)?;
        self.store.replace(
            id,
            Some(&StoredText::Active(active)),
            Some(StoredText::Active(updated)),
        )?;
        debug!(%id, missed = reconciled.report.missed, "edited text");
        Ok(reconciled.report)
    }

    /// Active → Archived.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] or [`Error::LifecycleConflict`], or
    /// [`Error::StaleText`] if the text was written to while archiving.
    pub fn archive(&self, id: TextId) -> Result<()> {
        let active = self.fetch_active(id)?;
        let archived = archive_text(active.clone());
        self.store.replace(
            id,
            Some(&StoredText::Active(active)),
            Some(StoredText::Archived(archived)),
        )?;
        debug!(%id, "archived text");
        Ok(())
    }

    /// Archived → Active.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::LifecycleConflict`],
    /// [`Error::UnknownLanguage`], or [`Error::MalformedAnnotation`] if the
    /// stored annotation is damaged (the text stays archived).
    pub fn restore(&self, id: TextId) -> Result<()> {
        let archived = self.fetch_archived(id)?;
        let rules = self.registry.get(&archived.record.language)?;
        let active = restore_text(archived.clone(), rules)?;
        self.store.replace(
            id,
            Some(&StoredText::Archived(archived)),
            Some(StoredText::Active(active)),
        )?;
        debug!(%id, "restored text");
        Ok(())
    }

    /// Archived → Deleted.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] or [`Error::LifecycleConflict`].
    pub fn delete(&self, id: TextId) -> Result<()> {
        let archived = self.fetch_archived(id)?;
        self.store
            .replace(id, Some(&StoredText::Archived(archived)), None)?;
        debug!(%id, "deleted text");
        Ok(())
    }

    /// [`archive`](Self::archive) each id.
    pub fn archive_many(&self, ids: &[TextId]) -> BulkReport {
        bulk("archive", ids, |id| self.archive(id))
    }

    /// [`restore`](Self::restore) each id.
    pub fn restore_many(&self, ids: &[TextId]) -> BulkReport {
        bulk("restore", ids, |id| self.restore(id))
    }

    /// [`delete`](Self::delete) each id.
    pub fn delete_many(&self, ids: &[TextId]) -> BulkReport {
        bulk("delete", ids, |id| self.delete(id))
    }
}

fn bulk(
    action: &'static str,
    ids: &[TextId],
    transition: impl Fn(TextId) -> Result<()>,
) -> BulkReport {
    let mut report = BulkReport::default();
    for &id in ids {
        match transition(id) {
            Ok(()) => report.succeeded.push(id),
            Err(err) => {
                warn!(%id, action, error = %err, "bulk transition failed");
                report.failed.push((id, err));
            }
        }
    }
    debug!(
        action,
        requested = report.requested(),
        succeeded = report.succeeded_count(),
        "bulk transition finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn lifecycle() -> ArchiveLifecycle<MemoryStore> {
        ArchiveLifecycle::new(MemoryStore::new(), LanguageRegistry::with_presets().unwrap())
    }

    fn active(lifecycle: &ArchiveLifecycle<MemoryStore>, id: TextId) -> ActiveText {
        match lifecycle.store().fetch(id) {
            Some(StoredText::Active(active)) => active,
            other => panic!("expected active text, got {other:?}"),
        }
    }

    #[test]
    fn test_transition_table() {
        assert!(TextState::Draft.can_transition_to(TextState::Active));
        assert!(TextState::Active.can_transition_to(TextState::Archived));
        assert!(TextState::Archived.can_transition_to(TextState::Active));
        assert!(TextState::Archived.can_transition_to(TextState::Deleted));
        assert!(!TextState::Active.can_transition_to(TextState::Deleted));
        assert!(!TextState::Deleted.can_transition_to(TextState::Active));
        assert!(!TextState::Draft.can_transition_to(TextState::Archived));
    }

    #[test]
    fn test_import_derives_rows() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "Hi there. Bye."))
            .unwrap();

        let text = active(&lc, TextId(1));
        assert_eq!(text.sentences.len(), 2);
        // "Hi", " ", "there", "." | " ", "Bye", "."
        assert_eq!(text.occurrences.len(), 7);
        assert_eq!(text.occurrences[3].sentence, 1);
        assert_eq!(text.occurrences[4].sentence, 2);
        assert_eq!(text.occurrences[6].order, 7);
    }

    #[test]
    fn test_import_twice_conflicts() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        let err = lc
            .import(TextId(1), "en", DraftText::new("T", "Two."))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LifecycleConflict);
    }

    #[test]
    fn test_import_unknown_language() {
        let lc = lifecycle();
        let err = lc
            .import(TextId(1), "xx", DraftText::new("T", "One."))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(lc.store().is_empty());
    }

    #[test]
    fn test_archive_drops_rows_keeps_record() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "Hi there."))
            .unwrap();
        let before = active(&lc, TextId(1)).record;

        lc.archive(TextId(1)).unwrap();
        match lc.store().fetch(TextId(1)) {
            Some(StoredText::Archived(archived)) => assert_eq!(archived.record, before),
            other => panic!("expected archived text, got {other:?}"),
        }
    }

    #[test]
    fn test_archive_twice_conflicts() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        lc.archive(TextId(1)).unwrap();

        match lc.archive(TextId(1)) {
            Err(Error::LifecycleConflict {
                expected, found, ..
            }) => {
                assert_eq!(expected, TextState::Active);
                assert_eq!(found, TextState::Archived);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_restore_active_conflicts() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        assert!(matches!(
            lc.restore(TextId(1)),
            Err(Error::LifecycleConflict { .. })
        ));
    }

    #[test]
    fn test_edit_carries_annotations() {
        let lc = lifecycle();
        let rules = lc.registry().get("en").unwrap().clone();
        let codec = AnnotationCodec::new(&rules);

        lc.import(TextId(1), "en", DraftText::new("T", "I eat the apple."))
            .unwrap();

        // Annotate "apple" directly in storage, as the web layer would.
        let current = active(&lc, TextId(1));
        let mut stored = current.clone();
        let mut annotated = codec
            .decode(&stored.record.raw_text, &stored.record.annotation)
            .unwrap();
        assert!(annotated.annotate(&SequenceIndex::from_position(7), Some("pomme"), None));
        stored.record.annotation = codec.encode(&annotated);
        lc.store()
            .replace(
                TextId(1),
                Some(&StoredText::Active(current)),
                Some(StoredText::Active(stored)),
            )
            .unwrap();

        let report = lc.edit(TextId(1), "Now I eat the apple.").unwrap();
        assert_eq!(report.carried, 1);

        let edited = active(&lc, TextId(1));
        assert_eq!(edited.record.raw_text, "Now I eat the apple.");
        let decoded = codec
            .decode(&edited.record.raw_text, &edited.record.annotation)
            .unwrap();
        let apple = decoded
            .tokens()
            .iter()
            .find(|t| t.surface == "apple")
            .unwrap();
        assert_eq!(apple.translation.as_deref(), Some("pomme"));
    }

    #[test]
    fn test_edit_archived_conflicts() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        lc.archive(TextId(1)).unwrap();
        assert!(matches!(
            lc.edit(TextId(1), "Two."),
            Err(Error::LifecycleConflict { .. })
        ));
    }

    #[test]
    fn test_delete_only_archived() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        assert!(lc.delete(TextId(1)).is_err());

        lc.archive(TextId(1)).unwrap();
        lc.delete(TextId(1)).unwrap();
        assert_eq!(lc.store().state(TextId(1)), None);
        assert!(matches!(lc.delete(TextId(1)), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_corrupt_annotation_stays_archived() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        lc.archive(TextId(1)).unwrap();

        let current = lc.store().fetch(TextId(1));
        let Some(StoredText::Archived(mut archived)) = current.clone() else {
            panic!("expected archived text");
        };
        archived.record.annotation = "not\ta valid line".into();
        lc.store()
            .replace(
                TextId(1),
                current.as_ref(),
                Some(StoredText::Archived(archived)),
            )
            .unwrap();

        let err = lc.restore(TextId(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptAnnotation);
        assert_eq!(lc.store().state(TextId(1)), Some(TextState::Archived));
    }

    #[test]
    fn test_bulk_archive_counts() {
        let lc = lifecycle();
        for n in 1..=3 {
            lc.import(TextId(n), "en", DraftText::new("T", "Text."))
                .unwrap();
        }
        lc.archive(TextId(2)).unwrap();

        let report = lc.archive_many(&[TextId(1), TextId(2), TextId(3)]);
        assert_eq!(report.succeeded, vec![TextId(1), TextId(3)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, TextId(2));
        assert_eq!(report.requested(), 3);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_memory_store_replace_checks_state() {
        let store = MemoryStore::new();
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        let text = lc.store().fetch(TextId(1)).unwrap();

        assert!(matches!(
            store.replace(TextId(9), Some(&text), None),
            Err(Error::NotFound(TextId(9)))
        ));
        store.replace(TextId(9), None, Some(text.clone())).unwrap();
        assert!(matches!(
            store.replace(TextId(9), None, Some(text)),
            Err(Error::LifecycleConflict { .. })
        ));
    }

    #[test]
    fn test_memory_store_replace_rejects_rewritten_text() {
        let lc = lifecycle();
        lc.import(TextId(1), "en", DraftText::new("T", "One."))
            .unwrap();
        let read = lc.store().fetch(TextId(1)).unwrap();
        lc.edit(TextId(1), "Two.").unwrap();

        let err = lc.store().replace(TextId(1), Some(&read), None).unwrap_err();
        assert!(matches!(err, Error::StaleText(TextId(1))));
        assert_eq!(err.kind(), ErrorKind::LifecycleConflict);
        assert_eq!(active(&lc, TextId(1)).record.raw_text, "Two.");
    }

    /// Commits a pending edit just before forwarding the next write, the
    /// way a second request would between another transition's read and
    /// its commit.
    struct InterleavingStore {
        inner: MemoryStore,
        pending_edit: Mutex<Option<String>>,
    }

    impl TextStore for InterleavingStore {
        fn fetch(&self, id: TextId) -> Option<StoredText> {
            self.inner.fetch(id)
        }

        fn replace(
            &self,
            id: TextId,
            current: Option<&StoredText>,
            next: Option<StoredText>,
        ) -> Result<()> {
            if let Some(raw) = self.pending_edit.lock().unwrap().take() {
                let Some(StoredText::Active(read)) = self.inner.fetch(id) else {
                    panic!("edit needs an active text");
                };
                let rules = LanguageRuleSet::preset(&read.record.language).unwrap();
                let record = TextRecord {
                    annotation: encode(&AnnotatedText::parse(&raw, &rules).unwrap()),
                    raw_text: raw,
                    ..read.record.clone()
                };
                let edited = activate(record, &rules).unwrap();
                self.inner
                    .replace(
                        id,
                        Some(&StoredText::Active(read)),
                        Some(StoredText::Active(edited)),
                    )
                    .unwrap();
            }
            self.inner.replace(id, current, next)
        }
    }

    #[test]
    fn test_archive_racing_edit_keeps_edit() {
        let store = InterleavingStore {
            inner: MemoryStore::new(),
            pending_edit: Mutex::new(None),
        };
        let lc = ArchiveLifecycle::new(store, LanguageRegistry::with_presets().unwrap());
        lc.import(TextId(1), "en", DraftText::new("T", "Before."))
            .unwrap();

        *lc.store().pending_edit.lock().unwrap() = Some("After the edit.".into());
        let err = lc.archive(TextId(1)).unwrap_err();
        assert!(matches!(err, Error::StaleText(TextId(1))));

        match lc.store().fetch(TextId(1)) {
            Some(StoredText::Active(text)) => {
                assert_eq!(text.record.raw_text, "After the edit.");
            }
            other => panic!("expected the edited text to stay active, got {other:?}"),
        }

        lc.archive(TextId(1)).unwrap();
        match lc.store().fetch(TextId(1)) {
            Some(StoredText::Archived(text)) => {
                assert_eq!(text.record.raw_text, "After the edit.");
            }
            other => panic!("expected archived text, got {other:?}"),
        }
    }
}
