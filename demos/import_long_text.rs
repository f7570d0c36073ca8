//! Importing a Long Text
//!
//! Splits an oversized text into numbered drafts, imports them, annotates a
//! word, edits the text, and takes it through archive and restore.
//!
//! ```bash
//! RUST_LOG=glosa=debug cargo run --example import_long_text
//! ```

use glosa::{
    AnnotationCodec, ArchiveLifecycle, ChunkBudget, ChunkMode, LanguageRegistry, LongTextChunker,
    MediaRefs, MemoryStore, Result, StoredText, TextId, TextStore,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let document = "Dr. Watson arrived in London on a grey morning. \
        The streets were wet. Mrs. Hudson opened the door.\n\n\
        Holmes was at the window. He did not turn around. \
        \"You have been in Afghanistan, I perceive.\"\n\n\
        Watson sat down. The fire was warm. Outside, the rain kept falling.";

    let registry = LanguageRegistry::with_presets()?;
    let rules = registry.get("en")?.clone();
    let lifecycle = ArchiveLifecycle::new(MemoryStore::new(), registry);

    // Tiny budget so the short document still splits.
    let chunker = LongTextChunker::new(ChunkBudget::new(3, 200)?).with_mode(ChunkMode::Paragraphs);
    let media = MediaRefs {
        audio_uri: None,
        source_uri: Some("https://www.gutenberg.org/ebooks/244".into()),
    };
    let drafts = chunker.drafts("A Study in Scarlet", document, &rules, &media);

    println!("Document: {} chars", document.chars().count());
    println!("Drafts: {}\n", drafts.len());

    let mut ids = Vec::new();
    for (n, draft) in drafts.into_iter().enumerate() {
        let id = TextId(n as u64 + 1);
        println!("[{id}] {}: {:?}", draft.title, draft.text);
        lifecycle.import(id, "en", draft)?;
        ids.push(id);
    }

    // Annotate "window" in the second text, the way a reader UI would.
    let id = ids[1];
    let current = lifecycle.store().fetch(id);
    if let Some(StoredText::Active(mut active)) = current.clone() {
        let codec = AnnotationCodec::new(&rules);
        let mut text = codec.decode(&active.record.raw_text, &active.record.annotation)?;
        let window = text
            .tokens()
            .iter()
            .find(|t| t.key == "window")
            .map(|t| t.seq.clone());
        if let Some(seq) = window {
            text.annotate(&seq, Some("Fenster"), Some("noun"));
        }
        active.record.annotation = codec.encode(&text);
        lifecycle
            .store()
            .replace(id, current.as_ref(), Some(StoredText::Active(active)))?;
    }

    let report = lifecycle.edit(
        id,
        "Holmes stood at the open window. He did not turn around.",
    )?;
    println!(
        "\nEdit: {} words matched, {} new, {} annotations carried",
        report.matched, report.missed, report.carried
    );

    let archived = lifecycle.archive_many(&ids);
    println!("Archived {}/{}", archived.succeeded_count(), archived.requested());

    let restored = lifecycle.restore_many(&ids);
    println!("Restored {}/{}", restored.succeeded_count(), restored.requested());

    if let Some(StoredText::Active(active)) = lifecycle.store().fetch(id) {
        println!("\nText {id} after restore:");
        println!("{}", active.record.annotation);
    }

    Ok(())
}
