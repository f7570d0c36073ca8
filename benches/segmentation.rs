//! Benchmarks for segmentation, the annotation codec, reconciliation and
//! long-text chunking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glosa::{
    reconcile, segment, AnnotatedText, AnnotationCodec, LanguageRuleSet, LongTextChunker,
    SequenceIndex,
};

fn sample_text(size: usize) -> String {
    let sentences = [
        "The quick brown fox jumps over the lazy dog. ",
        "Pack my box with five dozen liquor jugs. ",
        "How vexingly quick daft zebras jump! ",
        "Dr. Jekyll met Mr. Hyde at noon. ",
        "Sphinx of black quartz, judge my vow.\n\n",
    ];
    let mut text = String::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text.truncate(size);
    text
}

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");
    let rules = LanguageRuleSet::preset("en").unwrap();

    for size in [1_000, 10_000, 60_000] {
        let text = sample_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("english", size), &text, |b, text| {
            b.iter(|| segment(black_box(text), &rules));
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let rules = LanguageRuleSet::preset("en").unwrap();
    let codec = AnnotationCodec::new(&rules);

    for size in [1_000, 10_000, 60_000] {
        let text = sample_text(size);
        let annotated = AnnotatedText::parse(&text, &rules).unwrap();
        let lines = codec.encode(&annotated);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &annotated, |b, t| {
            b.iter(|| codec.encode(black_box(t)));
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &lines, |b, lines| {
            b.iter(|| codec.decode(&text, black_box(lines)));
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let rules = LanguageRuleSet::preset("en").unwrap();

    for size in [1_000, 10_000, 60_000] {
        let text = sample_text(size);
        let mut old = AnnotatedText::parse(&text, &rules).unwrap();
        old.annotate(&SequenceIndex::from_position(1), Some("le"), None);
        // An edit in the middle defeats prefix and suffix trimming.
        let mid = text.len() / 2;
        let cut = (mid..text.len()).find(|&i| text.is_char_boundary(i)).unwrap_or(mid);
        let edited = format!("{} Suddenly, a cat. {}", &text[..cut], &text[cut..]);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("middle_edit", size), &edited, |b, edited| {
            b.iter(|| reconcile(&old, black_box(edited), &rules));
        });
    }

    group.finish();
}

fn bench_chunker(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunker");
    let rules = LanguageRuleSet::preset("en").unwrap();
    let chunker = LongTextChunker::default();

    for size in [100_000, 1_000_000] {
        let text = sample_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("stream", size), &text, |b, text| {
            b.iter(|| chunker.chunk(black_box(text), &rules));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_segment,
    bench_codec,
    bench_reconcile,
    bench_chunker
);
criterion_main!(benches);
