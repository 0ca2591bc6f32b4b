//! Benchmarks for TTML parsing and active-cue lookup
//!
//! Generates synthetic documents programmatically so no fixture files are
//! needed. Run with `--features benches`.

use cue_core::{
    timing::format_clock_time,
    track::CueTrack,
    ttml::{AdapterOptions, CaptionAdapter, TtmlAdapter},
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

/// Markup mix of generated paragraphs
#[derive(Debug, Clone, Copy)]
enum Complexity {
    /// Plain text only
    Plain,
    /// Styled spans, line breaks and timed spans
    Styled,
}

/// Synthetic TTML document generator
struct DocumentGenerator {
    cues: usize,
    regions: usize,
    complexity: Complexity,
}

impl DocumentGenerator {
    fn generate(&self) -> String {
        let mut document = String::from(
            r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:tts="http://www.w3.org/ns/ttml#styling"><head><styling>"#,
        );
        document.push_str(r#"<style xml:id="base" tts:color="white" tts:fontSize="100%"/>"#);
        document.push_str(r#"<style xml:id="em" style="base" tts:fontStyle="italic"/>"#);
        document.push_str("</styling><layout>");
        for region in 0..self.regions {
            write!(
                document,
                r#"<region xml:id="r{region}" tts:origin="10% {}%" tts:extent="80% 10%"/>"#,
                10 + region * 10
            )
            .unwrap();
        }
        document.push_str(r#"</layout></head><body style="base"><div>"#);

        for cue in 0..self.cues {
            let start = cue as f64 * 1500.0;
            let begin = format_clock_time(start);
            let end = format_clock_time(start + 2500.0);
            let region = cue % self.regions.max(1);
            let text = match self.complexity {
                Complexity::Plain => format!("Caption number {cue} with some ordinary words"),
                Complexity::Styled => format!(
                    r#"Caption <span style="em">number {cue}</span><br/>with <span tts:fontWeight="bold">bold</span> and <span begin="500ms" end="1s">timed</span> words"#
                ),
            };
            write!(
                document,
                r#"<p region="r{region}" begin="{begin}" end="{end}">{text}</p>"#
            )
            .unwrap();
        }

        document.push_str("</div></body></tt>");
        document
    }
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    let adapter = TtmlAdapter::new();

    for &cues in &[10, 100, 1000] {
        for complexity in [Complexity::Plain, Complexity::Styled] {
            let document = DocumentGenerator {
                cues,
                regions: 4,
                complexity,
            }
            .generate();
            group.throughput(Throughput::Bytes(document.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{complexity:?}").to_lowercase(), cues),
                &document,
                |b, document| b.iter(|| adapter.parse(black_box(document)).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_without_splitting(c: &mut Criterion) {
    let document = DocumentGenerator {
        cues: 1000,
        regions: 4,
        complexity: Complexity::Styled,
    }
    .generate();
    let adapter = TtmlAdapter::with_options(AdapterOptions::default().with_split_timed_spans(false));

    c.bench_function("parsing/styled_merged_1000", |b| {
        b.iter(|| adapter.parse(black_box(&document)).unwrap());
    });
}

fn bench_active_cues(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_cues");

    for &cues in &[100, 1000, 10_000] {
        let document = DocumentGenerator {
            cues,
            regions: 4,
            complexity: Complexity::Plain,
        }
        .generate();
        let mut track = CueTrack::new();
        track.add_result(TtmlAdapter::new().parse(&document).unwrap());
        let duration = cues as f64 * 1500.0;

        group.bench_with_input(BenchmarkId::new("point", cues), &track, |b, track| {
            let mut time = 0.0;
            b.iter(|| {
                time = (time + 733.0) % duration;
                black_box(track.active_cues(black_box(time)))
            });
        });
        group.bench_with_input(BenchmarkId::new("range", cues), &track, |b, track| {
            b.iter(|| black_box(track.cues_between(black_box(duration / 2.0), black_box(duration / 2.0 + 10_000.0))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_without_splitting, bench_active_cues);
criterion_main!(benches);
