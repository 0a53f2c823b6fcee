//! Benchmarks for line parsing, canonicalization and classification.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use disparity_core::{canonicalize, parse, Classifier, CompareMode, ToolOutput};

/// Representative cstool-style lines: offset, raw bytes, then the instruction.
const LINES: &[&str] = &[
    " 0  13 05 15 00  addi\ta0, a0, 1",
    " 0  37 01 00 00  lui\tsp, 0",
    " 0  ef 00 40 00  jal\tra, 4",
    " 0  03 25 c1 ff  lw\ta0, -4(sp)",
    " 0  23 20 b5 00  sw\ta1, 0(a0)",
    " 0  63 04 b5 00  beq\ta0, a1, 8",
    " 0  73 00 00 00  ecall",
    " 0  93 07 f0 ff  addi\ta5, zero, -0x1",
];

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    for operands in ["a0, a0, 1", "ra, -0x800", "a0, -4(sp)", "t0, 0x10(a1), 0x7ff"] {
        group.bench_with_input(BenchmarkId::from_parameter(operands), operands, |b, ops| {
            b.iter(|| canonicalize(black_box(ops)))
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(LINES.len() as u64));
    group.bench_function("cstool_lines", |b| {
        b.iter(|| {
            for line in LINES {
                let _ = parse(black_box(line), "cstool");
            }
        })
    });
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let reference: Vec<ToolOutput> = LINES.iter().map(|l| ToolOutput::success(*l)).collect();
    let candidate: Vec<ToolOutput> = LINES
        .iter()
        .map(|l| ToolOutput::success(l.split_whitespace().skip(5).collect::<Vec<_>>().join(" ")))
        .collect();

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(LINES.len() as u64));
    for mode in [CompareMode::Canonical, CompareMode::Normalized] {
        let classifier = Classifier::new(mode);
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| {
                for (r, c) in reference.iter().zip(&candidate) {
                    let _ = classifier.classify(black_box(r), black_box(c), None);
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_canonicalize, bench_parse, bench_classify);
criterion_main!(benches);
