//! Benchmarks for the merge algorithms.
//!
//! Reconciliation fans out across the whole generated file set, so per-file
//! merge cost dominates large runs. These benchmarks cover the three-way
//! diff3 path on typical source files and the structural JSON merge on a
//! dependency-manifest-shaped document.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::Path;

use regen::merge::diff3::Diff3Merge;
use regen::merge::json::JsonMerge;
use regen::merge::simple::SimpleMerge;
use regen::merge::{MergeAlgorithm, MergeInput};

/// A source-file-shaped text of `lines` numbered lines.
fn source_text(lines: usize, tag: &str) -> String {
    (0..lines)
        .map(|i| format!("line {} {}\n", i, if i % 25 == 0 { tag } else { "common" }))
        .collect()
}

fn manifest_json(deps: usize, version: &str) -> String {
    let entries: Vec<String> = (0..deps)
        .map(|i| format!(r#"    "package-{}": "{}""#, i, version))
        .collect();
    format!("{{\n  \"dependencies\": {{\n{}\n  }}\n}}\n", entries.join(",\n"))
}

fn bench_diff3(c: &mut Criterion) {
    let base = source_text(400, "base");
    let working = source_text(400, "working");
    let generated = source_text(400, "generated");

    c.bench_function("diff3_400_lines_disjoint_edits", |b| {
        b.iter(|| {
            Diff3Merge
                .merge(black_box(&MergeInput {
                    relative_path: Path::new("src/model.ts"),
                    working: &working,
                    generated: &generated,
                    base: Some(&base),
                }))
                .unwrap()
        })
    });
}

fn bench_json(c: &mut Criterion) {
    let base = manifest_json(120, "1.0.0");
    let generated = manifest_json(120, "1.1.0");
    let working = manifest_json(120, "1.0.0");

    c.bench_function("json_merge_120_dependencies", |b| {
        b.iter(|| {
            JsonMerge
                .merge(black_box(&MergeInput {
                    relative_path: Path::new("package.json"),
                    working: &working,
                    generated: &generated,
                    base: Some(&base),
                }))
                .unwrap()
        })
    });
}

fn bench_simple(c: &mut Criterion) {
    let working = source_text(400, "working");
    let generated = source_text(400, "generated");

    c.bench_function("simple_merge_400_lines", |b| {
        b.iter(|| {
            SimpleMerge
                .merge(black_box(&MergeInput {
                    relative_path: Path::new("notes.txt"),
                    working: &working,
                    generated: &generated,
                    base: None,
                }))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_diff3, bench_json, bench_simple);
criterion_main!(benches);
