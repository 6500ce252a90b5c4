//! Match discovery benchmarks.
//!
//! Measures `discover_matches` (C4) across input sizes and across the two
//! discovery phases' relative cost: a clean three-way-identical tree (no
//! matches to resolve beyond the trivial whole-file one), and a tree with a
//! relocated run plus scattered small edits (forces both the sure-fire and
//! small-fry phases to do real work).
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench match_discovery
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use kinetic_merge::discovery::discover_matches;
use kinetic_merge::{Config, Side, Sources};

fn config() -> Config {
    Config::new(4, 0.0, usize::MAX).expect("valid config")
}

/// `n` distinct tokens, identical across base/left/right.
fn identical_sources(n: usize) -> (Sources<u32>, Sources<u32>, Sources<u32>) {
    let content: Vec<u32> = (0..n as u32).collect();
    let base = Sources::new(Side::Base, [("a.rs", content.clone())]);
    let left = Sources::new(Side::Left, [("a.rs", content.clone())]);
    let right = Sources::new(Side::Right, [("a.rs", content)]);
    (base, left, right)
}

/// `n` tokens with the middle third relocated to a second file on the left
/// side, and every fourth token edited on the right side.
fn relocated_and_edited_sources(n: usize) -> (Sources<u32>, Sources<u32>, Sources<u32>) {
    let content: Vec<u32> = (0..n as u32).collect();
    let base = Sources::new(Side::Base, [("a.rs", content.clone())]);

    let third = n / 3;
    let moved: Vec<u32> = content[third..2 * third].to_vec();
    let remaining: Vec<u32> = content[..third].iter().chain(&content[2 * third..]).copied().collect();
    let left = Sources::new(Side::Left, [("a.rs", remaining), ("b.rs", moved)]);

    let edited: Vec<u32> = content
        .iter()
        .enumerate()
        .map(|(i, &v)| if i % 4 == 0 { v.wrapping_add(1_000_000) } else { v })
        .collect();
    let right = Sources::new(Side::Right, [("a.rs", edited)]);

    (base, left, right)
}

fn bench_identical_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover_matches/identical");
    let sizes: &[usize] = &[100, 1_000, 5_000];

    for &n in sizes {
        let (base, left, right) = identical_sources(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("elements", n), &n, |b, _| {
            b.iter(|| discover_matches(&base, &left, &right, &config()));
        });
    }

    group.finish();
}

fn bench_relocated_and_edited_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover_matches/relocated_and_edited");
    let sizes: &[usize] = &[100, 1_000, 5_000];

    for &n in sizes {
        let (base, left, right) = relocated_and_edited_sources(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("elements", n), &n, |b, _| {
            b.iter(|| discover_matches(&base, &left, &right, &config()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_identical_trees, bench_relocated_and_edited_trees);
criterion_main!(benches);
