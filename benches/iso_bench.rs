// SPDX-License-Identifier: Apache-2.0

//! Benchmarks for the pattern-sharing scheduler on random multi-output
//! designs, with and without a capacity budget.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use xbarsynth::schedule_patterns;
use xbarsynth::iso::wl_hash::wl_hash;
use xbarsynth_test_helpers::{random_bdd, random_design};

fn iso_benchmark(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512];
    let mut group = c.benchmark_group("iso_schedule");
    for &outputs in sizes {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(outputs as u64);
        let design = random_design(&mut rng, outputs, 8);
        group.bench_with_input(BenchmarkId::new("unbounded", outputs), &design, |b, design| {
            b.iter(|| {
                let report = schedule_patterns("bench", black_box(design), None)
                    .expect("random designs are acyclic");
                black_box(report);
            });
        });
        group.bench_with_input(BenchmarkId::new("budget_64", outputs), &design, |b, design| {
            b.iter(|| {
                // Small designs may not need the budget; an infeasible one is
                // still a full run through fitting.
                let _ = black_box(schedule_patterns("bench", black_box(design), Some(64)));
            });
        });
    }
    group.finish();
}

fn wl_hash_benchmark(c: &mut Criterion) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let diagram = random_bdd(&mut rng, "f", 16, 8, true);
    c.bench_function("wl_hash_16x8", |b| {
        b.iter(|| black_box(wl_hash(black_box(&diagram))));
    });
}

criterion_group!(benches, iso_benchmark, wl_hash_benchmark);
criterion_main!(benches);
