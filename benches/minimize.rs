//! Minimisation benchmarks on random automata.
//!
//! 1. DFA minimisation of random complete DFAs of growing size
//! 2. Subset construction followed by DFA minimisation of random NFAs
//! 3. The full NFA minimisation pipeline, with and without Kameda–Weiner

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use fsa_algebra::prelude::*;
use fsa_algebra::random::{generate_random_dfa_sized, generate_random_nfa};

fn bench_minimize_dfa(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize/dfa");
    group.measurement_time(Duration::from_secs(5));

    fastrand::seed(42);
    for size in [10, 50, 200] {
        let dfa = generate_random_dfa_sized(3, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &dfa, |b, dfa| {
            b.iter(|| minimize_dfa(dfa))
        });
    }

    group.finish();
}

fn bench_determinize_minimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize/determinize");
    group.measurement_time(Duration::from_secs(5));

    fastrand::seed(42);
    for size in [4, 8, 12] {
        let nfa = generate_random_nfa(2, size, 0.25);
        group.bench_with_input(BenchmarkId::from_parameter(size), &nfa, |b, nfa| {
            b.iter(|| minimize_dfa(&determinize(nfa)))
        });
    }

    group.finish();
}

fn bench_minimize_nfa(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize/nfa");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(20);

    fastrand::seed(42);
    let configs = [
        ("with_kw", MinimizationConfig::default()),
        (
            "without_kw",
            MinimizationConfig::default().with_complexity_threshold(0),
        ),
    ];
    for size in [4, 6] {
        let nfa = generate_random_nfa(2, size, 0.3);
        for (name, config) in &configs {
            group.bench_with_input(BenchmarkId::new(*name, size), &nfa, |b, nfa| {
                b.iter(|| minimize_nfa(nfa, config))
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_minimize_dfa,
    bench_determinize_minimize,
    bench_minimize_nfa
);
criterion_main!(benches);
