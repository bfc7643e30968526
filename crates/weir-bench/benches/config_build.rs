//! Criterion micro-benchmarks for config parsing and building.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weir_bench::{relay_config, wide_config};
use weir_config::{build_config, lexer::lex, BuildOptions};
use weir_core::StaticTopology;

/// Benchmark: lex a 64-group config.
fn bench_lex_wide(c: &mut Criterion) {
    let text = wide_config(10, 64, 8);
    c.bench_function("lex_wide_64x8", |b| {
        b.iter(|| black_box(lex(black_box(&text)).len()));
    });
}

/// Benchmark: build a 64-group config for one rank of a 4x4 grid.
fn bench_build_wide(c: &mut Criterion) {
    let text = wide_config(10, 64, 8);
    let topo = StaticTopology::new(5, 16, [4, 4, 1, 1, 1]);
    c.bench_function("build_wide_64x8_rank5_of_16", |b| {
        b.iter(|| {
            let cfg = build_config(black_box(&text), &topo, BuildOptions::default()).unwrap();
            black_box(cfg.streams().len())
        });
    });
}

/// Benchmark: build the relay config with a 128^3 array on 8 ranks.
fn bench_build_relay(c: &mut Criterion) {
    let text = relay_config(100, 128);
    let topo = StaticTopology::new(3, 8, [2, 2, 2, 1, 1]);
    c.bench_function("build_relay_128cubed", |b| {
        b.iter(|| black_box(build_config(&text, &topo, BuildOptions::default()).unwrap()));
    });
}

criterion_group!(benches, bench_lex_wide, bench_build_wide, bench_build_relay);
criterion_main!(benches);
